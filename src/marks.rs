use serde::Serialize;
use std::fmt;

/// Every subject carries the same maximum.
pub const SUBJECT_MAX: i64 = 100;
pub const SUBJECT_COUNT: usize = 5;
pub const TOTAL_MAX: i64 = SUBJECT_MAX * SUBJECT_COUNT as i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
}

impl Grade {
    pub const ALL: [Grade; 5] = [Grade::APlus, Grade::A, Grade::B, Grade::C, Grade::D];

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed threshold ladder shared by every grading display:
/// A+ >= 90, A >= 80, B >= 70, C >= 60, D below.
pub fn grade_for_percentage(percentage: f64) -> Grade {
    if percentage >= 90.0 {
        Grade::APlus
    } else if percentage >= 80.0 {
        Grade::A
    } else if percentage >= 70.0 {
        Grade::B
    } else if percentage >= 60.0 {
        Grade::C
    } else {
        Grade::D
    }
}

/// `"STU"` followed by the roll number left-padded with zeros to three
/// characters. Longer roll numbers are kept whole.
pub fn student_id_for_roll(roll_number: &str) -> String {
    format!("STU{:0>3}", roll_number)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMarks {
    pub english: i64,
    pub mathematics: i64,
    pub social_science: i64,
    pub science: i64,
    pub hindi: i64,
}

impl SubjectMarks {
    pub fn from_array(v: [i64; SUBJECT_COUNT]) -> Self {
        Self {
            english: v[0],
            mathematics: v[1],
            social_science: v[2],
            science: v[3],
            hindi: v[4],
        }
    }

    pub fn total(&self) -> i64 {
        self.english + self.mathematics + self.social_science + self.science + self.hindi
    }

    /// Scaled before dividing so whole percentages come out exact (425 -> 85.0).
    pub fn percentage(&self) -> f64 {
        (self.total() as f64) * 100.0 / (TOTAL_MAX as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRecord {
    pub student_name: String,
    pub roll_number: String,
    pub student_id: String,
    pub class: String,
    #[serde(flatten)]
    pub marks: SubjectMarks,
    pub total_marks: i64,
    pub percentage: f64,
    pub grade: Grade,
}

impl MarkRecord {
    pub fn new(student_name: &str, roll_number: &str, class: &str, marks: SubjectMarks) -> Self {
        let percentage = marks.percentage();
        Self {
            student_name: student_name.to_string(),
            roll_number: roll_number.to_string(),
            student_id: student_id_for_roll(roll_number),
            class: class.to_string(),
            marks,
            total_marks: marks.total(),
            percentage,
            grade: grade_for_percentage(percentage),
        }
    }
}
