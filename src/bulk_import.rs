use crate::marks::{Grade, MarkRecord, SubjectMarks, SUBJECT_COUNT, SUBJECT_MAX};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

pub const COL_STUDENT_NAME: &str = "StudentName";
pub const COL_ROLL_NUMBER: &str = "RollNumber";
pub const COL_CLASS: &str = "Class";

/// Subject columns in record order.
pub const SUBJECT_COLUMNS: [&str; SUBJECT_COUNT] =
    ["English", "Mathematics", "SocialScience", "Science", "Hindi"];

pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_STUDENT_NAME,
    COL_ROLL_NUMBER,
    COL_CLASS,
    "English",
    "Mathematics",
    "SocialScience",
    "Science",
    "Hindi",
];

pub const TEMPLATE_FILE_NAME: &str = "marks_template.csv";

const TEMPLATE_ROWS: [&str; 2] = [
    "Aarav Sharma,001,10th A,85,92,78,88,82",
    "Priya Patel,002,10th A,90,88,85,92,87",
];

/// File-level failures. Either one aborts the import with no records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("File is empty")]
    EmptyFile,

    #[error("Invalid CSV format: missing required columns: {}", .missing.join(", "))]
    InvalidFormat { missing: Vec<String> },
}

impl ImportError {
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::EmptyFile => "empty_file",
            ImportError::InvalidFormat { .. } => "invalid_format",
        }
    }
}

/// Row-level failures. The row is dropped and scanning continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Row {row}: Invalid number of columns")]
    ColumnCount { row: usize },

    #[error("Row {row}: Missing required field ({column})")]
    MissingField { row: usize, column: &'static str },

    #[error("Row {row}: Invalid marks (must be 0-100)")]
    MarkRange { row: usize },
}

impl RowError {
    pub fn row(&self) -> usize {
        match self {
            RowError::ColumnCount { row }
            | RowError::MissingField { row, .. }
            | RowError::MarkRange { row } => *row,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportOutcome {
    pub records: Vec<MarkRecord>,
    pub errors: Vec<RowError>,
    /// Non-empty lines after the header.
    pub rows_total: usize,
}

impl ImportOutcome {
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub rows_total: usize,
    pub records_count: usize,
    pub error_count: usize,
    pub average_percentage: Option<f64>,
    pub grade_counts: BTreeMap<String, usize>,
    pub can_accept: bool,
}

/// Positions of the required columns within the file's header.
struct ColumnMap {
    width: usize,
    student_name: usize,
    roll_number: usize,
    class: usize,
    subjects: [usize; SUBJECT_COUNT],
}

impl ColumnMap {
    fn from_header(line: &str) -> Result<Self, ImportError> {
        let names: Vec<&str> = line.split(',').map(str::trim).collect();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            // First occurrence wins for duplicated headers.
            index.entry(*name).or_insert(i);
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !index.contains_key(*c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ImportError::InvalidFormat { missing });
        }

        let mut subjects = [0usize; SUBJECT_COUNT];
        for (slot, col) in subjects.iter_mut().zip(SUBJECT_COLUMNS) {
            *slot = index[col];
        }
        Ok(Self {
            width: names.len(),
            student_name: index[COL_STUDENT_NAME],
            roll_number: index[COL_ROLL_NUMBER],
            class: index[COL_CLASS],
            subjects,
        })
    }
}

fn parse_mark(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|v| (0..=SUBJECT_MAX).contains(v))
}

fn parse_row(cols: &ColumnMap, row: usize, line: &str) -> Result<MarkRecord, RowError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != cols.width {
        return Err(RowError::ColumnCount { row });
    }

    let student_name = fields[cols.student_name];
    let roll_number = fields[cols.roll_number];
    let class = fields[cols.class];
    for (value, column) in [
        (student_name, COL_STUDENT_NAME),
        (roll_number, COL_ROLL_NUMBER),
        (class, COL_CLASS),
    ] {
        if value.is_empty() {
            return Err(RowError::MissingField { row, column });
        }
    }

    let mut marks = [0i64; SUBJECT_COUNT];
    for (slot, idx) in marks.iter_mut().zip(cols.subjects) {
        *slot = parse_mark(fields[idx]).ok_or(RowError::MarkRange { row })?;
    }

    Ok(MarkRecord::new(
        student_name,
        roll_number,
        class,
        SubjectMarks::from_array(marks),
    ))
}

/// Parses a bulk mark CSV.
///
/// File-level problems (no content, missing header columns) fail the whole
/// import. Row-level problems are collected in `errors` and the offending
/// rows are left out of `records`; scanning always continues to the end.
/// Rows are numbered among non-empty lines with the header as row 1.
/// A leading UTF-8 byte-order mark is ignored.
pub fn parse_bulk_marks(text: &str) -> Result<ImportOutcome, ImportError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let Some((header, data)) = lines.split_first() else {
        return Err(ImportError::EmptyFile);
    };

    let cols = ColumnMap::from_header(header)?;

    let mut out = ImportOutcome {
        rows_total: data.len(),
        ..ImportOutcome::default()
    };
    for (i, line) in data.iter().enumerate() {
        match parse_row(&cols, i + 2, line) {
            Ok(rec) => out.records.push(rec),
            Err(e) => out.errors.push(e),
        }
    }
    Ok(out)
}

pub fn summarize(outcome: &ImportOutcome) -> ImportSummary {
    let mut grade_counts: BTreeMap<String, usize> = Grade::ALL
        .iter()
        .map(|g| (g.as_str().to_string(), 0))
        .collect();
    let mut pct_sum = 0.0;
    for rec in &outcome.records {
        *grade_counts.entry(rec.grade.as_str().to_string()).or_insert(0) += 1;
        pct_sum += rec.percentage;
    }
    let average_percentage = if outcome.records.is_empty() {
        None
    } else {
        Some(pct_sum / outcome.records.len() as f64)
    };

    ImportSummary {
        rows_total: outcome.rows_total,
        records_count: outcome.records.len(),
        error_count: outcome.errors.len(),
        average_percentage,
        grade_counts,
        can_accept: outcome.errors.is_empty() && !outcome.records.is_empty(),
    }
}

/// Downloadable example with the required header and two sample rows.
pub fn template_csv() -> String {
    let mut csv = REQUIRED_COLUMNS.join(",");
    csv.push('\n');
    for row in TEMPLATE_ROWS {
        csv.push_str(row);
        csv.push('\n');
    }
    csv
}
