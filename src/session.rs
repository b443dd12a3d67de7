use crate::bulk_import::{self, ImportError, ImportOutcome};
use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

/// One previewed import, held until the caller accepts or discards it.
#[derive(Debug, Clone)]
pub struct ImportSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub content_sha256: String,
    pub outcome: ImportOutcome,
}

impl ImportSession {
    pub fn open(text: &str) -> Result<Self, ImportError> {
        let outcome = bulk_import::parse_bulk_marks(text)?;
        let session = Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            content_sha256: sha256_hex(text),
            outcome,
        };
        info!(
            session = %session.id,
            rows = session.outcome.rows_total,
            records = session.outcome.records.len(),
            errors = session.outcome.errors.len(),
            "import session opened"
        );
        Ok(session)
    }

    pub fn created_at_rfc3339(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn is_blocked(&self) -> bool {
        !self.outcome.errors.is_empty()
    }
}

pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Insertion-ordered session table with a fixed capacity.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Vec<ImportSession>,
    capacity: usize,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn insert(&mut self, session: ImportSession) {
        while self.sessions.len() >= self.capacity {
            let evicted = self.sessions.remove(0);
            debug!(session = %evicted.id, "evicting oldest import session");
        }
        self.sessions.push(session);
    }

    pub fn get(&self, id: &str) -> Option<&ImportSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<ImportSession> {
        let pos = self.sessions.iter().position(|s| s.id == id)?;
        Some(self.sessions.remove(pos))
    }
}
