use crate::bulk_import::{self, ImportError, RowError, REQUIRED_COLUMNS, TEMPLATE_FILE_NAME};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::marks::grade_for_percentage;
use crate::session::ImportSession;
use anyhow::Context;
use serde_json::json;
use std::path::Path;
use tracing::{info, warn};

struct HandlerErr {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl HandlerErr {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<ImportError> for HandlerErr {
    fn from(e: ImportError) -> Self {
        let details = match &e {
            ImportError::EmptyFile => None,
            ImportError::InvalidFormat { missing } => Some(json!({
                "missingColumns": missing,
                "requiredColumns": REQUIRED_COLUMNS,
            })),
        };
        HandlerErr {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

fn param_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

fn session_id_param(req: &Request) -> Result<&str, HandlerErr> {
    param_str(req, "sessionId")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HandlerErr::new("bad_params", "missing sessionId"))
}

fn write_text(path: &Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    std::fs::write(path, text)
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))
}

/// Import text comes inline as `text` or from disk via `inPath`.
fn read_import_text(req: &Request) -> Result<String, HandlerErr> {
    if let Some(text) = param_str(req, "text") {
        return Ok(text.to_string());
    }
    let in_path = param_str(req, "inPath")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HandlerErr::new("bad_params", "missing text or inPath"))?;
    let bytes = std::fs::read(in_path)
        .with_context(|| format!("failed to read {in_path}"))
        .map_err(|e| {
            HandlerErr::new("io_failed", format!("{e:#}")).with_details(json!({ "path": in_path }))
        })?;
    String::from_utf8(bytes).map_err(|e| {
        HandlerErr::new("bad_encoding", "file is not valid UTF-8").with_details(json!({
            "path": in_path,
            "validUpTo": e.utf8_error().valid_up_to(),
        }))
    })
}

fn handle_template(req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let csv = bulk_import::template_csv();
    let mut result = json!({
        "fileName": TEMPLATE_FILE_NAME,
        "columns": REQUIRED_COLUMNS,
        "csv": csv,
    });
    if let Some(out_path) = param_str(req, "outPath").map(str::trim).filter(|v| !v.is_empty()) {
        write_text(Path::new(out_path), &csv).map_err(|e| {
            HandlerErr::new("io_failed", format!("{e:#}")).with_details(json!({ "path": out_path }))
        })?;
        info!(path = out_path, "wrote marks template");
        result["path"] = json!(out_path);
    }
    Ok(result)
}

fn handle_preview(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let text = read_import_text(req)?;
    let session = ImportSession::open(&text).map_err(|e| {
        warn!(error = %e, "import rejected");
        HandlerErr::from(e)
    })?;

    let summary = bulk_import::summarize(&session.outcome);
    let records: Vec<_> = session
        .outcome
        .records
        .iter()
        .take(state.config.preview_limit)
        .collect();
    let result = json!({
        "sessionId": session.id,
        "createdAt": session.created_at_rfc3339(),
        "contentSha256": session.content_sha256,
        "summary": summary,
        "records": records,
        "recordsTruncated": session.outcome.records.len() > records.len(),
        "errors": session.outcome.error_messages(),
        "errorRows": session.outcome.errors.iter().map(RowError::row).collect::<Vec<_>>(),
    });
    state.sessions.insert(session);
    Ok(result)
}

fn handle_accept(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let session_id = session_id_param(req)?;
    let Some(session) = state.sessions.get(session_id) else {
        return Err(HandlerErr::new("session_not_found", "unknown import session")
            .with_details(json!({ "sessionId": session_id })));
    };
    // Any row error blocks the whole import, even though valid rows were parsed.
    if session.is_blocked() {
        return Err(HandlerErr::new(
            "import_blocked",
            "resolve row errors before importing",
        )
        .with_details(json!({
            "sessionId": session_id,
            "errors": session.outcome.error_messages(),
        })));
    }
    if session.outcome.records.is_empty() {
        return Err(HandlerErr::new("nothing_to_import", "import contains no records"));
    }

    let Some(session) = state.sessions.remove(session_id) else {
        return Err(HandlerErr::new("session_not_found", "unknown import session"));
    };
    info!(
        session = %session.id,
        records = session.outcome.records.len(),
        "import accepted"
    );
    Ok(json!({
        "sessionId": session.id,
        "recordsCount": session.outcome.records.len(),
        "records": session.outcome.records,
    }))
}

fn handle_discard(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let session_id = session_id_param(req)?;
    let discarded = state.sessions.remove(session_id).is_some();
    if !discarded {
        return Err(HandlerErr::new("session_not_found", "unknown import session")
            .with_details(json!({ "sessionId": session_id })));
    }
    Ok(json!({ "discarded": true }))
}

fn handle_grade(req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let percentage = req
        .params
        .get("percentage")
        .and_then(|v| v.as_f64())
        .filter(|v| v.is_finite())
        .ok_or_else(|| HandlerErr::new("bad_params", "percentage must be a number"))?;
    Ok(json!({
        "percentage": percentage,
        "grade": grade_for_percentage(percentage),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "marks.template" => handle_template(req),
        "marks.previewCsv" => handle_preview(state, req),
        "marks.acceptImport" => handle_accept(state, req),
        "marks.discardImport" => handle_discard(state, req),
        "marks.grade" => handle_grade(req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
