//! Append-only JSON-lines log of every invocation.

use crate::models::ContentKind;
use crate::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const BINARY_MARKER: &str = "binary data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Local>,
    pub kind: ContentKind,
    pub prompt: String,
    /// Generated text, [`BINARY_MARKER`] for binary kinds, `None` on failure.
    pub response: Option<String>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl AuditEntry {
    pub fn success(kind: ContentKind, prompt: &str, text: Option<&str>) -> Self {
        let response = if kind.is_binary() {
            BINARY_MARKER.to_string()
        } else {
            text.unwrap_or_default().to_string()
        };
        Self {
            timestamp: Local::now(),
            kind,
            prompt: prompt.to_string(),
            response: Some(response),
            outcome: Outcome::Success,
            error: None,
        }
    }

    pub fn failure(kind: ContentKind, prompt: &str, error: &crate::Error) -> Self {
        Self {
            timestamp: Local::now(),
            kind,
            prompt: prompt.to_string(),
            response: None,
            outcome: Outcome::Failure,
            error: Some(error.to_string()),
        }
    }
}

pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line; the file is created on first use.
    pub fn append(&self, entry: &AuditEntry) -> Result<()> {
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Like [`AuditLog::append`], but a write failure is only logged.
    pub fn record(&self, entry: &AuditEntry) {
        if let Err(e) = self.append(entry) {
            tracing::warn!("Could not append to audit log {}: {}", self.path.display(), e);
        }
    }
}
