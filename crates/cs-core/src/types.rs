use crate::error::{CardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message role. Closed set: the card pipeline matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn is_user(&self) -> bool {
        matches!(self, Role::User)
    }

    /// Display label used by the full card rendering.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "用户",
            Role::Assistant => "助手",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One element of the transcript handed in by the orchestration layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
}

impl TranscriptEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Deserialize one entry from a JSONL line. A missing `role` or
    /// `content`, or an unknown role string, is rejected here rather than
    /// coerced downstream.
    pub fn from_jsonl(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| CardError::MalformedEntry(e.to_string()))
    }
}

/// Parse a JSONL transcript. Blank lines are skipped; any malformed entry
/// fails the whole parse.
pub fn parse_transcript(content: &str) -> Result<Vec<TranscriptEntry>> {
    let mut entries = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        entries.push(TranscriptEntry::from_jsonl(line)?);
    }
    Ok(entries)
}
