use chrono::Utc;
use cs_core::{estimate_tokens, Role};
use serde::{Deserialize, Serialize};

/// One transcript entry after analysis.
///
/// Token counts are fixed at construction and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedMessage {
    pub original_content: String,
    pub compressed_content: String,
    pub keywords: Vec<String>,
    pub role: Role,
    /// ISO-8601, defaults to creation time.
    pub timestamp: String,
    pub importance_score: f64,
    pub original_tokens: usize,
    pub compressed_tokens: usize,
}

impl CompressedMessage {
    pub fn new(
        original: impl Into<String>,
        compressed: impl Into<String>,
        keywords: Vec<String>,
        role: Role,
        importance_score: f64,
    ) -> Self {
        let original_content = original.into();
        let compressed_content = compressed.into();
        Self {
            original_tokens: estimate_tokens(&original_content),
            compressed_tokens: estimate_tokens(&compressed_content),
            original_content,
            compressed_content,
            keywords,
            role,
            timestamp: Utc::now().to_rfc3339(),
            importance_score,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn saved_tokens(&self) -> usize {
        self.original_tokens.saturating_sub(self.compressed_tokens)
    }
}
