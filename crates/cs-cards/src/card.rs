use crate::message::CompressedMessage;
use serde::{Deserialize, Serialize};

/// Topic label when a segment yields no keywords.
pub const FALLBACK_TOPIC: &str = "对话";

const KEYWORD_SEPARATOR: &str = "、";
const SUMMARY_SEPARATOR: &str = "|";

/// The four rendering tiers of a card, most compressed first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Renderings {
    pub minimal: String,
    pub compact: String,
    pub summary: String,
    pub full: String,
}

/// Aggregate token statistics for one card.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CardTokenStats {
    pub original_tokens: usize,
    pub compressed_tokens: usize,
    pub saved_tokens: usize,
}

/// A contiguous, topic-coherent run of transcript messages.
///
/// Immutable after construction except for `dynamic_weight`, which the
/// context engine loads from and flushes to the weight store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationCard {
    /// Stable `card_{index}` identifier in segment order.
    pub card_id: String,
    pub topic: String,
    pub keywords: Vec<String>,
    /// Always non-empty.
    pub messages: Vec<CompressedMessage>,
    pub start_time: String,
    pub end_time: String,
    /// 1-5, non-decreasing with card position.
    pub importance_level: u8,
    pub dynamic_weight: f64,
}

impl ConversationCard {
    fn keywords_label(&self) -> String {
        if self.keywords.is_empty() {
            self.topic.clone()
        } else {
            self.keywords.join(KEYWORD_SEPARATOR)
        }
    }

    /// `[topic] keywords` one-liner.
    pub fn minimal(&self) -> String {
        format!("[{}] {}", self.topic, self.keywords_label())
    }

    /// Minimal plus the message count.
    pub fn compact(&self) -> String {
        format!(
            "[{}] {} ({}条)",
            self.topic,
            self.keywords_label(),
            self.messages.len()
        )
    }

    /// Compressed content of the first `summary_messages` messages.
    pub fn summary(&self, summary_messages: usize) -> String {
        self.messages
            .iter()
            .take(summary_messages)
            .map(|m| m.compressed_content.as_str())
            .collect::<Vec<_>>()
            .join(SUMMARY_SEPARATOR)
    }

    /// Every message verbatim, prefixed with its role label.
    pub fn full(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("[{}] {}", m.role.label(), m.original_content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All four tiers at once. Regenerated on demand, not cached.
    pub fn renderings(&self, summary_messages: usize) -> Renderings {
        Renderings {
            minimal: self.minimal(),
            compact: self.compact(),
            summary: self.summary(summary_messages),
            full: self.full(),
        }
    }

    pub fn token_stats(&self) -> CardTokenStats {
        let original_tokens: usize = self.messages.iter().map(|m| m.original_tokens).sum();
        let compressed_tokens: usize = self.messages.iter().map(|m| m.compressed_tokens).sum();
        CardTokenStats {
            original_tokens,
            compressed_tokens,
            saved_tokens: original_tokens.saturating_sub(compressed_tokens),
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}
