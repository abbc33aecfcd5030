use serde::{Deserialize, Serialize};

/// Tunable parameters of the compression pipeline.
///
/// The defaults reproduce the observed production values; nothing else in
/// the workspace hard-codes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Jaccard similarity below which a new card may open.
    pub similarity_threshold: f64,
    /// A card must grow past this many messages before it may split.
    pub min_segment_len: usize,
    /// Weight added to each related card when a message goes out.
    pub weight_increment: f64,
    /// Keywords kept per message.
    pub max_keywords: usize,
    /// Keywords kept per card (also feeds the topic label).
    pub topic_keywords: usize,
    /// Messages at or below this many chars pass through uncompressed.
    pub compress_threshold: usize,
    /// Chars kept from the first and last sentence when clipping.
    pub snippet_len: usize,
    /// Messages included in a card's summary rendering.
    pub summary_messages: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.3,
            min_segment_len: 2,
            weight_increment: 0.5,
            max_keywords: 5,
            topic_keywords: 3,
            compress_threshold: 50,
            snippet_len: 30,
            summary_messages: 3,
        }
    }
}
