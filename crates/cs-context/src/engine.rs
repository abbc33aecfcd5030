//! The context engine: rebuilds cards from a transcript, tracks which
//! cards the outbound message touches, and assembles the context sequence
//! for the next API call.

use cs_analyzer::{MessageAnalyzer, WordSegmenter};
use cs_cards::{CardBuilder, CompressedMessage, ConversationCard, Renderings};
use cs_core::{estimate_tokens, EngineConfig, Result, Role, TranscriptEntry};
use cs_weights::WeightStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Marker prefixed to summarized background entries.
pub const RELATED_PREFIX: &str = "[相关背景]";

/// One entry of the assembled outbound context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: Role,
    pub content: String,
}

/// Three-way token accounting for an assembled context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContextTokens {
    pub context_tokens: usize,
    pub current_message_tokens: usize,
    pub total_tokens: usize,
}

/// Transcript-wide compression statistics for UI display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionStats {
    pub original_tokens: usize,
    pub compressed_tokens: usize,
    pub saved_tokens: usize,
    /// Formatted percentage, e.g. "42.5%".
    pub compression_ratio: String,
}

/// Serializable card dump for debugging or caller-side persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardExport {
    pub card_id: String,
    pub topic: String,
    pub keywords: Vec<String>,
    pub messages: Vec<CompressedMessage>,
    pub start_time: String,
    pub end_time: String,
    pub importance_level: u8,
    pub dynamic_weight: f64,
    pub renderings: Renderings,
}

/// Layered compression engine.
///
/// Holds no transcript state between calls beyond the card sequence built
/// by the most recent [`process_messages`](ContextEngine::process_messages).
/// Synchronous and single-threaded; the only blocking resource is the
/// weight store's backing file.
pub struct ContextEngine {
    builder: CardBuilder,
    weights: WeightStore,
    cards: Vec<ConversationCard>,
    keyword_to_cards: HashMap<String, Vec<usize>>,
}

impl ContextEngine {
    pub fn new(builder: CardBuilder, weights: WeightStore) -> Self {
        Self {
            builder,
            weights,
            cards: Vec::new(),
            keyword_to_cards: HashMap::new(),
        }
    }

    /// Default builder with a weight store at `weight_path`.
    pub fn with_weight_file(weight_path: impl Into<std::path::PathBuf>) -> Self {
        Self::new(CardBuilder::default(), WeightStore::open(weight_path))
    }

    /// Engine with an injected word segmenter.
    pub fn with_segmenter(
        segmenter: Box<dyn WordSegmenter>,
        config: EngineConfig,
        weights: WeightStore,
    ) -> Self {
        Self::new(
            CardBuilder::new(MessageAnalyzer::new(segmenter, config)),
            weights,
        )
    }

    pub fn config(&self) -> &EngineConfig {
        self.builder.config()
    }

    pub fn cards(&self) -> &[ConversationCard] {
        &self.cards
    }

    pub fn weights(&self) -> &WeightStore {
        &self.weights
    }

    /// Rebuild the card sequence from a fresh transcript, reindex card
    /// keywords, and load each card's persisted weight.
    pub fn process_messages(&mut self, entries: &[TranscriptEntry]) -> &[ConversationCard] {
        self.cards = self.builder.build_cards(entries);
        self.rebuild_keyword_index();
        for card in &mut self.cards {
            card.dynamic_weight = self.weights.weight(&card.card_id);
        }
        debug!(
            messages = entries.len(),
            cards = self.cards.len(),
            "transcript processed"
        );
        &self.cards
    }

    fn rebuild_keyword_index(&mut self) {
        self.keyword_to_cards.clear();
        for (index, card) in self.cards.iter().enumerate() {
            for keyword in &card.keywords {
                self.keyword_to_cards
                    .entry(keyword.clone())
                    .or_default()
                    .push(index);
            }
        }
    }

    /// Indices of cards whose top keywords occur in `text`, ascending.
    /// Uses the analyzer's raw word splitting; every match counts, stop
    /// words included.
    pub fn find_related_cards(&self, text: &str) -> Vec<usize> {
        let mut related: BTreeSet<usize> = BTreeSet::new();
        for word in self.builder.analyzer().segment(text) {
            if let Some(indices) = self.keyword_to_cards.get(&word) {
                related.extend(indices.iter().copied());
            }
        }
        related.into_iter().collect()
    }

    /// Warm the cards the outbound message refers to: add the configured
    /// increment to each related card, in memory and in the store.
    /// Returns the related indices. If persisting fails the in-memory
    /// weights stay applied; the next successful save catches up.
    pub fn update_card_weight(&mut self, current_message: &str) -> Result<Vec<usize>> {
        let related = self.find_related_cards(current_message);
        let increment = self.config().weight_increment;
        for &index in &related {
            self.cards[index].dynamic_weight += increment;
            self.weights.update(&self.cards[index].card_id, increment)?;
        }
        Ok(related)
    }

    /// Assemble the ordered context for the next outbound call.
    ///
    /// The last card is the current topic and is always expanded
    /// message-by-message with its original roles. Every other card
    /// contributes a single entry: the summary rendering behind the
    /// related-background marker when the card is related to
    /// `current_message` or carries positive weight, the minimal
    /// rendering otherwise.
    pub fn api_context(&self, current_message: &str) -> Vec<ContextMessage> {
        let related = if current_message.is_empty() {
            Vec::new()
        } else {
            self.find_related_cards(current_message)
        };
        let summary_messages = self.config().summary_messages;
        let last = self.cards.len().saturating_sub(1);

        let mut context = Vec::new();
        for (index, card) in self.cards.iter().enumerate() {
            if index == last {
                for message in &card.messages {
                    context.push(ContextMessage {
                        role: message.role,
                        content: message.original_content.clone(),
                    });
                }
            } else if related.binary_search(&index).is_ok() || card.dynamic_weight > 0.0 {
                context.push(ContextMessage {
                    role: Role::User,
                    content: format!("{RELATED_PREFIX} {}", card.summary(summary_messages)),
                });
            } else {
                context.push(ContextMessage {
                    role: Role::User,
                    content: card.minimal(),
                });
            }
        }
        context
    }

    /// Token cost of the assembled context plus the outbound message.
    /// Reporting only; no truncation is performed here.
    pub fn context_tokens(&self, current_message: &str) -> ContextTokens {
        let context_tokens = self
            .api_context(current_message)
            .iter()
            .map(|entry| estimate_tokens(&entry.content))
            .sum();
        let current_message_tokens = estimate_tokens(current_message);
        ContextTokens {
            context_tokens,
            current_message_tokens,
            total_tokens: context_tokens + current_message_tokens,
        }
    }

    /// Transcript-wide savings across all cards.
    pub fn compression_stats(&self) -> CompressionStats {
        let mut original_tokens = 0usize;
        let mut compressed_tokens = 0usize;
        for card in &self.cards {
            let stats = card.token_stats();
            original_tokens += stats.original_tokens;
            compressed_tokens += stats.compressed_tokens;
        }
        let saved_tokens = original_tokens.saturating_sub(compressed_tokens);
        let ratio = if original_tokens > 0 {
            saved_tokens as f64 / original_tokens as f64 * 100.0
        } else {
            0.0
        };
        CompressionStats {
            original_tokens,
            compressed_tokens,
            saved_tokens,
            compression_ratio: format!("{ratio:.1}%"),
        }
    }

    /// One `【topic】summary` line per card.
    pub fn cards_summary(&self) -> String {
        let summary_messages = self.config().summary_messages;
        self.cards
            .iter()
            .map(|card| format!("【{}】{}", card.topic, card.summary(summary_messages)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Diagnostics snapshot for `current_message`.
    pub fn report(&self, current_message: &str) -> crate::report::ContextReport {
        crate::report::ContextReport::capture(self, current_message)
    }

    /// Serializable dump of every card with all four renderings.
    pub fn export_cards(&self) -> Vec<CardExport> {
        let summary_messages = self.config().summary_messages;
        self.cards
            .iter()
            .map(|card| CardExport {
                card_id: card.card_id.clone(),
                topic: card.topic.clone(),
                keywords: card.keywords.clone(),
                messages: card.messages.clone(),
                start_time: card.start_time.clone(),
                end_time: card.end_time.clone(),
                importance_level: card.importance_level,
                dynamic_weight: card.dynamic_weight,
                renderings: card.renderings(summary_messages),
            })
            .collect()
    }
}
