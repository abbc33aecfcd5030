//! Diagnostics snapshots. A [`ContextReport`] is an explicit value the
//! caller builds on demand; the engine keeps no observability state of
//! its own.

use crate::engine::{ContextEngine, ContextTokens};
use cs_cards::CardTokenStats;
use cs_core::{estimate_tokens, Role};
use serde::Serialize;

const PREVIEW_CHARS: usize = 80;

/// Token cost of each rendering tier of one card.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TierTokens {
    pub minimal: usize,
    pub compact: usize,
    pub summary: usize,
    pub full: usize,
}

/// Per-card compression snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CardReport {
    pub card_id: String,
    pub topic: String,
    pub message_count: usize,
    pub importance_level: u8,
    pub dynamic_weight: f64,
    pub tier_tokens: TierTokens,
    pub token_stats: CardTokenStats,
}

/// One assembled context entry, clipped for display.
#[derive(Debug, Clone, Serialize)]
pub struct ContextEntryReport {
    pub index: usize,
    pub role: Role,
    pub tokens: usize,
    pub preview: String,
}

/// Full diagnostics for one prospective outbound message.
#[derive(Debug, Clone, Serialize)]
pub struct ContextReport {
    pub cards: Vec<CardReport>,
    pub entries: Vec<ContextEntryReport>,
    pub related_cards: Vec<usize>,
    pub tokens: ContextTokens,
}

impl ContextReport {
    /// Capture the engine's view of `current_message`.
    pub fn capture(engine: &ContextEngine, current_message: &str) -> Self {
        let summary_messages = engine.config().summary_messages;

        let cards = engine
            .cards()
            .iter()
            .map(|card| {
                let renderings = card.renderings(summary_messages);
                CardReport {
                    card_id: card.card_id.clone(),
                    topic: card.topic.clone(),
                    message_count: card.message_count(),
                    importance_level: card.importance_level,
                    dynamic_weight: card.dynamic_weight,
                    tier_tokens: TierTokens {
                        minimal: estimate_tokens(&renderings.minimal),
                        compact: estimate_tokens(&renderings.compact),
                        summary: estimate_tokens(&renderings.summary),
                        full: estimate_tokens(&renderings.full),
                    },
                    token_stats: card.token_stats(),
                }
            })
            .collect();

        let entries = engine
            .api_context(current_message)
            .into_iter()
            .enumerate()
            .map(|(index, entry)| ContextEntryReport {
                index,
                role: entry.role,
                tokens: estimate_tokens(&entry.content),
                preview: preview(&entry.content),
            })
            .collect();

        Self {
            cards,
            entries,
            related_cards: engine.find_related_cards(current_message),
            tokens: engine.context_tokens(current_message),
        }
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }
    let clipped: String = content.chars().take(PREVIEW_CHARS).collect();
    format!("{clipped}...")
}
