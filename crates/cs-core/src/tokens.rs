//! Token estimation — character-class heuristic, no external tokenizer.
//!
//! Weights: CJK ideographs 0.8 each, Latin word runs 1.0 each,
//! punctuation 0.5 per char, whitespace 0.1 per run. A deterministic
//! approximation for budgeting, not a provider-exact count.

use serde::{Deserialize, Serialize};

const CJK_WEIGHT: f64 = 0.8;
const WORD_WEIGHT: f64 = 1.0;
const PUNCT_WEIGHT: f64 = 0.5;
const SPACE_WEIGHT: f64 = 0.1;

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Estimate the token count of a text.
///
/// Returns 0 only for empty input; any non-empty input counts at least 1.
/// Pure function, safe to call repeatedly.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }

    let mut cjk_chars = 0usize;
    let mut word_runs = 0usize;
    let mut punct_chars = 0usize;
    let mut space_runs = 0usize;

    let mut in_word = false;
    let mut in_space = false;
    for c in text.chars() {
        let word = c.is_ascii_alphabetic();
        if word && !in_word {
            word_runs += 1;
        }
        in_word = word;

        let space = c.is_whitespace();
        if space && !in_space {
            space_runs += 1;
        }
        in_space = space;

        if is_cjk(c) {
            cjk_chars += 1;
        } else if !space && !c.is_alphanumeric() && c != '_' {
            punct_chars += 1;
        }
    }

    let tokens = (cjk_chars as f64 * CJK_WEIGHT) as usize
        + (word_runs as f64 * WORD_WEIGHT) as usize
        + (punct_chars as f64 * PUNCT_WEIGHT) as usize
        + (space_runs as f64 * SPACE_WEIGHT) as usize;

    tokens.max(1)
}

/// Format a token count for display: "842T", "12.4K".
pub fn format_tokens(tokens: usize) -> String {
    if tokens < 1000 {
        format!("{tokens}T")
    } else {
        format!("{:.1}K", tokens as f64 / 1000.0)
    }
}

/// Token delta between an original text and its compressed form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompressionDelta {
    pub original_tokens: usize,
    pub compressed_tokens: usize,
    pub saved_tokens: usize,
    pub ratio_pct: f64,
}

impl CompressionDelta {
    pub fn between(original: &str, compressed: &str) -> Self {
        let original_tokens = estimate_tokens(original);
        let compressed_tokens = estimate_tokens(compressed);
        let ratio_pct = if original_tokens > 0 {
            (1.0 - compressed_tokens as f64 / original_tokens as f64) * 100.0
        } else {
            0.0
        };
        Self {
            original_tokens,
            compressed_tokens,
            saved_tokens: original_tokens.saturating_sub(compressed_tokens),
            ratio_pct,
        }
    }
}
