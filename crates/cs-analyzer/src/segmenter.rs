//! Word segmentation seam — injected into the analyzer, never probed at
//! runtime.

use regex::Regex;
use std::sync::LazyLock;

static RE_WORD_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\u{4e00}-\u{9fff}]+|[a-zA-Z]+").unwrap());

/// Splits text into candidate word units for keyword ranking.
pub trait WordSegmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<String>;
}

/// Character-class fallback: runs of CJK ideographs and runs of Latin
/// letters, in text order.
pub struct CharClassSegmenter;

impl CharClassSegmenter {
    pub fn new() -> Self {
        Self
    }
}

impl WordSegmenter for CharClassSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        RE_WORD_RUNS
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

impl Default for CharClassSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Dictionary-backed segmenter: greedy longest-match against a supplied
/// phrase lexicon, with char-class runs for spans the lexicon misses.
pub struct LexiconSegmenter {
    // longest-first so the greedy scan prefers the longest phrase
    entries: Vec<String>,
    fallback: CharClassSegmenter,
}

impl LexiconSegmenter {
    pub fn new(lexicon: impl IntoIterator<Item = String>) -> Self {
        let mut entries: Vec<String> = lexicon.into_iter().filter(|w| !w.is_empty()).collect();
        entries.sort();
        entries.dedup();
        entries.sort_by(|a, b| b.len().cmp(&a.len()));
        Self {
            entries,
            fallback: CharClassSegmenter,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl WordSegmenter for LexiconSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        let mut words = Vec::new();
        let mut gap = String::new();
        let mut rest = text;
        while !rest.is_empty() {
            match self.entries.iter().find(|w| rest.starts_with(w.as_str())) {
                Some(hit) => {
                    if !gap.is_empty() {
                        words.extend(self.fallback.segment(&gap));
                        gap.clear();
                    }
                    words.push(hit.clone());
                    rest = &rest[hit.len()..];
                }
                None => {
                    let Some(c) = rest.chars().next() else { break };
                    gap.push(c);
                    rest = &rest[c.len_utf8()..];
                }
            }
        }
        if !gap.is_empty() {
            words.extend(self.fallback.segment(&gap));
        }
        words
    }
}
