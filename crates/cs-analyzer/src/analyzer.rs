//! Keyword extraction, heuristic compression, and importance scoring for
//! a single message.

use crate::segmenter::{CharClassSegmenter, WordSegmenter};
use cs_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Function words excluded from keyword ranking.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "的", "了", "和", "是", "在", "我", "你", "他", "这", "那", "有", "没", "不", "很",
        "就", "也", "都", "要", "会", "可以", "吗", "呢", "啊", "哦", "嗯", "好", "对",
        "是的", "不是",
    ]
    .into_iter()
    .collect()
});

/// Emphasis markers that bump a message's importance.
const EMPHASIS_MARKERS: [&str; 5] = ["重要", "关键", "必须", "一定", "重点"];

const SENTENCE_TERMINATORS: [char; 7] = ['。', '！', '？', '.', '!', '?', '\n'];

/// The analyzer's verdict on one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub keywords: Vec<String>,
    pub compressed_content: String,
    pub importance_score: f64,
}

/// Stateless per-message analyzer. Deterministic: the same text always
/// yields the same analysis.
pub struct MessageAnalyzer {
    segmenter: Box<dyn WordSegmenter>,
    config: EngineConfig,
}

impl MessageAnalyzer {
    pub fn new(segmenter: Box<dyn WordSegmenter>, config: EngineConfig) -> Self {
        Self { segmenter, config }
    }

    /// Char-class segmentation with the given config.
    pub fn with_config(config: EngineConfig) -> Self {
        Self::new(Box::new(CharClassSegmenter), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Raw word units, no stop-word filtering. Used for relevance lookups
    /// against card keywords.
    pub fn segment(&self, text: &str) -> Vec<String> {
        self.segmenter.segment(text)
    }

    /// Full analysis of one message.
    pub fn analyze(&self, content: &str) -> Analysis {
        let keywords = self.extract_keywords(content);
        let compressed_content = self.compress_text(content);
        let importance_score = self.importance_score(content, keywords.len());
        Analysis {
            keywords,
            compressed_content,
            importance_score,
        }
    }

    /// Up to `max_keywords` keywords, most frequent first, ties broken by
    /// first occurrence.
    pub fn extract_keywords(&self, text: &str) -> Vec<String> {
        let words = self.segmenter.segment(text);
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (position, word) in words.iter().enumerate() {
            if STOP_WORDS.contains(word.as_str()) || word.chars().count() < 2 {
                continue;
            }
            let entry = counts.entry(word.as_str()).or_insert((0, position));
            entry.0 += 1;
        }

        let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
        ranked
            .into_iter()
            .take(self.config.max_keywords)
            .map(|(word, _)| word.to_string())
            .collect()
    }

    /// Clip long text down to its first and last sentence fragments.
    /// Char counts are Unicode scalar counts, not bytes.
    pub fn compress_text(&self, text: &str) -> String {
        if text.chars().count() <= self.config.compress_threshold {
            return text.to_string();
        }

        let sentences: Vec<&str> = text
            .split(&SENTENCE_TERMINATORS[..])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if sentences.len() <= 1 {
            let clipped: String = text.chars().take(self.config.compress_threshold).collect();
            return format!("{clipped}...");
        }

        let first: String = sentences[0].chars().take(self.config.snippet_len).collect();
        let last: String = sentences[sentences.len() - 1]
            .chars()
            .take(self.config.snippet_len)
            .collect();
        format!("{first}...{last}")
    }

    /// Importance in [0, 1]: length and keyword richness up to 0.3 each,
    /// emphasis markers and questions 0.2 each.
    pub fn importance_score(&self, text: &str, keyword_count: usize) -> f64 {
        if text.is_empty() {
            return 0.0;
        }

        let mut score = (text.chars().count() as f64 / 200.0).min(0.3);
        score += (keyword_count as f64 / 5.0).min(0.3);

        if EMPHASIS_MARKERS.iter().any(|marker| text.contains(marker)) {
            score += 0.2;
        }
        if text.contains('？') || text.contains('?') {
            score += 0.2;
        }

        score.min(1.0)
    }
}

impl Default for MessageAnalyzer {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}
