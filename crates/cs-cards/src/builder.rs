//! Transcript segmentation: a single forward pass over analyzed messages,
//! splitting on keyword-set drift.

use crate::card::{ConversationCard, FALLBACK_TOPIC};
use crate::message::CompressedMessage;
use cs_analyzer::MessageAnalyzer;
use cs_core::{EngineConfig, TranscriptEntry};
use std::collections::{HashMap, HashSet};

/// Builds the card sequence for a transcript. Pure function of its input:
/// the same transcript always yields the same cards.
pub struct CardBuilder {
    analyzer: MessageAnalyzer,
}

impl CardBuilder {
    pub fn new(analyzer: MessageAnalyzer) -> Self {
        Self { analyzer }
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::new(MessageAnalyzer::with_config(config))
    }

    pub fn analyzer(&self) -> &MessageAnalyzer {
        &self.analyzer
    }

    pub fn config(&self) -> &EngineConfig {
        self.analyzer.config()
    }

    /// Analyze, segment, and materialize cards. Empty input yields an
    /// empty sequence; a single message yields exactly one card.
    pub fn build_cards(&self, entries: &[TranscriptEntry]) -> Vec<ConversationCard> {
        let messages: Vec<CompressedMessage> = entries
            .iter()
            .map(|entry| self.analyze_entry(entry))
            .collect();

        let segments = self.segment(messages);
        let total = segments.len();
        segments
            .into_iter()
            .enumerate()
            .map(|(index, segment)| self.create_card(segment, index, total))
            .collect()
    }

    fn analyze_entry(&self, entry: &TranscriptEntry) -> CompressedMessage {
        let analysis = self.analyzer.analyze(&entry.content);
        CompressedMessage::new(
            &entry.content,
            analysis.compressed_content,
            analysis.keywords,
            entry.role,
            analysis.importance_score,
        )
    }

    /// One forward pass. A new segment opens when the message's keyword
    /// set drifts below the similarity threshold and the current segment
    /// is already past the minimum length.
    fn segment(&self, messages: Vec<CompressedMessage>) -> Vec<Vec<CompressedMessage>> {
        let config = self.analyzer.config();
        let mut segments: Vec<Vec<CompressedMessage>> = Vec::new();
        let mut running: HashSet<String> = HashSet::new();

        for message in messages {
            let message_keywords: HashSet<String> = message.keywords.iter().cloned().collect();
            match segments.last_mut() {
                None => {
                    running = message_keywords;
                    segments.push(vec![message]);
                }
                Some(current) => {
                    let similarity = jaccard(&running, &message_keywords);
                    if similarity < config.similarity_threshold
                        && current.len() > config.min_segment_len
                    {
                        running = message_keywords;
                        segments.push(vec![message]);
                    } else {
                        current.push(message);
                        running.extend(message_keywords);
                    }
                }
            }
        }

        segments
    }

    fn create_card(
        &self,
        messages: Vec<CompressedMessage>,
        index: usize,
        total: usize,
    ) -> ConversationCard {
        let importance_level = (((index + 1) * 5) / total).clamp(1, 5) as u8;

        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        let mut position = 0usize;
        for message in &messages {
            for keyword in &message.keywords {
                let entry = counts.entry(keyword.as_str()).or_insert((0, position));
                entry.0 += 1;
                position += 1;
            }
        }
        let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
        let keywords: Vec<String> = ranked
            .into_iter()
            .take(self.analyzer.config().topic_keywords)
            .map(|(keyword, _)| keyword.to_string())
            .collect();

        let topic = if keywords.is_empty() {
            FALLBACK_TOPIC.to_string()
        } else {
            keywords.join("、")
        };

        ConversationCard {
            card_id: format!("card_{index}"),
            topic,
            keywords,
            start_time: messages[0].timestamp.clone(),
            end_time: messages[messages.len() - 1].timestamp.clone(),
            importance_level,
            dynamic_weight: 0.0,
            messages,
        }
    }
}

impl Default for CardBuilder {
    fn default() -> Self {
        Self::new(MessageAnalyzer::default())
    }
}

/// Jaccard similarity of the running keyword set against a candidate.
/// An empty candidate set counts as no similarity.
fn jaccard(running: &HashSet<String>, candidate: &HashSet<String>) -> f64 {
    if candidate.is_empty() {
        return 0.0;
    }
    let union = running.union(candidate).count();
    let intersection = running.intersection(candidate).count();
    intersection as f64 / union as f64
}
