//! Per-message analysis for the cardstack engine: pluggable word
//! segmentation, keyword extraction, heuristic text compression, and
//! importance scoring.

pub mod analyzer;
pub mod segmenter;

pub use analyzer::{Analysis, MessageAnalyzer};
pub use segmenter::{CharClassSegmenter, LexiconSegmenter, WordSegmenter};
