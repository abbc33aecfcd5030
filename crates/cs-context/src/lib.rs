//! Context assembly for the cardstack engine: card lifecycle, relevance
//! lookup, dynamic weights, token accounting, and diagnostics reports.

pub mod engine;
pub mod report;

pub use engine::{
    CardExport, CompressionStats, ContextEngine, ContextMessage, ContextTokens, RELATED_PREFIX,
};
pub use report::{CardReport, ContextEntryReport, ContextReport, TierTokens};

#[cfg(test)]
mod tests;
