//! Shared foundation for the cardstack engine: error type, tunable
//! configuration, transcript types, and the token estimator.

pub mod config;
pub mod error;
pub mod tokens;
pub mod types;

pub use config::EngineConfig;
pub use error::{CardError, Result};
pub use tokens::{estimate_tokens, format_tokens, CompressionDelta};
pub use types::{parse_transcript, Role, TranscriptEntry};
