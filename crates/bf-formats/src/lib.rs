//! Pattern exchange, generation and audio file formats for beatforge.
//!
//! - JSON pattern exchange with the generation service and storage
//! - Normalization of generator responses, padding, fallback and swing
//! - 16-bit PCM WAV encoding

mod exchange;
pub mod generator;
pub mod wav;

use thiserror::Error;

pub use exchange::{export_pattern, export_project, parse_pattern, parse_project};
pub use generator::{GeneratedPattern, GeneratorParams, Genre};
pub use wav::{encode_wav, frames_to_wav, parse_header, write_wav, WavHeader};

/// Error type for format parsing and encoding.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Input is not JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Top-level value is not an object
    #[error("expected a JSON object at the top level")]
    NotAnObject,
    /// Invalid file header or magic bytes
    #[error("invalid header")]
    InvalidHeader,
    /// Unexpected end of data
    #[error("unexpected end of data")]
    UnexpectedEof,
    /// Well-formed but unsupported content
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// Generator parameter out of range
    #[error("invalid generator parameter: {0}")]
    InvalidParams(String),
}
