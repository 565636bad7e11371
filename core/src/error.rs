use std::path::PathBuf;

use thiserror::Error;

use crate::modulation::Modulation;

#[derive(Debug, Error)]
pub enum WaveformError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown modulation: {0}")]
    UnknownModulation(String),

    #[error("Unknown modulation scheme: {0}")]
    UnknownScheme(String),

    #[error("Unsupported order {order} for {modulation}")]
    UnsupportedOrder { modulation: Modulation, order: u32 },

    #[error("{0} has no I/Q constellation")]
    NoConstellation(Modulation),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Corrupt sample file {}: {reason}", .path.display())]
    CorruptSampleFile { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WaveformError>;
