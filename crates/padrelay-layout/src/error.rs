use std::path::PathBuf;

/// Errors that can occur while loading a layout config.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// The config file could not be read.
    #[error("failed to read layout config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file exceeds the size limit.
    #[error("layout config too large ({size} bytes, max {max}): {path}")]
    TooLarge {
        path: PathBuf,
        size: u64,
        max: usize,
    },

    /// The config is not valid JSON or does not match the mapping types.
    #[error("layout config is not valid: {0}")]
    Json(#[from] serde_json::Error),

    /// The config failed schema validation.
    #[error("layout config failed schema validation: {0}")]
    Schema(String),

    /// `output_size` is zero or above the supported maximum.
    #[error("invalid output_size {size} (must be 1..={max})")]
    InvalidOutputSize { size: usize, max: usize },

    /// A `bits` entry names a bit outside 0..=7.
    #[error("byte {index}: bit position {pos} out of range 0..=7")]
    InvalidBitPosition { index: usize, pos: u8 },

    /// The caller's output buffer is shorter than the layout.
    #[error("output buffer too small ({len} bytes, need {needed})")]
    BufferTooSmall { needed: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, LayoutError>;
