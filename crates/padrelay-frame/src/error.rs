/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A frame announced a zero length; nothing was consumed past the prefix.
    #[error("empty frame (zero length prefix)")]
    EmptyFrame,

    /// A frame announced more than the allowed size. Its body was drained.
    #[error("frame too large ({size} bytes, max {max})")]
    Oversize { size: usize, max: usize },

    /// A frame body too short to carry the checksum trailer. Its body was consumed.
    #[error("runt frame ({len} bytes, shorter than checksum trailer)")]
    Runt { len: usize },

    /// The checksum trailer did not match the payload.
    #[error("checksum mismatch (expected {expected:#010x}, computed {actual:#010x}, {len} payload bytes)")]
    Corrupt { expected: u32, actual: u32, len: usize },

    /// The payload exceeds the configured maximum size (encode side).
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// Whether the stream is still synchronized and reading may continue.
    ///
    /// Recoverable conditions drop one frame; everything else ends the stream.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FrameError::EmptyFrame
                | FrameError::Oversize { .. }
                | FrameError::Runt { .. }
                | FrameError::Corrupt { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
