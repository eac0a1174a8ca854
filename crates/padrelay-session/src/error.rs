/// Errors that can occur while relaying records.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] padrelay_frame::FrameError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] padrelay_transport::TransportError),

    /// The payload is not a valid state record.
    #[error("record decode failed: {0}")]
    RecordDecode(String),

    /// The sink could not be opened.
    #[error("sink unavailable: {0}")]
    SinkUnavailable(#[source] std::io::Error),

    /// A packet write to the sink failed.
    #[error("sink write failed: {0}")]
    SinkWrite(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
