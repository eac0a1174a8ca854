use std::io::Read;
use std::sync::Arc;
use std::time::{Duration, Instant};

use padrelay_frame::{FrameConfig, FrameError, FrameReader};
use padrelay_layout::{hex, ByteLayout};
use padrelay_transport::RelayStream;
use tracing::{debug, info, warn};

use crate::decoder::{JsonRecordDecoder, RecordDecoder};
use crate::error::{Result, SessionError};
use crate::sink::{Sink, SinkFactory};

/// Minimum spacing between per-record debug lines.
pub const DEBUG_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted, sink not yet acquired.
    Connected,
    /// Reading frames.
    Serving,
    /// The peer closed the stream.
    Disconnected,
    /// A fatal I/O error ended the stream.
    Faulted,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Disconnected | SessionState::Faulted)
    }
}

/// Per-session counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames that passed the checksum.
    pub frames: u64,
    pub empty_frames: u64,
    pub oversize_frames: u64,
    pub runt_frames: u64,
    pub corrupt_frames: u64,
    pub decode_errors: u64,
    pub packets_formatted: u64,
    pub packets_written: u64,
    /// Times the sink was dropped after a failed write.
    pub sink_losses: u64,
}

impl SessionStats {
    /// Frames dropped before decoding.
    pub fn skipped_frames(&self) -> u64 {
        self.empty_frames + self.oversize_frames + self.runt_frames + self.corrupt_frames
    }
}

/// Outcome of [`Session::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub state: SessionState,
    pub stats: SessionStats,
}

/// One producer connection.
///
/// Frames are handled strictly in order: read, verify, decode, format, write.
/// A missing or failed sink never ends the session; only the stream does.
pub struct Session<R> {
    reader: FrameReader<R>,
    peer: String,
    layout: Arc<ByteLayout>,
    decoder: Arc<dyn RecordDecoder>,
    sinks: Arc<dyn SinkFactory>,
    state: SessionState,
    stats: SessionStats,
}

impl<R: Read> Session<R> {
    /// Create a session over an existing frame reader.
    pub fn new(
        reader: FrameReader<R>,
        peer: impl Into<String>,
        layout: Arc<ByteLayout>,
        sinks: Arc<dyn SinkFactory>,
    ) -> Self {
        Self {
            reader,
            peer: peer.into(),
            layout,
            decoder: Arc::new(JsonRecordDecoder),
            sinks,
            state: SessionState::Connected,
            stats: SessionStats::default(),
        }
    }

    /// Replace the default JSON decoder.
    pub fn with_decoder(mut self, decoder: Arc<dyn RecordDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Serve until the peer disconnects or the stream fails.
    pub fn run(mut self) -> SessionReport {
        let mut sink = self.open_sink();
        self.state = SessionState::Serving;
        info!(
            peer = %self.peer,
            device = %self.sinks.describe(),
            log_only = sink.is_none(),
            "session serving"
        );

        let mut last_debug: Option<Instant> = None;
        while !self.state.is_terminal() {
            let Some(packet) = self.next_packet(&mut last_debug) else {
                continue;
            };

            let Some(active) = sink.as_mut() else {
                continue;
            };
            match active.write_packet(&packet) {
                Ok(()) => self.stats.packets_written += 1,
                Err(err) => {
                    let err = SessionError::SinkWrite(err);
                    warn!(
                        peer = %self.peer,
                        device = %self.sinks.describe(),
                        size = packet.len(),
                        error = %err,
                        "sink lost, continuing log-only"
                    );
                    self.stats.sink_losses += 1;
                    sink = None;
                }
            }
        }

        drop(sink);
        info!(
            peer = %self.peer,
            state = ?self.state,
            frames = self.stats.frames,
            skipped = self.stats.skipped_frames(),
            written = self.stats.packets_written,
            "session ended"
        );
        SessionReport {
            state: self.state,
            stats: self.stats,
        }
    }

    fn open_sink(&self) -> Option<Box<dyn Sink>> {
        match self.sinks.open() {
            Ok(sink) => Some(sink),
            Err(err) => {
                let err = SessionError::SinkUnavailable(err);
                warn!(
                    peer = %self.peer,
                    device = %self.sinks.describe(),
                    error = %err,
                    "serving log-only"
                );
                None
            }
        }
    }

    /// Read one frame and turn it into a packet. `None` means the frame was
    /// dropped or the stream ended.
    fn next_packet(&mut self, last_debug: &mut Option<Instant>) -> Option<Vec<u8>> {
        let payload = match self.reader.read_frame() {
            Ok(payload) => payload,
            Err(err) => {
                self.frame_failed(err);
                return None;
            }
        };
        self.stats.frames += 1;

        let record = match self.decoder.decode(&payload) {
            Ok(record) => record,
            Err(err) => {
                self.stats.decode_errors += 1;
                warn!(peer = %self.peer, size = payload.len(), error = %err, "dropping record");
                return None;
            }
        };

        let packet = self.layout.format(&record);
        self.stats.packets_formatted += 1;

        if last_debug.is_none_or(|at| at.elapsed() >= DEBUG_INTERVAL) {
            debug!(peer = %self.peer, %record, packet = %hex(&packet), "relaying");
            *last_debug = Some(Instant::now());
        }
        Some(packet)
    }

    fn frame_failed(&mut self, err: FrameError) {
        match &err {
            FrameError::EmptyFrame => {
                self.stats.empty_frames += 1;
                warn!(peer = %self.peer, "skipping empty frame");
            }
            FrameError::Oversize { size, max } => {
                self.stats.oversize_frames += 1;
                warn!(peer = %self.peer, size, max, "skipped oversize frame");
            }
            FrameError::Runt { len } => {
                self.stats.runt_frames += 1;
                warn!(peer = %self.peer, size = len, "skipping runt frame");
            }
            FrameError::Corrupt {
                expected,
                actual,
                len,
            } => {
                self.stats.corrupt_frames += 1;
                warn!(
                    peer = %self.peer,
                    size = len,
                    expected = %format!("{expected:#010x}"),
                    actual = %format!("{actual:#010x}"),
                    "checksum mismatch, dropping frame"
                );
            }
            FrameError::ConnectionClosed => {
                debug!(peer = %self.peer, "peer closed connection");
                self.state = SessionState::Disconnected;
            }
            FrameError::Io(_) | FrameError::PayloadTooLarge { .. } => {
                warn!(peer = %self.peer, error = %err, "connection failed");
                self.state = SessionState::Faulted;
            }
        }
    }
}

impl Session<RelayStream> {
    /// Create a session for an accepted TCP connection, applying the read
    /// timeout from `config`.
    pub fn tcp(
        stream: RelayStream,
        config: FrameConfig,
        layout: Arc<ByteLayout>,
        sinks: Arc<dyn SinkFactory>,
    ) -> Result<Self> {
        let peer = stream.peer_addr().to_string();
        let reader = FrameReader::with_config_tcp(stream, config)?;
        Ok(Self::new(reader, peer, layout, sinks))
    }
}
