use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use padrelay_transport::RelayStream;
use tracing::trace;

use crate::codec::{FrameConfig, CHECKSUM_SIZE, LENGTH_PREFIX_SIZE};
use crate::error::{FrameError, Result};
use crate::integrity::{checksum, split_trailer};

/// Reads verified payloads from any `Read` stream.
///
/// Handles partial reads internally. Each call consumes exactly one frame from
/// the stream, including frames that are rejected, so the stream stays aligned
/// on frame boundaries after any recoverable error.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            config,
        }
    }

    /// Read the next verified payload (blocking).
    ///
    /// Recoverable errors (`EmptyFrame`, `Oversize`, `Runt`, `Corrupt`) leave the
    /// stream positioned at the next frame. `ConnectionClosed` is returned for
    /// EOF, whether it lands on a frame boundary or mid-frame.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        fill(&mut self.inner, &mut prefix)?;
        let len = u32::from_be_bytes(prefix) as usize;

        if len == 0 {
            return Err(FrameError::EmptyFrame);
        }

        let max = self.config.max_frame_len();
        if len > max {
            trace!(size = len, max, "draining oversize frame");
            drain(&mut self.inner, len)?;
            return Err(FrameError::Oversize { size: len, max });
        }

        self.buf.clear();
        self.buf.resize(len, 0);
        fill(&mut self.inner, &mut self.buf)?;

        let Some((payload, claimed)) = split_trailer(&self.buf) else {
            return Err(FrameError::Runt { len });
        };
        let actual = checksum(payload);
        if actual != claimed {
            return Err(FrameError::Corrupt {
                expected: claimed,
                actual,
                len: payload.len(),
            });
        }

        self.buf.truncate(len - CHECKSUM_SIZE);
        trace!(size = self.buf.len(), "frame verified");
        Ok(self.buf.split().freeze())
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

/// Read exactly `dst.len()` bytes. Any EOF is a closed connection.
fn fill(src: &mut impl Read, dst: &mut [u8]) -> Result<()> {
    src.read_exact(dst).map_err(|err| match err.kind() {
        ErrorKind::UnexpectedEof => FrameError::ConnectionClosed,
        _ => FrameError::Io(err),
    })
}

/// Consume and drop exactly `len` bytes.
fn drain(src: &mut impl Read, len: usize) -> Result<()> {
    let wanted = len as u64;
    let copied = std::io::copy(&mut src.take(wanted), &mut std::io::sink())?;
    if copied < wanted {
        return Err(FrameError::ConnectionClosed);
    }
    Ok(())
}

impl FrameReader<RelayStream> {
    /// Create a frame reader for a `RelayStream` and apply read timeout from config.
    pub fn with_config_tcp(inner: RelayStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(|err| FrameError::Io(err.into_io()))?;
        Ok(Self::with_config(inner, config))
    }
}
