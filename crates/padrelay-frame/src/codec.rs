use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::integrity::checksum;

/// Length prefix: 4 bytes, big-endian.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Checksum trailer: 4 bytes, big-endian CRC-32/IEEE.
pub const CHECKSUM_SIZE: usize = 4;

/// Default maximum payload size: 8 KiB. The trailer is not counted.
pub const DEFAULT_MAX_PAYLOAD: usize = 8192;

/// Encode a payload into the wire format, appending to `dst`.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────┬──────────────┐
/// │ Length (4B)  │ Payload          │ CRC-32 (4B)  │
/// │ big-endian   │ (Length-4 bytes) │ big-endian   │
/// └──────────────┴──────────────────┴──────────────┘
/// ```
///
/// The length covers payload and trailer, not itself.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let max = u32::MAX as usize - CHECKSUM_SIZE;
    if payload.len() > max {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max,
        });
    }
    dst.reserve(LENGTH_PREFIX_SIZE + payload.len() + CHECKSUM_SIZE);
    dst.put_u32((payload.len() + CHECKSUM_SIZE) as u32);
    dst.put_slice(payload);
    dst.put_u32(checksum(payload));
    Ok(())
}

/// Encode a payload into a standalone frame.
pub fn encode(payload: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    encode_frame(payload, &mut buf)?;
    Ok(buf.freeze())
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes, excluding the trailer. Default: 8 KiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl FrameConfig {
    /// Largest length prefix a reader will accept.
    pub fn max_frame_len(&self) -> usize {
        self.max_payload_size.saturating_add(CHECKSUM_SIZE)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
