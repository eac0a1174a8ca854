//! Length-prefixed, checksum-suffixed framing for state records.
//!
//! Every payload travels as:
//! - A 4-byte big-endian length covering payload and trailer
//! - The payload bytes
//! - A 4-byte big-endian CRC-32/IEEE of the payload
//!
//! The transport is assumed to be an ordered byte stream; the checksum only
//! catches corruption. Readers always hand back whole, verified payloads.

pub mod codec;
pub mod error;
pub mod integrity;
pub mod reader;
pub mod writer;

pub use codec::{
    encode, encode_frame, FrameConfig, CHECKSUM_SIZE, DEFAULT_MAX_PAYLOAD, LENGTH_PREFIX_SIZE,
};
pub use error::{FrameError, Result};
pub use integrity::{append, checksum, split_trailer, verify};
pub use reader::FrameReader;
pub use writer::FrameWriter;
