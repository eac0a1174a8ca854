//! CRC-32/IEEE payload integrity.
//!
//! The trailer is the big-endian checksum of the exact payload bytes. It
//! detects corruption only; there is no correction and no authentication.

use crate::codec::CHECKSUM_SIZE;

/// Compute the CRC-32/IEEE checksum of a payload.
pub fn checksum(payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

/// Return `payload` followed by its big-endian checksum.
pub fn append(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + CHECKSUM_SIZE);
    out.extend_from_slice(payload);
    out.extend_from_slice(&checksum(payload).to_be_bytes());
    out
}

/// Split `data` into payload and the claimed checksum from its trailer.
///
/// Returns `None` when `data` is too short to hold a trailer.
pub fn split_trailer(data: &[u8]) -> Option<(&[u8], u32)> {
    let payload_len = data.len().checked_sub(CHECKSUM_SIZE)?;
    let (payload, trailer) = data.split_at(payload_len);
    let claimed = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    Some((payload, claimed))
}

/// Verify a payload-plus-trailer buffer.
///
/// Returns the payload and whether the trailer matched. Input shorter than
/// the trailer yields an empty payload and `false`.
pub fn verify(data: &[u8]) -> (&[u8], bool) {
    match split_trailer(data) {
        Some((payload, claimed)) => (payload, checksum(payload) == claimed),
        None => (&[], false),
    }
}
