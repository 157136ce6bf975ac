//! Extraction of a station's sub-block from the message payload.
//!
//! GOES DCP messages carry binary data as pseudo-binary ASCII: every three
//! characters hold one 16-bit word (4 + 6 + 6 bits). The packed "NESS" block is
//! unpacked into plain bytes before the sub-header and samples are read.

use tracing::trace;

use crate::errors::DecodeError;
use crate::model::{Envelope, SubBlock};

/// Number of packed triplets whose byte pair belongs to the sub-header.
const HEADER_TRIPLETS: usize = 12;

/// Borrows the packed sub-block `payload[start..start + block_length]`.
pub fn extract_block<'a>(envelope: &Envelope<'a>) -> Result<&'a [u8], DecodeError> {
    let profile = envelope.profile;
    let start = envelope.rate.flag_len().saturating_add(profile.block_offset);
    let end = start.saturating_add(profile.block_length);

    envelope
        .payload
        .get(start..end)
        .ok_or_else(|| DecodeError::TruncatedPayload {
            platform_id: envelope.platform_id.to_string(),
            offset: start,
            expected: end,
            actual: envelope.payload.len(),
        })
}

/// Unpacks the sub-block into its binary form, two bytes per triplet.
pub fn unpack_block<'a>(envelope: &Envelope<'a>) -> Result<SubBlock<'a>, DecodeError> {
    let packed = extract_block(envelope)?;
    let profile = envelope.profile;

    let mut bytes = Vec::with_capacity(packed.len() / 3 * 2);
    for (idx, triplet) in packed.chunks_exact(3).enumerate() {
        let (high, low) = unpack_triplet(triplet[0], triplet[1], triplet[2]);
        let swap = if idx < HEADER_TRIPLETS {
            profile.swap_header
        } else {
            profile.swap_data
        };
        if swap {
            bytes.extend_from_slice(&[high, low]);
        } else {
            bytes.extend_from_slice(&[low, high]);
        }
    }

    trace!(
        platform_id = envelope.platform_id,
        packed = packed.len(),
        unpacked = bytes.len(),
        "unpacked sub-block"
    );

    Ok(SubBlock {
        platform_id: envelope.platform_id,
        bytes,
    })
}

/// Splits three pseudo-binary characters into the (high, low) bytes of one word.
fn unpack_triplet(first: u8, second: u8, third: u8) -> (u8, u8) {
    let low = (third & 0x3F) | ((second & 0x03) << 6);
    let high = ((second >> 2) & 0x0F) | ((first & 0x0F) << 4);
    (high, low)
}
