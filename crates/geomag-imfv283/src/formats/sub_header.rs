use crate::errors::DecodeError;
use crate::model::{Orientation, SubBlock, SubHeader, CHANNEL_COUNT};

/// Bytes of the unpacked sub-block that precede the first sample.
pub const SUB_HEADER_LEN: usize = 30;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Bits of byte 7 that double the scale of channels one to four.
const SCALE_BITS: [u8; CHANNEL_COUNT] = [0x20, 0x10, 0x08, 0x04];

pub fn decode_sub_header(block: &SubBlock<'_>) -> Result<SubHeader, DecodeError> {
    let bytes = block.bytes.as_slice();
    if bytes.len() < SUB_HEADER_LEN {
        return Err(DecodeError::MalformedSubHeader {
            platform_id: block.platform_id.to_string(),
            message: format!(
                "sub-block has {} bytes, sub-header needs {SUB_HEADER_LEN}",
                bytes.len()
            ),
        });
    }

    // day (12 bits) and minute (12 bits) share bytes 0..3
    let day_of_year = u16::from(bytes[0]) | (u16::from(bytes[1] & 0x0F) << 8);
    let minute_of_day = (u16::from(bytes[2]) << 4) | u16::from(bytes[1] >> 4);
    if minute_of_day >= MINUTES_PER_DAY {
        return Err(DecodeError::MalformedSubHeader {
            platform_id: block.platform_id.to_string(),
            message: format!("minute of day {minute_of_day} is outside 0..{MINUTES_PER_DAY}"),
        });
    }

    let mut offsets = [0u8; CHANNEL_COUNT];
    offsets.copy_from_slice(&bytes[3..3 + CHANNEL_COUNT]);

    let flags = bytes[7];
    let scales = SCALE_BITS.map(|bit| if flags & bit != 0 { 2 } else { 1 });

    Ok(SubHeader {
        day_of_year,
        minute_of_day,
        offsets,
        orientation: Orientation::from_code(flags >> 6),
        scales,
        alert_capable: flags & 0x01 != 0,
    })
}
