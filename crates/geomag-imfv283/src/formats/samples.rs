use crate::errors::DecodeError;
use crate::model::{ChannelSeries, SubBlock, SubHeader, CHANNEL_COUNT};
use crate::stations::StationProfile;

use super::sub_header::SUB_HEADER_LEN;

const BYTES_PER_SAMPLE: usize = 2;

/// Decodes the rows of big-endian channel words that follow the sub-header.
///
/// Rows hold one 16-bit word per channel. Each word is scaled and biased by the
/// channel's sub-header values, then converted with the profile's constants; the
/// profile's dead value decodes to `None`.
pub fn decode_samples(
    block: &SubBlock<'_>,
    header: &SubHeader,
    profile: &StationProfile,
) -> Result<Vec<ChannelSeries>, DecodeError> {
    let rows = profile.samples_per_channel;
    let row_len = CHANNEL_COUNT * BYTES_PER_SAMPLE;
    let expected = rows * row_len;

    let data = block.bytes.get(SUB_HEADER_LEN..).unwrap_or_default();
    if data.len() < expected {
        return Err(DecodeError::TruncatedSamples {
            platform_id: block.platform_id.to_string(),
            expected,
            actual: data.len(),
        });
    }

    let mut values: [Vec<Option<f64>>; CHANNEL_COUNT] =
        std::array::from_fn(|_| Vec::with_capacity(rows));

    for row in data[..expected].chunks_exact(row_len) {
        for (channel, word) in row.chunks_exact(BYTES_PER_SAMPLE).enumerate() {
            let raw = u16::from_be_bytes([word[0], word[1]]);
            let value = if raw == profile.dead_value {
                None
            } else {
                Some(profile.conversion.apply(
                    raw,
                    header.scales[channel],
                    header.offsets[channel],
                ))
            };
            values[channel].push(value);
        }
    }

    Ok(header
        .orientation
        .channels()
        .into_iter()
        .zip(values)
        .map(|(label, values)| ChannelSeries {
            label: label.to_string(),
            values,
        })
        .collect())
}
