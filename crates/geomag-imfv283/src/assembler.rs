use crate::model::{ChannelSeries, DecodedRecord, Envelope, SubHeader, SAMPLE_PERIOD_SECONDS};
use crate::time::ReconciledTime;

/// Combines the outputs of the decode stages into one record.
///
/// Channels keep the order and labels the sample decoder produced; the sub-header's
/// orientation is the one recorded, even when it disagrees with the station profile.
pub fn assemble_record(
    envelope: &Envelope<'_>,
    sub_header: &SubHeader,
    channels: Vec<ChannelSeries>,
    time: ReconciledTime,
) -> DecodedRecord {
    debug_assert!(
        channels.windows(2).all(|pair| pair[0].len() == pair[1].len()),
        "channel series must share one length"
    );

    DecodedRecord {
        station: envelope.station().to_string(),
        platform_id: envelope.platform_id.to_string(),
        epoch: time.data_time,
        transmit_time: time.transmit_time,
        time_corrected: time.corrected,
        orientation: sub_header.orientation,
        sample_period_seconds: SAMPLE_PERIOD_SECONDS,
        channels,
    }
}
