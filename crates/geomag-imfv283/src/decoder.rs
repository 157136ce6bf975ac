use chrono::Duration;
use serde::Serialize;
use tracing::{debug, warn};

use crate::assembler::assemble_record;
use crate::errors::DecodeError;
use crate::formats::{decode_samples, decode_sub_header, parse_header, unpack_block};
use crate::model::DecodedRecord;
use crate::stations::{StationLookup, StationTable};
use crate::time::{TimeReconciler, DEFAULT_MAX_TRANSMIT_DELAY_MINUTES};

/// Twice the span of one 12-sample message.
pub const DEFAULT_MAX_DATA_AGE_MINUTES: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Largest plausible gap between first sample and transmission before the
    /// reported day of year is replaced by the transmission day.
    pub max_transmit_delay: Duration,
    /// Records whose first sample is older than this at transmission are rejected.
    pub max_data_age: Option<Duration>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_transmit_delay: Duration::minutes(DEFAULT_MAX_TRANSMIT_DELAY_MINUTES),
            max_data_age: Some(Duration::minutes(DEFAULT_MAX_DATA_AGE_MINUTES)),
        }
    }
}

/// A feed line that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedMessage {
    /// Zero-based line number within the feed.
    pub line_index: usize,
    #[serde(serialize_with = "serialize_error")]
    pub error: DecodeError,
}

fn serialize_error<S>(error: &DecodeError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(error)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedReport {
    pub records: Vec<DecodedRecord>,
    pub rejected: Vec<RejectedMessage>,
}

impl FeedReport {
    pub fn corrected_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.time_corrected)
            .count()
    }

    pub fn message_count(&self) -> usize {
        self.records.len() + self.rejected.len()
    }
}

/// Runs header parsing, sub-block extraction, sample decoding and time
/// reconciliation for IMFV283 messages.
///
/// Holds no per-message state; one decoder can be shared across threads.
#[derive(Clone, Copy)]
pub struct Imfv283Decoder<'a> {
    stations: &'a dyn StationLookup,
    config: DecoderConfig,
}

impl Imfv283Decoder<'static> {
    /// Decoder over the embedded station table with default limits.
    pub fn builtin() -> Self {
        Self::new(StationTable::builtin(), DecoderConfig::default())
    }
}

impl<'a> Imfv283Decoder<'a> {
    pub fn new(stations: &'a dyn StationLookup, config: DecoderConfig) -> Self {
        Self { stations, config }
    }

    /// Decodes one raw message block: 37-byte header followed by its payload.
    pub fn decode(&self, raw: &[u8]) -> Result<DecodedRecord, DecodeError> {
        let envelope = parse_header(raw, self.stations)?;
        let block = unpack_block(&envelope)?;
        let sub_header = decode_sub_header(&block)?;

        if sub_header.orientation != envelope.profile.orientation {
            warn!(
                platform_id = envelope.platform_id,
                station = envelope.station(),
                configured = %envelope.profile.orientation,
                reported = %sub_header.orientation,
                "sub-header orientation differs from station profile"
            );
        }

        let channels = decode_samples(&block, &sub_header, envelope.profile)?;

        let time = TimeReconciler::new(self.config.max_transmit_delay).reconcile(
            envelope.transmit_time,
            sub_header.day_of_year,
            sub_header.minute_of_day,
        );
        if time.corrected {
            warn!(
                platform_id = envelope.platform_id,
                station = envelope.station(),
                transmit_day = %envelope.transmit_time.format("%Y-%j"),
                reported_day = sub_header.day_of_year,
                corrected_day = %time.data_time.format("%Y-%j"),
                "reported day of year replaced by transmission day"
            );
        }

        if let Some(max_age) = self.config.max_data_age {
            if time.delay() > max_age {
                return Err(DecodeError::StaleData {
                    platform_id: envelope.platform_id.to_string(),
                    epoch: time.data_time,
                    transmit_time: time.transmit_time,
                });
            }
        }

        let record = assemble_record(&envelope, &sub_header, channels, time);
        debug!(
            platform_id = envelope.platform_id,
            station = %record.station,
            epoch = %record.epoch,
            samples = record.sample_count(),
            "decoded message"
        );
        Ok(record)
    }

    /// Decodes every line of a receiver dump independently.
    ///
    /// Trailing `\r` is stripped and blank lines are skipped; a line that fails to
    /// decode is reported in [`FeedReport::rejected`] and the remaining lines are
    /// still decoded.
    pub fn decode_feed(&self, feed: &[u8]) -> FeedReport {
        let mut report = FeedReport::default();

        for (line_index, line) in feed.split(|&b| b == b'\n').enumerate() {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match self.decode(line) {
                Ok(record) => report.records.push(record),
                Err(error) => {
                    warn!(
                        line = line_index,
                        platform_id = error.platform_id().unwrap_or("unknown"),
                        error = %error,
                        "rejected message"
                    );
                    report.rejected.push(RejectedMessage { line_index, error });
                }
            }
        }

        report
    }
}
