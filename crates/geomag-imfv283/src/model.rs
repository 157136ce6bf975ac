use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::stations::StationProfile;

/// Every IMFV283 sub-block carries exactly four channels.
pub const CHANNEL_COUNT: usize = 4;

/// One sample per minute.
pub const SAMPLE_PERIOD_SECONDS: i64 = 60;

/// Instrument layout encoded in the top two bits of sub-header byte 7.
///
/// The layout decides how the four packed channels are labelled. The USGS variometers
/// report the second channel of the `HEZF` layout as `E` rather than `D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    #[serde(rename = "XYZF")]
    Xyzf,
    #[serde(rename = "HEZF")]
    Hezf,
    #[serde(rename = "1DIF")]
    OneDif,
    #[serde(rename = "1234")]
    Unoriented,
}

impl Orientation {
    pub fn from_code(code: u8) -> Self {
        match code & 0x03 {
            0 => Orientation::Xyzf,
            1 => Orientation::Hezf,
            2 => Orientation::OneDif,
            _ => Orientation::Unoriented,
        }
    }

    pub fn channels(&self) -> [&'static str; CHANNEL_COUNT] {
        match self {
            Orientation::Xyzf => ["X", "Y", "Z", "F"],
            Orientation::Hezf => ["H", "E", "Z", "F"],
            Orientation::OneDif => ["1", "D", "I", "F"],
            Orientation::Unoriented => ["1", "2", "3", "4"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Xyzf => "XYZF",
            Orientation::Hezf => "HEZF",
            Orientation::OneDif => "1DIF",
            Orientation::Unoriented => "1234",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver-side status fields between the transmission time and the data length.
///
/// Kept as received: the relay uses codes such as `+A` for the frequency offset, and
/// none of these fields is needed to decode the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DcpStatus {
    pub failure_code: char,
    pub signal_strength: String,
    pub frequency_offset: String,
    pub modulation_index: char,
    pub data_quality: char,
    pub goes_channel: String,
    pub spacecraft: char,
    pub data_source: String,
}

/// Message data length values the format defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRate {
    /// 190-byte message, data starts right after the header.
    Baud100,
    /// 191-byte message with one leading flag byte.
    Baud300,
}

impl MessageRate {
    pub fn from_data_len(data_len: usize) -> Option<Self> {
        match data_len {
            190 => Some(MessageRate::Baud100),
            191 => Some(MessageRate::Baud300),
            _ => None,
        }
    }

    pub fn flag_len(&self) -> usize {
        match self {
            MessageRate::Baud100 => 0,
            MessageRate::Baud300 => 1,
        }
    }
}

/// Parsed outer envelope of one message. Borrows the payload from the raw block.
#[derive(Debug, Clone)]
pub struct Envelope<'a> {
    pub platform_id: &'a str,
    pub profile: &'a StationProfile,
    /// Raw `YYDDDHHMMSS` field as received.
    pub transmission_time: &'a str,
    pub transmit_time: DateTime<Utc>,
    pub status: DcpStatus,
    pub data_len: usize,
    pub rate: MessageRate,
    pub payload: &'a [u8],
}

impl Envelope<'_> {
    pub fn station(&self) -> &str {
        &self.profile.code
    }
}

/// Unpacked binary sub-block of one station, with the platform it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubBlock<'a> {
    pub platform_id: &'a str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubHeader {
    /// Day of year of the first sample; suspect at stations with the GPS week defect.
    pub day_of_year: u16,
    pub minute_of_day: u16,
    pub offsets: [u8; CHANNEL_COUNT],
    pub orientation: Orientation,
    pub scales: [u8; CHANNEL_COUNT],
    pub alert_capable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSeries {
    pub label: String,
    /// Physical values, `None` where the instrument reported the dead value.
    pub values: Vec<Option<f64>>,
}

impl ChannelSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedRecord {
    pub station: String,
    pub platform_id: String,
    pub epoch: DateTime<Utc>,
    pub transmit_time: DateTime<Utc>,
    pub time_corrected: bool,
    pub orientation: Orientation,
    pub sample_period_seconds: i64,
    pub channels: Vec<ChannelSeries>,
}

impl DecodedRecord {
    pub fn channel(&self, label: &str) -> Option<&ChannelSeries> {
        self.channels.iter().find(|series| series.label == label)
    }

    pub fn sample_count(&self) -> usize {
        self.channels.first().map(ChannelSeries::len).unwrap_or(0)
    }

    pub fn sample_times(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        let period = Duration::seconds(self.sample_period_seconds);
        (0..self.sample_count()).map(move |idx| self.epoch + period * idx as i32)
    }

    /// Time of the last sample.
    pub fn end_time(&self) -> DateTime<Utc> {
        let last = self.sample_count().saturating_sub(1);
        self.epoch + Duration::seconds(self.sample_period_seconds) * last as i32
    }
}
