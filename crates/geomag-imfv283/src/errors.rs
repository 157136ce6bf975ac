use chrono::{DateTime, Utc};
use thiserror::Error;

/// Reasons a single IMFV283 message could not be turned into a record.
///
/// Every variant is fatal for the message it was raised on and for nothing else;
/// callers decoding a feed record the error and move on to the next message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("platform {platform_id} is not in the station table")]
    UnknownStation { platform_id: String },

    #[error("malformed message header at byte {offset}: {message}")]
    MalformedHeader {
        platform_id: Option<String>,
        offset: usize,
        message: String,
    },

    #[error("platform {platform_id} declared unsupported data length {data_len} (expected 190 or 191)")]
    UnsupportedMessageLength { platform_id: String, data_len: usize },

    #[error(
        "platform {platform_id} payload truncated: sub-block at offset {offset} needs {expected} bytes, payload has {actual}"
    )]
    TruncatedPayload {
        platform_id: String,
        offset: usize,
        expected: usize,
        actual: usize,
    },

    #[error("platform {platform_id} sub-header malformed: {message}")]
    MalformedSubHeader { platform_id: String, message: String },

    #[error(
        "platform {platform_id} samples truncated: expected {expected} bytes after the sub-header, found {actual}"
    )]
    TruncatedSamples {
        platform_id: String,
        expected: usize,
        actual: usize,
    },

    #[error("platform {platform_id} data starting {epoch} is too old for transmission at {transmit_time}")]
    StaleData {
        platform_id: String,
        epoch: DateTime<Utc>,
        transmit_time: DateTime<Utc>,
    },
}

impl DecodeError {
    /// Platform the failing message came from, when the header got far enough to say.
    pub fn platform_id(&self) -> Option<&str> {
        match self {
            DecodeError::MalformedHeader { platform_id, .. } => platform_id.as_deref(),
            DecodeError::UnknownStation { platform_id }
            | DecodeError::UnsupportedMessageLength { platform_id, .. }
            | DecodeError::TruncatedPayload { platform_id, .. }
            | DecodeError::MalformedSubHeader { platform_id, .. }
            | DecodeError::TruncatedSamples { platform_id, .. }
            | DecodeError::StaleData { platform_id, .. } => Some(platform_id),
        }
    }
}

#[derive(Debug, Error)]
pub enum StationTableError {
    #[error("station table TOML invalid: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("platform id {platform_id} is assigned to both {first} and {second}")]
    DuplicatePlatform {
        platform_id: String,
        first: String,
        second: String,
    },

    #[error("station code {0} appears more than once")]
    DuplicateStation(String),

    #[error("station {station} profile invalid: {message}")]
    InvalidProfile { station: String, message: String },
}
