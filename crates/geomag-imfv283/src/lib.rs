//! Decoder for IMFV283 geomagnetic messages relayed over GOES DCP.
//!
//! A message is a 37-byte ASCII header followed by a pseudo-binary payload. The
//! header names the platform, which selects a [`StationProfile`]; the payload holds a
//! packed sub-block with a 30-byte sub-header and 12 minutes of four-channel samples.

mod assembler;
pub mod decoder;
pub mod errors;
pub mod formats;
pub mod model;
pub mod stations;
pub mod time;

pub use assembler::assemble_record;
pub use decoder::{
    DecoderConfig, FeedReport, Imfv283Decoder, RejectedMessage, DEFAULT_MAX_DATA_AGE_MINUTES,
};
pub use errors::{DecodeError, StationTableError};
pub use model::{
    ChannelSeries, DcpStatus, DecodedRecord, Envelope, MessageRate, Orientation, SubBlock,
    SubHeader, CHANNEL_COUNT, SAMPLE_PERIOD_SECONDS,
};
pub use stations::{Conversion, StationLookup, StationProfile, StationTable};
pub use time::{ReconciledTime, TimeReconciler, DEFAULT_MAX_TRANSMIT_DELAY_MINUTES};

#[cfg(test)]
mod tests;
