use std::ops::Range;

use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::DecodeError;
use crate::model::{DcpStatus, Envelope, MessageRate};
use crate::stations::StationLookup;

use super::common::{ascii_field, malformed_header, parse_numeric_field};

/// Fixed-width ASCII header preceding every message payload.
pub const HEADER_SIZE: usize = 37;

const PLATFORM_ID: Range<usize> = 0..8;
const TRANSMISSION_TIME: Range<usize> = 8..19;
const FAILURE_CODE: usize = 19;
const SIGNAL_STRENGTH: Range<usize> = 20..22;
const FREQUENCY_OFFSET: Range<usize> = 22..24;
const MODULATION_INDEX: usize = 24;
const DATA_QUALITY: usize = 25;
const GOES_CHANNEL: Range<usize> = 26..29;
const SPACECRAFT: usize = 29;
const DATA_SOURCE: Range<usize> = 30..32;
const DATA_LEN: Range<usize> = 32..37;

/// Splits the message header and resolves the station that sent it.
pub fn parse_header<'a>(
    raw: &'a [u8],
    stations: &'a dyn StationLookup,
) -> Result<Envelope<'a>, DecodeError> {
    if raw.len() < HEADER_SIZE {
        return Err(malformed_header(
            None,
            raw.len(),
            format!("message has {} bytes, header needs {HEADER_SIZE}", raw.len()),
        ));
    }

    let platform_id = ascii_field(raw, PLATFORM_ID, "platform id", None)?;
    let profile = stations
        .lookup(platform_id)
        .ok_or_else(|| DecodeError::UnknownStation {
            platform_id: platform_id.to_string(),
        })?;
    let pid = Some(platform_id);

    let transmission_time = ascii_field(raw, TRANSMISSION_TIME, "transmission time", pid)?;
    let transmit_time = parse_transmission_time(transmission_time)
        .map_err(|message| malformed_header(pid, TRANSMISSION_TIME.start, message))?;

    // status columns lie inside the length-checked header
    let status = parse_status(raw);

    let data_len: usize = parse_numeric_field(raw, DATA_LEN, "data length", pid)?;
    let rate = MessageRate::from_data_len(data_len).ok_or_else(|| {
        DecodeError::UnsupportedMessageLength {
            platform_id: platform_id.to_string(),
            data_len,
        }
    })?;

    let payload = &raw[HEADER_SIZE..];
    if payload.len() > data_len {
        return Err(malformed_header(
            pid,
            HEADER_SIZE + data_len,
            format!(
                "payload has {} bytes but the header declares {data_len}",
                payload.len()
            ),
        ));
    }

    Ok(Envelope {
        platform_id,
        profile,
        transmission_time,
        transmit_time,
        status,
        data_len,
        rate,
        payload,
    })
}

fn parse_status(raw: &[u8]) -> DcpStatus {
    let text = |range: Range<usize>| String::from_utf8_lossy(&raw[range]).into_owned();
    let byte = |index: usize| char::from(raw[index]);
    DcpStatus {
        failure_code: byte(FAILURE_CODE),
        signal_strength: text(SIGNAL_STRENGTH),
        frequency_offset: text(FREQUENCY_OFFSET),
        modulation_index: byte(MODULATION_INDEX),
        data_quality: byte(DATA_QUALITY),
        goes_channel: text(GOES_CHANNEL),
        spacecraft: byte(SPACECRAFT),
        data_source: text(DATA_SOURCE),
    }
}

/// Parses a relay `YYDDDHHMMSS` stamp; two-digit years are years since 2000.
pub fn parse_transmission_time(raw: &str) -> Result<DateTime<Utc>, String> {
    if raw.len() != 11 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("transmission time '{raw}' is not 11 digits"));
    }

    let field = |range: Range<usize>| -> Result<u32, String> {
        raw[range]
            .parse::<u32>()
            .map_err(|err| format!("transmission time '{raw}': {err}"))
    };

    let year = 2000 + field(0..2)? as i32;
    let day = field(2..5)?;
    let (hour, minute, second) = (field(5..7)?, field(7..9)?, field(9..11)?);

    let date = NaiveDate::from_yo_opt(year, day)
        .ok_or_else(|| format!("transmission time '{raw}': day {day} is not in {year}"))?;
    let time = date
        .and_hms_opt(hour, minute, second)
        .ok_or_else(|| format!("transmission time '{raw}': invalid time of day"))?;
    Ok(time.and_utc())
}
