use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::decoder::{DecoderConfig, Imfv283Decoder};
use crate::errors::DecodeError;
use crate::formats::{decode_sub_header, parse_header, unpack_block, HEADER_SIZE};
use crate::model::{MessageRate, Orientation};
use crate::stations::{Conversion, StationLookup, StationProfile, StationTable};

const VIC_FIXTURE: &str = "VIC_14023012741.dat";
const FRD_FIXTURE: &str = "FRD_14023012927_truncated.dat";

const VIC_EXPECTED: [[f64; 4]; 12] = [
    [18083.1, 5441.3, 50536.1, 53971.2],
    [18082.3, 5441.4, 50535.7, 53970.6],
    [18082.7, 5441.7, 50535.8, 53970.8],
    [18082.5, 5441.6, 50535.7, 53970.6],
    [18082.6, 5442.0, 50535.8, 53970.7],
    [18082.0, 5441.6, 50535.7, 53970.5],
    [18082.5, 5441.1, 50536.0, 53970.8],
    [18082.6, 5440.5, 50536.0, 53970.8],
    [18082.5, 5439.8, 50536.0, 53970.7],
    [18082.0, 5439.2, 50535.8, 53970.3],
    [18081.3, 5438.6, 50535.5, 53969.7],
    [18080.4, 5438.4, 50535.0, 53969.0],
];

fn fixture(path: &str) -> Vec<u8> {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

/// Fixture contents without the line terminator the receiver dump carries.
fn message(path: &str) -> Vec<u8> {
    let mut raw = fixture(path);
    while matches!(raw.last(), Some(b'\n' | b'\r')) {
        raw.pop();
    }
    raw
}

fn with_field(raw: &[u8], start: usize, value: &str) -> Vec<u8> {
    let mut patched = raw.to_vec();
    patched[start..start + value.len()].copy_from_slice(value.as_bytes());
    patched
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

fn vic_table(configure: impl FnOnce(&mut StationProfile)) -> StationTable {
    let mut profile = StationTable::builtin()
        .by_code("VIC")
        .cloned()
        .expect("builtin VIC profile");
    configure(&mut profile);
    StationTable::from_profiles(vec![profile]).expect("valid table")
}

#[test]
fn parses_vic_header() {
    let raw = message(VIC_FIXTURE);
    let envelope = parse_header(&raw, StationTable::builtin()).expect("header");

    assert_eq!(envelope.platform_id, "75C2A3A8");
    assert_eq!(envelope.station(), "VIC");
    assert_eq!(envelope.transmission_time, "14023012741");
    assert_eq!(envelope.transmit_time, utc(2014, 1, 23, 1, 27, 41));
    assert_eq!(envelope.data_len, 191);
    assert_eq!(envelope.rate, MessageRate::Baud300);
    assert_eq!(envelope.payload.len(), 190);

    let status = &envelope.status;
    assert_eq!(status.failure_code, 'G');
    assert_eq!(status.signal_strength, "43");
    assert_eq!(status.frequency_offset, "-1");
    assert_eq!(status.modulation_index, 'N');
    assert_eq!(status.data_quality, 'N');
    assert_eq!(status.goes_channel, "027");
    assert_eq!(status.spacecraft, 'E');
    assert_eq!(status.data_source, "UP");
}

#[test]
fn decodes_vic_sub_header() {
    let raw = message(VIC_FIXTURE);
    let envelope = parse_header(&raw, StationTable::builtin()).expect("header");
    let block = unpack_block(&envelope).expect("block");
    assert_eq!(block.bytes.len(), 126);

    let sub_header = decode_sub_header(&block).expect("sub-header");
    assert_eq!(sub_header.day_of_year, 23);
    assert_eq!(sub_header.minute_of_day, 73);
    assert_eq!(sub_header.offsets, [0x96, 0x86, 0xBD, 0xC1]);
    assert_eq!(sub_header.orientation, Orientation::Xyzf);
    assert_eq!(sub_header.scales, [1, 1, 1, 1]);
    assert!(!sub_header.alert_capable);
}

#[test]
fn decodes_vic_message() {
    let record = Imfv283Decoder::builtin()
        .decode(&message(VIC_FIXTURE))
        .expect("VIC decode failed");

    assert_eq!(record.station, "VIC");
    assert_eq!(record.platform_id, "75C2A3A8");
    assert_eq!(record.epoch, utc(2014, 1, 23, 1, 13, 0));
    assert_eq!(record.transmit_time, utc(2014, 1, 23, 1, 27, 41));
    assert!(!record.time_corrected);
    assert_eq!(record.orientation, Orientation::Xyzf);
    assert_eq!(record.sample_period_seconds, 60);
    assert_eq!(record.sample_count(), 12);
    assert_eq!(record.end_time(), utc(2014, 1, 23, 1, 24, 0));

    let labels: Vec<&str> = record.channels.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, ["X", "Y", "Z", "F"]);

    for (row, expected) in VIC_EXPECTED.iter().enumerate() {
        for (channel, &want) in expected.iter().enumerate() {
            let got = record.channels[channel].values[row]
                .unwrap_or_else(|| panic!("row {row} channel {channel} missing"));
            assert!(
                (got - want).abs() < 1e-6,
                "row {row} channel {channel}: {got} != {want}"
            );
        }
    }

    let times: Vec<_> = record.sample_times().collect();
    assert_eq!(times.len(), 12);
    assert_eq!(times[1] - times[0], Duration::minutes(1));
}

#[test]
fn decoding_is_idempotent() {
    let raw = message(VIC_FIXTURE);
    let decoder = Imfv283Decoder::builtin();
    assert_eq!(decoder.decode(&raw), decoder.decode(&raw));
}

#[test]
fn counts_conversion_recovers_raw_words() {
    let table = vic_table(|profile| profile.conversion = Conversion::counts());
    let record = Imfv283Decoder::new(&table, DecoderConfig::default())
        .decode(&message(VIC_FIXTURE))
        .expect("decode");

    let offsets = [0x96u8, 0x86, 0xBD, 0xC1];
    let first_row = [607.0, 5261.0, 5649.0, 7232.0];
    for (channel, raw) in first_row.into_iter().enumerate() {
        let bias = f64::from(offsets[channel]) * 8192.0;
        assert_eq!(record.channels[channel].values[0], Some(raw + bias));
    }
}

#[test]
fn frd_dump_missing_block_bytes_is_truncated() {
    let err = Imfv283Decoder::builtin()
        .decode(&message(FRD_FIXTURE))
        .unwrap_err();
    assert_eq!(
        err,
        DecodeError::TruncatedPayload {
            platform_id: "75C21026".into(),
            offset: 1,
            expected: 190,
            actual: 189,
        }
    );
    assert_eq!(err.platform_id(), Some("75C21026"));
}

#[test]
fn frd_header_still_parses() {
    let raw = message(FRD_FIXTURE);
    let envelope = parse_header(&raw, StationTable::builtin()).expect("header");
    assert_eq!(envelope.station(), "FRD");
    assert_eq!(envelope.transmit_time, utc(2014, 1, 23, 1, 29, 27));
    assert_eq!(envelope.status.frequency_offset, "-0");
}

#[test]
fn payload_covering_exact_block_extent_decodes() {
    let raw = message(VIC_FIXTURE);
    assert_eq!(raw.len(), HEADER_SIZE + 1 + 189);
    assert!(Imfv283Decoder::builtin().decode(&raw).is_ok());

    let short = &raw[..raw.len() - 1];
    let err = Imfv283Decoder::builtin().decode(short).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::TruncatedPayload {
            expected: 190,
            actual: 189,
            ..
        }
    ));
}

#[test]
fn payload_at_declared_length_decodes() {
    let mut raw = message(VIC_FIXTURE);
    raw.push(b'@');
    assert_eq!(raw.len() - HEADER_SIZE, 191);

    let decoder = Imfv283Decoder::builtin();
    let record = decoder.decode(&raw).expect("full-length payload");
    assert_eq!(Ok(record), decoder.decode(&message(VIC_FIXTURE)));
}

#[test]
fn oversized_block_offset_is_truncated_payload() {
    let table = vic_table(|profile| profile.block_offset = usize::MAX);
    let err = Imfv283Decoder::new(&table, DecoderConfig::default())
        .decode(&message(VIC_FIXTURE))
        .unwrap_err();
    assert_eq!(
        err,
        DecodeError::TruncatedPayload {
            platform_id: "75C2A3A8".into(),
            offset: usize::MAX,
            expected: usize::MAX,
            actual: 190,
        }
    );
}

#[test]
fn block_offset_shifts_the_extracted_block() {
    let table = vic_table(|profile| profile.block_offset = 1);
    let err = Imfv283Decoder::new(&table, DecoderConfig::default())
        .decode(&message(VIC_FIXTURE))
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::TruncatedPayload {
            offset: 2,
            expected: 191,
            ..
        }
    ));
}

#[test]
fn unknown_platform_is_rejected() {
    let raw = with_field(&message(VIC_FIXTURE), 0, "DEADBEEF");
    let err = Imfv283Decoder::builtin().decode(&raw).unwrap_err();
    assert_eq!(
        err,
        DecodeError::UnknownStation {
            platform_id: "DEADBEEF".into()
        }
    );
}

#[test]
fn short_message_is_malformed_header() {
    let err = Imfv283Decoder::builtin()
        .decode(b"75C2A3A814023")
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::MalformedHeader {
            platform_id: None,
            ..
        }
    ));
}

#[test]
fn impossible_transmission_day_is_malformed_header() {
    let raw = with_field(&message(VIC_FIXTURE), 8, "14400012741");
    match Imfv283Decoder::builtin().decode(&raw).unwrap_err() {
        DecodeError::MalformedHeader {
            platform_id,
            offset,
            message,
        } => {
            assert_eq!(platform_id.as_deref(), Some("75C2A3A8"));
            assert_eq!(offset, 8);
            assert!(message.contains("day 400"), "{message}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn status_codes_are_kept_as_received() {
    let reference = Imfv283Decoder::builtin()
        .decode(&message(VIC_FIXTURE))
        .expect("decode");

    for (start, value) in [(22, "+A"), (22, "-A"), (20, "4x"), (26, "0?7")] {
        let raw = with_field(&message(VIC_FIXTURE), start, value);
        let envelope = parse_header(&raw, StationTable::builtin())
            .unwrap_or_else(|err| panic!("{value} at {start}: {err}"));
        let status = &envelope.status;
        let field = match start {
            20 => &status.signal_strength,
            22 => &status.frequency_offset,
            _ => &status.goes_channel,
        };
        assert_eq!(field, value);

        let record = Imfv283Decoder::builtin()
            .decode(&raw)
            .unwrap_or_else(|err| panic!("{value} at {start}: {err}"));
        assert_eq!(record, reference);
    }
}

#[test]
fn unsupported_data_length_is_rejected() {
    let raw = with_field(&message(VIC_FIXTURE), 32, "00200");
    let err = Imfv283Decoder::builtin().decode(&raw).unwrap_err();
    assert_eq!(
        err,
        DecodeError::UnsupportedMessageLength {
            platform_id: "75C2A3A8".into(),
            data_len: 200,
        }
    );
}

#[test]
fn bytes_past_declared_length_are_malformed_header() {
    let mut raw = message(VIC_FIXTURE);
    raw.extend_from_slice(b"@@");
    let err = Imfv283Decoder::builtin().decode(&raw).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::MalformedHeader {
            offset: 228,
            ..
        }
    ));
}

#[test]
fn rolled_over_day_is_corrected_from_transmission_day() {
    // same message received on day 100: the reported day 23 is months stale
    let raw = with_field(&message(VIC_FIXTURE), 8, "14100012741");
    let record = Imfv283Decoder::builtin().decode(&raw).expect("decode");
    assert!(record.time_corrected);
    assert_eq!(record.epoch, utc(2014, 4, 10, 1, 13, 0));
    assert_eq!(record.transmit_time, utc(2014, 4, 10, 1, 27, 41));
}

#[test]
fn stale_data_is_rejected_when_age_limit_applies() {
    let raw = message(VIC_FIXTURE);
    let strict = DecoderConfig {
        max_data_age: Some(Duration::minutes(10)),
        ..DecoderConfig::default()
    };
    let err = Imfv283Decoder::new(StationTable::builtin(), strict)
        .decode(&raw)
        .unwrap_err();
    assert_eq!(
        err,
        DecodeError::StaleData {
            platform_id: "75C2A3A8".into(),
            epoch: utc(2014, 1, 23, 1, 13, 0),
            transmit_time: utc(2014, 1, 23, 1, 27, 41),
        }
    );

    let unlimited = DecoderConfig {
        max_data_age: None,
        ..strict
    };
    assert!(Imfv283Decoder::new(StationTable::builtin(), unlimited)
        .decode(&raw)
        .is_ok());
}

#[test]
fn reported_orientation_wins_over_profile() {
    let table = vic_table(|profile| profile.orientation = Orientation::Hezf);
    assert_eq!(
        table.lookup("75C2A3A8").map(|p| p.orientation),
        Some(Orientation::Hezf)
    );

    let record = Imfv283Decoder::new(&table, DecoderConfig::default())
        .decode(&message(VIC_FIXTURE))
        .expect("decode");
    assert_eq!(record.orientation, Orientation::Xyzf);
    assert!(record.channel("X").is_some());
    assert!(record.channel("H").is_none());
}

#[test]
fn dead_value_decodes_to_missing_sample() {
    // 0x7F in every position of the first sample triplet sets all 16 bits
    let mut raw = message(VIC_FIXTURE);
    let first_sample = HEADER_SIZE + 1 + 15 * 3;
    raw[first_sample..first_sample + 3].copy_from_slice(&[0x7F, 0x7F, 0x7F]);

    let record = Imfv283Decoder::builtin().decode(&raw).expect("decode");
    let x = record.channel("X").expect("X channel");
    assert_eq!(x.values[0], None);
    assert!(x.values[1].is_some());
}

#[test]
fn feed_rejects_bad_lines_and_keeps_good_ones() {
    let mut feed = message(VIC_FIXTURE);
    feed.extend_from_slice(b"\r\n\n");
    feed.extend_from_slice(&message(FRD_FIXTURE));
    feed.extend_from_slice(b"\n75C2A3A8\n");

    let report = Imfv283Decoder::builtin().decode_feed(&feed);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].station, "VIC");
    assert_eq!(report.message_count(), 3);
    assert_eq!(report.corrected_count(), 0);

    let rejected: Vec<usize> = report.rejected.iter().map(|r| r.line_index).collect();
    assert_eq!(rejected, [2, 3]);
    assert!(matches!(
        report.rejected[0].error,
        DecodeError::TruncatedPayload { .. }
    ));
    assert!(matches!(
        report.rejected[1].error,
        DecodeError::MalformedHeader {
            platform_id: None,
            ..
        }
    ));
}
