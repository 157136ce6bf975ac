use std::fmt::Display;
use std::ops::Range;
use std::str::FromStr;

use crate::errors::DecodeError;

pub(crate) fn malformed_header(
    platform_id: Option<&str>,
    offset: usize,
    message: impl Into<String>,
) -> DecodeError {
    DecodeError::MalformedHeader {
        platform_id: platform_id.map(str::to_string),
        offset,
        message: message.into(),
    }
}

pub(crate) fn ascii_field<'a>(
    raw: &'a [u8],
    range: Range<usize>,
    field: &str,
    platform_id: Option<&str>,
) -> Result<&'a str, DecodeError> {
    let bytes = raw.get(range.clone()).ok_or_else(|| {
        malformed_header(
            platform_id,
            raw.len(),
            format!("message ends before {field} (bytes {}..{})", range.start, range.end),
        )
    })?;
    if !bytes.is_ascii() {
        return Err(malformed_header(
            platform_id,
            range.start,
            format!("{field} contains non-ASCII bytes"),
        ));
    }
    std::str::from_utf8(bytes)
        .map_err(|err| malformed_header(platform_id, range.start, format!("{field}: {err}")))
}

pub(crate) fn parse_numeric_field<T>(
    raw: &[u8],
    range: Range<usize>,
    field: &str,
    platform_id: Option<&str>,
) -> Result<T, DecodeError>
where
    T: FromStr,
    T::Err: Display,
{
    let start = range.start;
    let value = ascii_field(raw, range, field, platform_id)?;
    value.parse::<T>().map_err(|err| {
        malformed_header(
            platform_id,
            start,
            format!("failed to parse {field} '{value}': {err}"),
        )
    })
}
