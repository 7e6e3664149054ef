//! Header tokenizer and validator.
//!
//! `CEF:Version|Vendor|Product|DeviceVersion|ClassID|Name|Severity[|Extension]`

use std::ops::Range;
use std::str::FromStr;
use std::num::ParseIntError;
use tracing::trace;

use super::escape::unescape;
use super::model::{FormatError, HeaderField, Severity};

pub const CEF_PREFIX: &str = "CEF:";
pub const HEADER_FIELD_COUNT: usize = 7;

/// Header segments and extension blob, borrowed from the input line.
/// Segments are still escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeader<'a> {
    pub fields: Vec<&'a str>,
    pub extension: &'a str,
}

/// Header after field checks and conversion; string fields are unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedHeader {
    pub version: u32,
    pub device_vendor: String,
    pub device_product: String,
    pub device_version: String,
    pub device_event_class_id: String,
    pub name: String,
    pub severity: Severity,
}

/// Split a raw CEF line into its 7 header fields and the extension blob.
pub fn tokenize_header(line: &str) -> Result<RawHeader<'_>, FormatError> {
    if line.is_empty() {
        return Err(FormatError::Empty);
    }

    let content = line
        .strip_prefix(CEF_PREFIX)
        .ok_or(FormatError::MissingPrefix)?;

    let spans = segment_spans(content);
    trace!(segments = spans.len(), "split CEF header");

    if spans.len() < HEADER_FIELD_COUNT {
        return Err(FormatError::TooFewFields(spans.len()));
    }

    let fields = spans[..HEADER_FIELD_COUNT]
        .iter()
        .map(|span| &content[span.clone()])
        .collect();

    // Segments are contiguous, so everything from the 8th segment on is the
    // remaining segments rejoined with '|'.
    let extension = spans
        .get(HEADER_FIELD_COUNT)
        .map(|span| &content[span.start..])
        .unwrap_or("");

    Ok(RawHeader { fields, extension })
}

/// A '|' splits unless the byte right before it is a backslash.
/// Only one byte of lookback is taken, so `\\|` counts as escaped.
fn segment_spans(content: &str) -> Vec<Range<usize>> {
    let bytes = content.as_bytes();
    let mut spans = Vec::with_capacity(HEADER_FIELD_COUNT + 1);
    let mut start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        if b == b'|' && (i == 0 || bytes[i - 1] != b'\\') {
            spans.push(start..i);
            start = i + 1;
        }
    }
    spans.push(start..bytes.len());

    spans
}

pub fn validate(fields: &[&str]) -> Result<ValidatedHeader, FormatError> {
    if fields.len() != HEADER_FIELD_COUNT {
        return Err(FormatError::FieldCount(fields.len()));
    }

    if let Some((field, _)) = HeaderField::ALL
        .iter()
        .zip(fields)
        .find(|(_, raw)| raw.is_empty())
    {
        return Err(FormatError::EmptyField(*field));
    }

    let version = parse_number::<u32>(HeaderField::Version, fields[0])?;
    let severity = parse_number::<i32>(HeaderField::Severity, fields[6])?;

    Ok(ValidatedHeader {
        version,
        device_vendor: unescape(fields[1]),
        device_product: unescape(fields[2]),
        device_version: unescape(fields[3]),
        device_event_class_id: unescape(fields[4]),
        name: unescape(fields[5]),
        severity: Severity::from_level(severity),
    })
}

fn parse_number<T>(field: HeaderField, raw: &str) -> Result<T, FormatError>
where
    T: FromStr<Err = ParseIntError>,
{
    raw.parse().map_err(|source| FormatError::InvalidNumber {
        field,
        value: raw.to_string(),
        source,
    })
}
