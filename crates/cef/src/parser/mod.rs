//! CEF (Common Event Format) parsing
//!
//! # Architecture
//!
//! - `header.rs`: pipe tokenizer and header field validation
//! - `extension.rs`: `key=value` extension scanner
//! - `escape.rs`: backslash escaping shared by both
//! - `model.rs`: `Event`, `Severity` and `FormatError`
//! - `serialize.rs`: event back to a CEF line
//! - `metrics.rs`: parse counters
//!
//! Header fields are strict: any malformed header fails the whole line.
//! Extensions are lenient: unmatched text is dropped and duplicate keys
//! overwrite, never an error.

pub mod escape;
pub mod extension;
pub mod header;
pub mod metrics;
pub mod model;
pub mod serialize;

use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, trace};

use metrics::ParseMetrics;
use model::{Event, FormatError};

/// Whitespace as CEF producers use it (ASCII, including vertical tab)
pub(crate) fn is_cef_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

/// Parse a single CEF line.
pub fn parse(line: &str) -> Result<Event, FormatError> {
    let raw = header::tokenize_header(line)?;
    let header = header::validate(&raw.fields)?;

    let extensions = if raw.extension.is_empty() {
        BTreeMap::new()
    } else {
        extension::tokenize_extensions(raw.extension)
    };
    trace!(extensions = extensions.len(), "parsed CEF line");

    let mut event = Event::new();
    event.set_version(header.version);
    event.set_device_vendor(header.device_vendor);
    event.set_device_product(header.device_product);
    event.set_device_version(header.device_version);
    event.set_device_event_class_id(header.device_event_class_id);
    event.set_name(header.name);
    event.set_severity(header.severity);
    event.set_extensions(extensions);

    Ok(event)
}

/// Parse lines in order, stopping at the first failure.
/// The error carries the 1-based index of the failing line.
pub fn parse_many<I>(lines: I) -> Result<Vec<Event>, FormatError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    collect_events(lines, None)
}

/// [`parse_many`], recording each outcome into `metrics`.
pub fn parse_many_observed<I>(lines: I, metrics: &ParseMetrics) -> Result<Vec<Event>, FormatError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    collect_events(lines, Some(metrics))
}

/// Parse a multi-line log. Lines split on `\n` or `\r`; blank lines are
/// skipped and do not count towards reported line numbers.
pub fn parse_log(log: &str) -> Result<Vec<Event>, FormatError> {
    parse_many(log_lines(log))
}

pub fn parse_log_observed(log: &str, metrics: &ParseMetrics) -> Result<Vec<Event>, FormatError> {
    parse_many_observed(log_lines(log), metrics)
}

/// Non-blank lines of a log, in order
pub fn log_lines(log: &str) -> impl Iterator<Item = &str> + '_ {
    log.split(|c: char| c == '\n' || c == '\r')
        .filter(|line| !line.trim_matches(is_cef_space).is_empty())
}

pub fn is_valid(line: &str) -> bool {
    parse(line).is_ok()
}

/// Parse one line and record the outcome.
pub fn parse_observed(line: &str, metrics: &ParseMetrics) -> Result<Event, FormatError> {
    let start = Instant::now();
    let result = parse(line);
    let elapsed = start.elapsed().as_nanos() as u64;

    match &result {
        Ok(event) => metrics.record_parse(event, elapsed),
        Err(e) => metrics.record_error(e.kind()),
    }

    result
}

fn collect_events<I>(lines: I, metrics: Option<&ParseMetrics>) -> Result<Vec<Event>, FormatError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let lines = lines.into_iter();
    let mut events = Vec::with_capacity(lines.size_hint().0);

    for (idx, line) in lines.enumerate() {
        let line = line.as_ref();
        let result = match metrics {
            Some(metrics) => parse_observed(line, metrics),
            None => parse(line),
        };

        match result {
            Ok(event) => events.push(event),
            Err(e) => {
                debug!(line = idx + 1, error = %e, "CEF batch parse stopped");
                return Err(FormatError::Line {
                    line: idx + 1,
                    cause: Box::new(e),
                });
            }
        }
    }

    Ok(events)
}
