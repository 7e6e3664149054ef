//! Rendering of parsed events, validation results and metrics.

use anyhow::Result;
use cef::{Event, FormatError, MetricsSnapshot};
use serde::Serialize;
use std::io::Write;

use crate::config::{OutputConfig, OutputFormat};

#[derive(Serialize)]
struct EventRecord<'a> {
    index: usize,
    event: &'a Event,
    #[serde(skip_serializing_if = "Option::is_none")]
    reconstructed: Option<String>,
}

#[derive(Serialize)]
struct ValidationRecord<'a> {
    line: usize,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    raw: &'a str,
}

fn reconstruct(event: &Event, output: &OutputConfig) -> Option<String> {
    if !output.show_reconstructed {
        return None;
    }
    Some(if output.escape {
        cef::serialize_escaped(event)
    } else {
        cef::serialize(event)
    })
}

pub fn write_event(out: &mut impl Write, index: usize, event: &Event, output: &OutputConfig) -> Result<()> {
    let reconstructed = reconstruct(event, output);

    if output.format == OutputFormat::Json {
        let record = EventRecord { index, event, reconstructed };
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "Event {}:", index)?;
    writeln!(out, "  Version: {}", event.version())?;
    writeln!(out, "  Device Vendor: {}", event.device_vendor())?;
    writeln!(out, "  Device Product: {}", event.device_product())?;
    writeln!(out, "  Device Version: {}", event.device_version())?;
    writeln!(out, "  Event Class ID: {}", event.device_event_class_id())?;
    writeln!(out, "  Name: {}", event.name())?;
    writeln!(out, "  Severity: {}", event.severity())?;

    if let Some(src) = event.source_address() {
        writeln!(out, "  Source IP: {}", src)?;
    }
    if let Some(dst) = event.destination_address() {
        writeln!(out, "  Destination IP: {}", dst)?;
    }
    if let Some(spt) = event.source_port() {
        writeln!(out, "  Source Port: {}", spt)?;
    }
    if let Some(dpt) = event.destination_port() {
        writeln!(out, "  Destination Port: {}", dpt)?;
    }
    if let Some(proto) = event.protocol() {
        writeln!(out, "  Protocol: {}", proto)?;
    }
    if let Some(msg) = event.message() {
        writeln!(out, "  Message: {}", msg)?;
    }

    if !event.extensions().is_empty() {
        writeln!(out, "  All Extensions:")?;
        for (key, value) in event.extensions() {
            writeln!(out, "    {} = {}", key, value)?;
        }
    }

    writeln!(out, "  Complete: {}", if event.is_complete() { "Yes" } else { "No" })?;
    if let Some(line) = reconstructed {
        writeln!(out, "  Reconstructed: {}", line)?;
    }
    writeln!(out)?;

    Ok(())
}

pub fn write_validation(
    out: &mut impl Write,
    line_no: usize,
    raw: &str,
    result: &Result<Event, FormatError>,
    format: OutputFormat,
) -> Result<()> {
    let error = result.as_ref().err().map(ToString::to_string);

    match format {
        OutputFormat::Json => {
            let record = ValidationRecord { line: line_no, valid: error.is_none(), error, raw };
            serde_json::to_writer(&mut *out, &record)?;
            writeln!(out)?;
        }
        OutputFormat::Text => match error {
            None => writeln!(out, "Line {}: '{}' -> Valid: Yes", line_no, raw)?,
            Some(reason) => writeln!(out, "Line {}: '{}' -> Valid: No ({})", line_no, raw, reason)?,
        },
    }

    Ok(())
}

pub fn write_summary(out: &mut impl Write, snapshot: &MetricsSnapshot, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        serde_json::to_writer(&mut *out, &serde_json::json!({ "summary": snapshot }))?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "Parsed {} events ({} errors, success rate {:.2}, {:.2} us/line avg)",
        snapshot.total_parsed, snapshot.total_errors, snapshot.success_rate, snapshot.avg_parse_time_us
    )?;
    writeln!(
        out,
        "Severity: low={} medium={} high={} very_high={} unknown={}",
        snapshot.low, snapshot.medium, snapshot.high, snapshot.very_high, snapshot.unknown
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InspectConfig;

    fn render_event(event: &Event, output: &OutputConfig) -> String {
        let mut buf = Vec::new();
        write_event(&mut buf, 1, event, output).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text_event_report() {
        let event = cef::parse("CEF:0|Security|IDS|1.0|100|Attempted admin login|3|src=192.168.1.100 dpt=22 msg=Failed login").unwrap();
        let text = render_event(&event, &InspectConfig::default().output);

        assert!(text.starts_with("Event 1:\n"));
        assert!(text.contains("  Severity: Very High\n"));
        assert!(text.contains("  Source IP: 192.168.1.100\n"));
        assert!(text.contains("  Destination Port: 22\n"));
        assert!(text.contains("    msg = Failed login\n"));
        assert!(text.contains("  Complete: Yes\n"));
        assert!(text.contains("  Reconstructed: CEF:0|Security|IDS|1.0|100|Attempted admin login|3|dpt=22 msg=Failed login src=192.168.1.100\n"));
    }

    #[test]
    fn test_json_event_report() {
        let event = cef::parse(r"CEF:0|Test\|Vendor|P|1|c|n|1|a=1").unwrap();
        let mut output = InspectConfig::default().output;
        output.format = OutputFormat::Json;
        output.escape = true;

        let line = render_event(&event, &output);
        let json: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();

        assert_eq!(json["index"], 1);
        assert_eq!(json["event"]["device_vendor"], "Test|Vendor");
        assert_eq!(json["reconstructed"], r"CEF:0|Test\|Vendor|P|1|c|n|1|a=1");
    }

    #[test]
    fn test_reconstruction_can_be_disabled() {
        let event = cef::parse("CEF:0|V|P|1|c|n|1").unwrap();
        let mut output = InspectConfig::default().output;
        output.show_reconstructed = false;

        assert!(!render_event(&event, &output).contains("Reconstructed"));
    }

    #[test]
    fn test_validation_report() {
        let mut buf = Vec::new();
        let bad = "CEF:0|Too|Few";
        write_validation(&mut buf, 2, bad, &cef::parse(bad), OutputFormat::Text).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("Line 2: 'CEF:0|Too|Few' -> Valid: No (Invalid CEF format"));

        let mut buf = Vec::new();
        let good = "CEF:0|V|P|1|c|n|1";
        write_validation(&mut buf, 1, good, &cef::parse(good), OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json["valid"], true);
        assert!(json.get("error").is_none());
    }
}
