use std::fmt;

use super::escape::escape;
use super::model::Event;

/// Rebuild a CEF line from an event.
///
/// Header strings and extension values are written exactly as stored, with
/// no re-escaping. The output parses back to the same event as long as no
/// header string holds `|` or `\`, and no value holds a `key=`-shaped
/// suffix after whitespace. Use [`serialize_escaped`] when that does not
/// hold.
pub fn serialize(event: &Event) -> String {
    render(event, |s| s.to_string())
}

/// Like [`serialize`], but escapes header strings and extension values.
pub fn serialize_escaped(event: &Event) -> String {
    render(event, escape)
}

fn render(event: &Event, encode: impl Fn(&str) -> String) -> String {
    let mut line = format!(
        "CEF:{}|{}|{}|{}|{}|{}|{}",
        event.version(),
        encode(event.device_vendor()),
        encode(event.device_product()),
        encode(event.device_version()),
        encode(event.device_event_class_id()),
        encode(event.name()),
        event.severity().level(),
    );

    if !event.extensions().is_empty() {
        let pairs: Vec<String> = event
            .extensions()
            .iter()
            .map(|(key, value)| format!("{}={}", key, encode(value)))
            .collect();

        line.push('|');
        line.push_str(&pairs.join(" "));
    }

    line
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize(self))
    }
}
