// Common Event Format parsing and serialization.

pub mod parser;

pub use parser::{
    is_valid, log_lines, parse, parse_log, parse_log_observed, parse_many, parse_many_observed,
    parse_observed,
    escape::{escape, unescape},
    metrics::{MetricsSnapshot, ParseMetrics},
    model::{ErrorKind, Event, FormatError, HeaderField, Severity},
    serialize::{serialize, serialize_escaped},
};
