use std::collections::BTreeMap;
use std::fmt;
use std::num::ParseIntError;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Well-known extension keys
pub const SOURCE_ADDRESS: &str = "src";
pub const DESTINATION_ADDRESS: &str = "dst";
pub const SOURCE_PORT: &str = "spt";
pub const DESTINATION_PORT: &str = "dpt";
pub const PROTOCOL: &str = "proto";
pub const MESSAGE: &str = "msg";

/// CEF severity, closed over the four defined levels.
///
/// Any numeric level outside 0..=3 resolves to `Unknown` rather than
/// failing the parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    VeryHigh,
    #[default]
    Unknown,
}

impl Severity {
    pub fn from_level(level: i32) -> Self {
        match level {
            0 => Severity::Low,
            1 => Severity::Medium,
            2 => Severity::High,
            3 => Severity::VeryHigh,
            _ => Severity::Unknown,
        }
    }

    /// Numeric level written on serialization (`Unknown` is -1)
    pub fn level(&self) -> i32 {
        match self {
            Severity::Low => 0,
            Severity::Medium => 1,
            Severity::High => 2,
            Severity::VeryHigh => 3,
            Severity::Unknown => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::VeryHigh => "Very High",
            Severity::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The seven fixed header positions, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    Version,
    DeviceVendor,
    DeviceProduct,
    DeviceVersion,
    DeviceEventClassId,
    Name,
    Severity,
}

impl HeaderField {
    pub const ALL: [HeaderField; 7] = [
        HeaderField::Version,
        HeaderField::DeviceVendor,
        HeaderField::DeviceProduct,
        HeaderField::DeviceVersion,
        HeaderField::DeviceEventClassId,
        HeaderField::Name,
        HeaderField::Severity,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HeaderField::Version => "CEF Version",
            HeaderField::DeviceVendor => "Device Vendor",
            HeaderField::DeviceProduct => "Device Product",
            HeaderField::DeviceVersion => "Device Version",
            HeaderField::DeviceEventClassId => "Device Event Class ID",
            HeaderField::Name => "Event Name",
            HeaderField::Severity => "Severity",
        }
    }
}

/// Error categories, used for metrics and for callers that want to branch
/// without matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Empty,
    MissingPrefix,
    TooFewFields,
    EmptyField,
    InvalidNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Empty CEF line")]
    Empty,

    #[error("Line does not start with 'CEF:'")]
    MissingPrefix,

    #[error("Invalid CEF format: expected at least 7 fields (Version|Vendor|Product|DeviceVersion|ClassID|Name|Severity), got {0}")]
    TooFewFields(usize),

    #[error("Invalid CEF header: expected 7 fields (Version|Vendor|Product|Version|ClassID|Name|Severity), got {0} fields")]
    FieldCount(usize),

    #[error("{} cannot be empty", .0.label())]
    EmptyField(HeaderField),

    #[error("Error parsing CEF header fields: {} '{value}' is not a valid integer ({source})", .field.label())]
    InvalidNumber {
        field: HeaderField,
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// Batch wrapper; `line` is 1-based.
    #[error("Error parsing line {line}: {cause}")]
    Line {
        line: usize,
        cause: Box<FormatError>,
    },
}

impl FormatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormatError::Empty => ErrorKind::Empty,
            FormatError::MissingPrefix => ErrorKind::MissingPrefix,
            FormatError::TooFewFields(_) | FormatError::FieldCount(_) => ErrorKind::TooFewFields,
            FormatError::EmptyField(_) => ErrorKind::EmptyField,
            FormatError::InvalidNumber { .. } => ErrorKind::InvalidNumber,
            FormatError::Line { cause, .. } => cause.kind(),
        }
    }

    /// Originating line for batch errors
    pub fn line(&self) -> Option<usize> {
        match self {
            FormatError::Line { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// A parsed CEF event.
///
/// Header strings are stored unescaped. Extensions are kept in a sorted map
/// so serialization and display are deterministic; ordering carries no
/// meaning on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    version: u32,
    device_vendor: String,
    device_product: String,
    device_version: String,
    device_event_class_id: String,
    name: String,
    severity: Severity,
    #[serde(default)]
    extensions: BTreeMap<String, String>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn device_vendor(&self) -> &str {
        &self.device_vendor
    }

    pub fn device_product(&self) -> &str {
        &self.device_product
    }

    pub fn device_version(&self) -> &str {
        &self.device_version
    }

    pub fn device_event_class_id(&self) -> &str {
        &self.device_event_class_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    pub fn set_device_vendor(&mut self, vendor: impl Into<String>) {
        self.device_vendor = vendor.into();
    }

    pub fn set_device_product(&mut self, product: impl Into<String>) {
        self.device_product = product.into();
    }

    pub fn set_device_version(&mut self, version: impl Into<String>) {
        self.device_version = version.into();
    }

    pub fn set_device_event_class_id(&mut self, class_id: impl Into<String>) {
        self.device_event_class_id = class_id.into();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_severity(&mut self, severity: Severity) {
        self.severity = severity;
    }

    pub fn set_severity_level(&mut self, level: i32) {
        self.severity = Severity::from_level(level);
    }

    // --- Extensions ---

    pub fn extensions(&self) -> &BTreeMap<String, String> {
        &self.extensions
    }

    pub fn extension(&self, key: &str) -> Option<&str> {
        self.extensions.get(key).map(String::as_str)
    }

    /// Insert or overwrite an extension value
    pub fn set_extension(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extensions.insert(key.into(), value.into());
    }

    pub(crate) fn set_extensions(&mut self, extensions: BTreeMap<String, String>) {
        self.extensions = extensions;
    }

    pub fn source_address(&self) -> Option<&str> {
        self.extension(SOURCE_ADDRESS)
    }

    pub fn destination_address(&self) -> Option<&str> {
        self.extension(DESTINATION_ADDRESS)
    }

    pub fn source_port(&self) -> Option<u16> {
        self.extension(SOURCE_PORT).and_then(|p| p.parse().ok())
    }

    pub fn destination_port(&self) -> Option<u16> {
        self.extension(DESTINATION_PORT).and_then(|p| p.parse().ok())
    }

    pub fn protocol(&self) -> Option<&str> {
        self.extension(PROTOCOL)
    }

    pub fn message(&self) -> Option<&str> {
        self.extension(MESSAGE)
    }

    pub fn set_source_address(&mut self, address: impl Into<String>) {
        self.set_extension(SOURCE_ADDRESS, address);
    }

    pub fn set_destination_address(&mut self, address: impl Into<String>) {
        self.set_extension(DESTINATION_ADDRESS, address);
    }

    pub fn set_source_port(&mut self, port: u16) {
        self.set_extension(SOURCE_PORT, port.to_string());
    }

    pub fn set_destination_port(&mut self, port: u16) {
        self.set_extension(DESTINATION_PORT, port.to_string());
    }

    pub fn set_protocol(&mut self, protocol: impl Into<String>) {
        self.set_extension(PROTOCOL, protocol);
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.set_extension(MESSAGE, message);
    }

    /// All header strings present and severity resolved to a defined level.
    ///
    /// Version 0 is the current CEF revision, so it counts as complete.
    pub fn is_complete(&self) -> bool {
        !self.device_vendor.is_empty()
            && !self.device_product.is_empty()
            && !self.device_version.is_empty()
            && !self.device_event_class_id.is_empty()
            && !self.name.is_empty()
            && self.severity != Severity::Unknown
    }
}
