use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

use super::model::{ErrorKind, Event, Severity};

/// Forces the wrapped group onto its own 64-byte cache line so counters
/// bumped from different threads do not false-share.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct CacheAligned<T>(pub T);

/// Per-severity counters for successfully parsed events
#[derive(Debug, Default)]
pub struct SeverityMetrics {
    pub low: AtomicU64,
    pub medium: AtomicU64,
    pub high: AtomicU64,
    pub very_high: AtomicU64,
    pub unknown: AtomicU64,
}

#[derive(Debug, Default)]
pub struct TotalMetrics {
    pub count: AtomicU64,
    pub time_nanos: AtomicU64,
    pub extension_pairs: AtomicU64,
}

/// Error counters by kind
#[derive(Debug, Default)]
pub struct ErrorMetrics {
    pub empty: AtomicU64,
    pub missing_prefix: AtomicU64,
    pub too_few_fields: AtomicU64,
    pub empty_field: AtomicU64,
    pub invalid_number: AtomicU64,
}

/// Counters for CEF parsing.
///
/// All operations use `Ordering::Relaxed`; `snapshot()` reads each counter
/// atomically but not the set as a whole, so totals may be off by an
/// in-flight parse.
#[derive(Debug, Default)]
pub struct ParseMetrics {
    pub totals: CacheAligned<TotalMetrics>,
    pub severities: CacheAligned<SeverityMetrics>,
    pub errors: CacheAligned<ErrorMetrics>,
}

impl ParseMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful parse
    #[inline]
    pub fn record_parse(&self, event: &Event, time_nanos: u64) {
        self.totals.0.count.fetch_add(1, Ordering::Relaxed);
        self.totals.0.time_nanos.fetch_add(time_nanos, Ordering::Relaxed);
        self.totals.0.extension_pairs.fetch_add(event.extensions().len() as u64, Ordering::Relaxed);

        let severities = &self.severities.0;
        match event.severity() {
            Severity::Low => severities.low.fetch_add(1, Ordering::Relaxed),
            Severity::Medium => severities.medium.fetch_add(1, Ordering::Relaxed),
            Severity::High => severities.high.fetch_add(1, Ordering::Relaxed),
            Severity::VeryHigh => severities.very_high.fetch_add(1, Ordering::Relaxed),
            Severity::Unknown => severities.unknown.fetch_add(1, Ordering::Relaxed),
        };
    }

    #[inline]
    pub fn record_error(&self, kind: ErrorKind) {
        let errors = &self.errors.0;
        match kind {
            ErrorKind::Empty => errors.empty.fetch_add(1, Ordering::Relaxed),
            ErrorKind::MissingPrefix => errors.missing_prefix.fetch_add(1, Ordering::Relaxed),
            ErrorKind::TooFewFields => errors.too_few_fields.fetch_add(1, Ordering::Relaxed),
            ErrorKind::EmptyField => errors.empty_field.fetch_add(1, Ordering::Relaxed),
            ErrorKind::InvalidNumber => errors.invalid_number.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_parsed = self.totals.0.count.load(Ordering::Relaxed);
        let total_time_ns = self.totals.0.time_nanos.load(Ordering::Relaxed);

        let errors = &self.errors.0;
        let empty_errors = errors.empty.load(Ordering::Relaxed);
        let missing_prefix_errors = errors.missing_prefix.load(Ordering::Relaxed);
        let too_few_fields_errors = errors.too_few_fields.load(Ordering::Relaxed);
        let empty_field_errors = errors.empty_field.load(Ordering::Relaxed);
        let invalid_number_errors = errors.invalid_number.load(Ordering::Relaxed);

        let total_errors = empty_errors
            + missing_prefix_errors
            + too_few_fields_errors
            + empty_field_errors
            + invalid_number_errors;
        let total_attempts = total_parsed + total_errors;

        let severities = &self.severities.0;

        MetricsSnapshot {
            total_parsed,
            extension_pairs: self.totals.0.extension_pairs.load(Ordering::Relaxed),
            avg_parse_time_us: if total_parsed > 0 {
                (total_time_ns as f64 / total_parsed as f64) / 1000.0
            } else {
                0.0
            },

            low: severities.low.load(Ordering::Relaxed),
            medium: severities.medium.load(Ordering::Relaxed),
            high: severities.high.load(Ordering::Relaxed),
            very_high: severities.very_high.load(Ordering::Relaxed),
            unknown: severities.unknown.load(Ordering::Relaxed),

            total_errors,
            empty_errors,
            missing_prefix_errors,
            too_few_fields_errors,
            empty_field_errors,
            invalid_number_errors,
            success_rate: if total_attempts > 0 {
                total_parsed as f64 / total_attempts as f64
            } else {
                1.0
            },
        }
    }
}

/// Read-only copy of [`ParseMetrics`], serializable for reports.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_parsed: u64,
    pub extension_pairs: u64,
    pub avg_parse_time_us: f64,

    // Severity breakdown
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub very_high: u64,
    pub unknown: u64,

    // Errors
    pub total_errors: u64,
    pub empty_errors: u64,
    pub missing_prefix_errors: u64,
    pub too_few_fields_errors: u64,
    pub empty_field_errors: u64,
    pub invalid_number_errors: u64,
    pub success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with(severity: Severity, pairs: usize) -> Event {
        let mut event = Event::new();
        event.set_severity(severity);
        for i in 0..pairs {
            event.set_extension(format!("k{}", i), "v");
        }
        event
    }

    #[test]
    fn test_new_metrics_are_empty() {
        let snap = ParseMetrics::new().snapshot();

        assert_eq!(snap.total_parsed, 0);
        assert_eq!(snap.total_errors, 0);
        assert_eq!(snap.avg_parse_time_us, 0.0);
        assert_eq!(snap.success_rate, 1.0);
    }

    #[test]
    fn test_record_parse_counts_and_times() {
        let metrics = ParseMetrics::new();

        metrics.record_parse(&event_with(Severity::Low, 2), 1000);
        metrics.record_parse(&event_with(Severity::Unknown, 1), 2000);

        let snap = metrics.snapshot();
        assert_eq!(snap.total_parsed, 2);
        assert_eq!(snap.low, 1);
        assert_eq!(snap.unknown, 1);
        assert_eq!(snap.extension_pairs, 3);

        // 3000ns over 2 parses = 1.5us
        assert!((snap.avg_parse_time_us - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_error_recording_and_success_rate() {
        let metrics = ParseMetrics::new();

        metrics.record_parse(&event_with(Severity::High, 0), 100);
        metrics.record_parse(&event_with(Severity::High, 0), 100);
        metrics.record_error(ErrorKind::MissingPrefix);
        metrics.record_error(ErrorKind::InvalidNumber);

        let snap = metrics.snapshot();
        assert_eq!(snap.high, 2);
        assert_eq!(snap.missing_prefix_errors, 1);
        assert_eq!(snap.invalid_number_errors, 1);
        assert_eq!(snap.total_errors, 2);
        assert_eq!(snap.success_rate, 0.5);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = ParseMetrics::new();
        metrics.record_error(ErrorKind::TooFewFields);

        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["too_few_fields_errors"], 1);
        assert_eq!(json["success_rate"], 0.0);
    }
}
