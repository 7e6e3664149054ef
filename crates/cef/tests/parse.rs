use cef::{is_valid, parse, parse_log, parse_many, serialize, ErrorKind, FormatError, Severity};

#[test]
fn test_extension_fields() {
    let event = parse(
        "CEF:0|Test|Product|1.0|100|Event|1|src=1.1.1.1 spt=80 dst=2.2.2.2 dpt=443 proto=TCP msg=Test message",
    )
    .unwrap();

    assert_eq!(event.source_address(), Some("1.1.1.1"));
    assert_eq!(event.destination_address(), Some("2.2.2.2"));
    assert_eq!(event.source_port(), Some(80));
    assert_eq!(event.destination_port(), Some(443));
    assert_eq!(event.protocol(), Some("TCP"));
    assert_eq!(event.message(), Some("Test message"));
}

#[test]
fn test_header_only_line() {
    let event = parse("CEF:0|Test|Product|1.0|100|Event|0").unwrap();

    assert_eq!(event.version(), 0);
    assert_eq!(event.name(), "Event");
    assert_eq!(event.severity(), Severity::Low);
    assert!(event.extensions().is_empty());
}

#[test]
fn test_severity_levels() {
    let cases = [
        ("CEF:0|Test|Product|1.0|100|Event|0", Severity::Low),
        ("CEF:0|Test|Product|1.0|100|Event|1", Severity::Medium),
        ("CEF:0|Test|Product|1.0|100|Event|2", Severity::High),
        ("CEF:0|Test|Product|1.0|100|Event|3", Severity::VeryHigh),
        ("CEF:0|Test|Product|1.0|100|Event|99", Severity::Unknown),
        ("CEF:0|Test|Product|1.0|100|Event|-4", Severity::Unknown),
    ];

    for (line, expected) in cases {
        assert_eq!(parse(line).unwrap().severity(), expected, "line: {}", line);
    }
}

#[test]
fn test_invalid_lines() {
    let cases = [
        ("", ErrorKind::Empty),
        ("not CEF", ErrorKind::MissingPrefix),
        ("CEF:0|Too|Few|Fields", ErrorKind::TooFewFields),
        ("CEF:invalid|version|test|1.0|100|Event|1", ErrorKind::InvalidNumber),
        ("CEF:0|Vendor|Product|1.0|100|Event|", ErrorKind::EmptyField),
    ];

    for (line, kind) in cases {
        let err = parse(line).unwrap_err();
        assert_eq!(err.kind(), kind, "line: {:?}", line);
        assert!(!is_valid(line));
    }
}

#[test]
fn test_batch_parsing() {
    let lines = [
        "CEF:0|Vendor1|Product1|1.0|100|Event1|1|src=1.1.1.1",
        "CEF:0|Vendor2|Product2|2.0|200|Event2|2|dst=2.2.2.2",
    ];

    let events = parse_many(lines).unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].device_vendor(), "Vendor1");
    assert_eq!(events[1].device_vendor(), "Vendor2");
    assert_eq!(events[0].source_address(), Some("1.1.1.1"));
    assert_eq!(events[1].destination_address(), Some("2.2.2.2"));
}

#[test]
fn test_batch_fails_on_first_bad_line() {
    let lines = [
        "CEF:0|V|P|1|1|E|1",
        "CEF:0|V|P|1|1|E|1",
        "CEF:0|V|P|1|1|E|1",
        "CEF:0|V|P",
        "also bad",
    ];

    match parse_many(lines) {
        Err(FormatError::Line { line, cause }) => {
            assert_eq!(line, 4);
            assert_eq!(*cause, FormatError::TooFewFields(3));
        }
        other => panic!("expected line error, got {:?}", other),
    }
}

#[test]
fn test_parse_log_multi_line() {
    let log = "\
CEF:0|Security|IDS|1.0|100|Attempted admin login|3|src=192.168.1.100 dst=10.0.0.1 spt=1234 dpt=22 proto=TCP msg=Failed login attempt
CEF:0|ArcSight|ArcSight|4.0.1.4122.3|activity:login|User Login|1|src=192.168.1.50 suser=johndoe outcome=Success

CEF:0|Checkpoint|VPN-1 & FireWall-1|4.1|Accept|Accept|0|src=192.168.1.1 dst=10.0.0.5 proto=tcp service=http
";

    let events = parse_log(log).unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].message(), Some("Failed login attempt"));
    assert_eq!(events[1].device_event_class_id(), "activity:login");
    assert_eq!(events[1].extension("suser"), Some("johndoe"));
    assert_eq!(events[2].device_product(), "VPN-1 & FireWall-1");
}

#[test]
fn test_serialize_then_parse() {
    let original = "CEF:0|Security|IDS|1.0|100|Test Event|2|src=192.168.1.1 dst=10.0.0.1 proto=TCP";
    let event = parse(original).unwrap();

    let reparsed = parse(&serialize(&event)).unwrap();

    assert_eq!(reparsed, event);
    assert_eq!(reparsed.source_address(), Some("192.168.1.1"));
}

#[test]
fn test_repeated_key_keeps_last_value() {
    let event = parse("CEF:0|V|P|1|1|E|1|act=allow act=drop").unwrap();
    assert_eq!(event.extensions().len(), 1);
    assert_eq!(event.extension("act"), Some("drop"));
}
