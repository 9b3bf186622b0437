use folio_types::Timestamp;
use proptest::prelude::*;

#[test]
fn iso8601_has_millis_and_z_suffix() {
    let ts = Timestamp::parse("2024-05-01T12:30:00Z").unwrap();
    assert_eq!(ts.to_iso8601(), "2024-05-01T12:30:00.000Z");
    assert_eq!(ts.to_string(), "2024-05-01T12:30:00.000Z");
}

#[test]
fn parse_normalizes_offsets_to_utc() {
    let ts = Timestamp::parse("2024-05-01T14:30:00.250+02:00").unwrap();
    assert_eq!(ts.to_iso8601(), "2024-05-01T12:30:00.250Z");
}

#[test]
fn parse_rejects_garbage() {
    assert!(Timestamp::parse("yesterday").is_err());
    assert!("2024-13-01".parse::<Timestamp>().is_err());
}

#[test]
fn now_is_monotonic_enough() {
    let a = Timestamp::now();
    let b = Timestamp::now();
    assert!(a <= b);
}

#[test]
fn serde_uses_iso_string() {
    let ts = Timestamp::parse("2023-01-02T03:04:05.678Z").unwrap();
    let json = serde_json::to_value(ts).unwrap();
    assert_eq!(json, serde_json::json!("2023-01-02T03:04:05.678Z"));
    let back: Timestamp = serde_json::from_value(json).unwrap();
    assert_eq!(back, ts);
}

#[test]
fn deserialize_invalid_string_fails() {
    let result: Result<Timestamp, _> = serde_json::from_str("\"not a date\"");
    assert!(result.is_err());
}

#[test]
fn timestamp_millis_matches_datetime() {
    let ts = Timestamp::parse("1970-01-01T00:00:01.500Z").unwrap();
    assert_eq!(ts.timestamp_millis(), 1500);
}

proptest! {
    #[test]
    fn iso_rendering_roundtrips(millis in 0i64..4_102_444_800_000) {
        let dt = chrono::DateTime::from_timestamp_millis(millis).unwrap();
        let ts = Timestamp::from_datetime(dt);
        let parsed = Timestamp::parse(&ts.to_iso8601()).unwrap();
        prop_assert_eq!(parsed, ts);
    }
}
