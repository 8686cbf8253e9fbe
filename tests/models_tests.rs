// Model tests: bridge payload parsing, staging cursor, record serialization

mod common;

use common::{pass_bucket, sample, staged};
use telemetry_rollup::models::{BridgeMessage, ConsolidatedRecord, StagingCursor};

#[test]
fn bridge_message_ignores_unknown_fields() {
    let msg: BridgeMessage = serde_json::from_str(
        r#"{"clientid":"esp-7","topic":"home/esp-7/hum","payload":"55","username":"bridge","timestamp":1760000000000,"qos":0,"flags":{"dup":false}}"#,
    )
    .unwrap();
    assert_eq!(msg.device_id(), "esp-7");
    assert_eq!(msg.stat(), "hum");
    assert_eq!(msg.payload, "55");
}

#[test]
fn bridge_message_stat_is_last_topic_segment() {
    let msg = |topic: &str| BridgeMessage {
        clientid: "c".into(),
        topic: topic.into(),
        payload: String::new(),
    };
    assert_eq!(msg("a/b/c/lux").stat(), "lux");
    assert_eq!(msg("lux").stat(), "lux");
    assert_eq!(msg("a/b/").stat(), "");
}

#[test]
fn staging_cursor_is_highest_id() {
    assert_eq!(StagingCursor::from_snapshot(&[]), None);
    let mut snapshot = staged(vec![
        sample("d", "s", "1", 0),
        sample("d", "s", "2", 1),
        sample("d", "s", "3", 2),
    ]);
    snapshot.swap(0, 2);
    assert_eq!(StagingCursor::from_snapshot(&snapshot), Some(StagingCursor(3)));
}

#[test]
fn consolidated_record_serializes_camel_case() {
    let rec = ConsolidatedRecord {
        device_id: "dev-1".into(),
        stat: "temp".into(),
        timestamp: pass_bucket(),
        value: "21.00".into(),
        sample_count: 4,
    };
    let v = serde_json::to_value(&rec).unwrap();
    assert_eq!(v["deviceId"], "dev-1");
    assert_eq!(v["sampleCount"], 4);
    assert_eq!(v["timestamp"], "2026-10-18T12:34:00Z");
}
