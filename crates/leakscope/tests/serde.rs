//! Wire shapes produced and accepted with the `serde` feature enabled.

#![cfg(feature = "serde")]

use leakscope::prelude::*;
use serde_json::json;

#[test]
fn record_round_trips_through_json() {
    let mut tracker = Tracker::default();
    tracker.on_alloc(AllocId(7), 48, "Mesh::load").unwrap();
    tracker.on_free(AllocId(7)).unwrap();
    let record = tracker.lookup(AllocId(7)).unwrap().clone();

    let text = serde_json::to_string(&record).unwrap();
    let back: Record = serde_json::from_str(&text).unwrap();
    assert_eq!(back, record);

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["id"], json!(7));
    assert_eq!(value["provenance"], json!("Mesh::load"));
    assert_eq!(value["alive"], json!(false));
}

#[test]
fn partial_config_fills_defaults() {
    let cfg: TrackerConfig =
        serde_json::from_str(r#"{"clock":"wall_clock","default_strategy":"breadth_first"}"#)
            .unwrap();
    assert_eq!(cfg.clock, ClockSource::WallClock);
    assert_eq!(cfg.default_strategy, Strategy::BreadthFirst);

    let defaults = TrackerConfig::default();
    assert_eq!(cfg.frame_history, defaults.frame_history);
    assert_eq!(cfg.event_queue_capacity, defaults.event_queue_capacity);
    assert_eq!(cfg.remember_purged, defaults.remember_purged);
    assert_eq!(cfg.initial_capacity, defaults.initial_capacity);
    assert!(cfg.validate().is_ok());
}

#[test]
fn empty_config_object_is_the_default() {
    let cfg: TrackerConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, TrackerConfig::default());
}

#[test]
fn unknown_strategy_name_is_rejected() {
    let err = serde_json::from_str::<TrackerConfig>(r#"{"default_strategy":"BreadthFirst"}"#);
    assert!(err.is_err());
}

#[test]
fn stats_and_frames_serialize_by_field_name() {
    let mut tracker = Tracker::default();
    let a = tracker.track(16, "a").unwrap();
    let b = tracker.track(32, "b").unwrap();
    tracker.on_ref_add(a, b).unwrap();
    let frame = tracker.next_frame();

    let stats = serde_json::to_value(tracker.stats()).unwrap();
    assert_eq!(stats["live_count"], json!(2));
    assert_eq!(stats["live_bytes"], json!(48));
    assert_eq!(stats["edge_count"], json!(1));
    assert_eq!(stats["total_registered"], json!(2));

    let frame = serde_json::to_value(frame).unwrap();
    assert_eq!(frame["frame"], json!(1));
    assert_eq!(frame["registered"], json!(2));
}

#[test]
fn leak_report_serializes_leaks_and_zombies() {
    let mut tracker = Tracker::default();
    let root = tracker.track(8, "root").unwrap();
    let gone = tracker.track(8, "gone").unwrap();
    let orphan = tracker.track(24, "orphan").unwrap();
    tracker.on_ref_add(root, gone).unwrap();
    tracker.on_free(gone).unwrap();

    let report = tracker.report_with([root], Strategy::BreadthFirst).unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["strategy"], json!("breadth_first"));
    assert_eq!(value["leaks"], json!([orphan.0]));
    assert_eq!(value["leaked_bytes"], json!(24));
    assert_eq!(value["zombies"][0]["from"], json!(root.0));
    assert_eq!(value["zombies"][0]["to"], json!(gone.0));
    assert_eq!(value["zombies"][0]["holder_reachable"], json!(true));
}
