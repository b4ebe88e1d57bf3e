//! Deferred event delivery through the bounded queue.

use leakscope_core::{AllocId, LifeState, TrackerError};
use leakscope_tracker::{QueueError, Tracker, TrackerConfig, TrackerEvent};

#[test]
fn drain_applies_in_arrival_order() {
    let mut tracker = Tracker::default();
    let queue = tracker.event_queue();
    let tx = queue.sender();
    tx.alloc(AllocId(1), 10, "f").unwrap();
    tx.alloc(AllocId(2), 20, "f").unwrap();
    tx.ref_add(AllocId(1), AllocId(2)).unwrap();
    tx.free(AllocId(2)).unwrap();

    let report = tracker.drain(&queue);
    assert_eq!(report.applied, 4);
    assert!(report.rejected.is_empty());
    assert_eq!(tracker.state(AllocId(2)), LifeState::Freed);
    assert_eq!(tracker.stats().edge_count, 1);
    assert!(queue.is_empty());
}

#[test]
fn rejections_are_collected_and_do_not_stop_the_drain() {
    let mut tracker = Tracker::default();
    let queue = tracker.event_queue();
    let tx = queue.sender();
    tx.free(AllocId(5)).unwrap();
    tx.alloc(AllocId(1), 8, "a").unwrap();
    tx.alloc(AllocId(1), 8, "a").unwrap();
    tx.ref_remove(AllocId(1), AllocId(1)).unwrap();

    let report = tracker.drain(&queue);
    assert_eq!(report.applied, 2);
    assert_eq!(report.drained(), 4);
    assert_eq!(report.rejected.len(), 2);
    assert_eq!(report.rejected[0].0, TrackerEvent::Free { id: AllocId(5) });
    assert!(matches!(
        report.rejected[0].1,
        TrackerError::InvalidState {
            state: LifeState::Unregistered,
            ..
        }
    ));
    assert_eq!(
        report.rejected[1].1,
        TrackerError::DuplicateIdentity { id: AllocId(1) }
    );
    assert_eq!(tracker.metrics().events_rejected, 2);
}

#[test]
fn queue_capacity_follows_config() {
    let tracker = Tracker::new(TrackerConfig {
        event_queue_capacity: 2,
        ..TrackerConfig::default()
    })
    .unwrap();
    let queue = tracker.event_queue();
    assert_eq!(queue.capacity(), 2);
    let tx = queue.sender();
    tx.free(AllocId(1)).unwrap();
    tx.free(AllocId(2)).unwrap();
    assert!(matches!(tx.free(AllocId(3)), Err(QueueError::Full(_))));
}

#[test]
fn producers_on_other_threads() {
    let mut tracker = Tracker::default();
    let queue = tracker.event_queue();
    let workers: Vec<_> = (0..4u64)
        .map(|w| {
            let tx = queue.sender();
            std::thread::spawn(move || {
                for i in 0..50 {
                    tx.alloc(AllocId(w * 1_000 + i), 8, format!("worker{w}"))
                        .unwrap();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    let report = tracker.drain(&queue);
    assert_eq!(report.applied, 200);
    assert_eq!(tracker.stats().live_count, 200);
    assert_eq!(tracker.group_count(), 4);
}
