//! Simulated game loop feeding a tracker.
//!
//! Each frame spawns a handful of entities under the world root and
//! despawns some. A buggy despawn path drops the parent reference without
//! freeing the entity, so those entities show up as leaks. Every 30
//! frames the loop scans for leaks, prints per-provenance totals, and
//! compacts freed records.
//!
//! Run with `RUST_LOG=leakscope_tracker=debug` for per-event logs.

use leakscope::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

const FRAMES: u64 = 120;
const SCAN_EVERY: u64 = 30;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut tracker = Tracker::new(TrackerConfig {
        frame_history: 60,
        ..TrackerConfig::default()
    })?;
    let world = tracker.track(4096, "World::new")?;
    let mut entities: Vec<AllocId> = Vec::new();

    for frame in 1..=FRAMES {
        // Spawn.
        for n in 0..3 {
            let provenance = if n == 0 { "spawn_enemy" } else { "spawn_particle" };
            let id = tracker.track(64 + 32 * n, provenance)?;
            tracker.on_ref_add(world, id)?;
            entities.push(id);
        }

        // Despawn the two oldest. Every seventh frame the despawn path
        // forgets to free.
        for _ in 0..2 {
            if entities.is_empty() {
                break;
            }
            let id = entities.remove(0);
            tracker.on_ref_remove(world, id);
            if frame % 7 != 0 {
                tracker.on_free(id)?;
            }
        }

        let stats = tracker.next_frame();
        if frame % SCAN_EVERY == 0 {
            let report = tracker.report([world])?;
            info!(
                frame = stats.frame,
                live = stats.live_count,
                live_bytes = stats.live_bytes,
                leaks = report.leaks.len(),
                leaked_bytes = report.leaked_bytes,
                "leak scan"
            );
            for (key, totals) in tracker.provenance_summary() {
                info!(
                    provenance = %key,
                    live = totals.live_count,
                    bytes = totals.live_bytes,
                    "provenance totals"
                );
            }
            let purged = tracker.compact();
            info!(purged, "compacted");
        }
    }

    let metrics = tracker.metrics();
    info!(
        events = metrics.events_applied,
        rejected = metrics.events_rejected,
        purged = metrics.records_purged,
        scans = metrics.scans,
        last_scan_us = metrics.last_scan_us,
        "done"
    );
    Ok(())
}
