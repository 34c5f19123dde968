//! Lock-free atomic metrics collection.

use super::TelemetrySnapshot;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

/// Counters for one tile source.
///
/// All operations use `Relaxed` ordering; counters are independent.
#[derive(Debug)]
pub struct SourceMetrics {
    /// When collection started
    start_time: Instant,

    // === Bootstrap metrics ===
    /// Index bootstraps started
    bootstraps_started: AtomicU64,
    /// Index bootstraps that failed
    bootstraps_failed: AtomicU64,

    // === Tile metrics ===
    /// Tile loads dispatched to a worker
    tiles_requested: AtomicU64,
    /// Tile loads applied to their record
    tiles_loaded: AtomicU64,
    /// Tile loads reported as failed
    tiles_failed: AtomicU64,
    /// Tile loads currently awaiting a worker
    tiles_in_flight: AtomicUsize,

    // === Discards ===
    /// Results dropped because a newer load was dispatched
    stale_results_discarded: AtomicU64,
    /// Results dropped because the record was aborted
    aborted_results_discarded: AtomicU64,

    // === Actors ===
    /// Times a record was bound to a fresh worker
    actor_rebinds: AtomicU64,
}

impl SourceMetrics {
    /// Creates a new metrics instance.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            bootstraps_started: AtomicU64::new(0),
            bootstraps_failed: AtomicU64::new(0),
            tiles_requested: AtomicU64::new(0),
            tiles_loaded: AtomicU64::new(0),
            tiles_failed: AtomicU64::new(0),
            tiles_in_flight: AtomicUsize::new(0),
            stale_results_discarded: AtomicU64::new(0),
            aborted_results_discarded: AtomicU64::new(0),
            actor_rebinds: AtomicU64::new(0),
        }
    }

    // === Bootstrap tracking ===

    /// Record an index bootstrap starting.
    pub fn bootstrap_started(&self) {
        self.bootstraps_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an index bootstrap failing.
    pub fn bootstrap_failed(&self) {
        self.bootstraps_failed.fetch_add(1, Ordering::Relaxed);
    }

    // === Tile tracking ===

    /// Record a tile job being dispatched.
    pub fn tile_requested(&self) {
        self.tiles_requested.fetch_add(1, Ordering::Relaxed);
        self.tiles_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a tile result being applied.
    pub fn tile_loaded(&self) {
        self.tiles_loaded.fetch_add(1, Ordering::Relaxed);
        self.settle();
    }

    /// Record a tile job failing.
    pub fn tile_failed(&self) {
        self.tiles_failed.fetch_add(1, Ordering::Relaxed);
        self.settle();
    }

    /// Record a superseded result being dropped.
    pub fn stale_result_discarded(&self) {
        self.stale_results_discarded.fetch_add(1, Ordering::Relaxed);
        self.settle();
    }

    /// Record a result for an aborted record being dropped.
    pub fn aborted_result_discarded(&self) {
        self.aborted_results_discarded.fetch_add(1, Ordering::Relaxed);
        self.settle();
    }

    /// Record a record being bound to a fresh worker.
    pub fn actor_rebound(&self) {
        self.actor_rebinds.fetch_add(1, Ordering::Relaxed);
    }

    fn settle(&self) {
        // Saturating decrement
        let _ = self
            .tiles_in_flight
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Takes a point-in-time snapshot.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            uptime: self.start_time.elapsed(),
            bootstraps_started: self.bootstraps_started.load(Ordering::Relaxed),
            bootstraps_failed: self.bootstraps_failed.load(Ordering::Relaxed),
            tiles_requested: self.tiles_requested.load(Ordering::Relaxed),
            tiles_loaded: self.tiles_loaded.load(Ordering::Relaxed),
            tiles_failed: self.tiles_failed.load(Ordering::Relaxed),
            tiles_in_flight: self.tiles_in_flight.load(Ordering::Relaxed),
            stale_results_discarded: self.stale_results_discarded.load(Ordering::Relaxed),
            aborted_results_discarded: self.aborted_results_discarded.load(Ordering::Relaxed),
            actor_rebinds: self.actor_rebinds.load(Ordering::Relaxed),
        }
    }
}

impl Default for SourceMetrics {
    fn default() -> Self {
        Self::new()
    }
}
