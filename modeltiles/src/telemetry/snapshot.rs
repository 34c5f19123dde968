//! Point-in-time telemetry snapshot.

use std::fmt;
use std::time::Duration;

/// An immutable copy of [`SourceMetrics`](super::SourceMetrics).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    /// How long the source has been collecting
    pub uptime: Duration,

    // === Bootstrap metrics ===
    pub bootstraps_started: u64,
    pub bootstraps_failed: u64,

    // === Tile metrics ===
    pub tiles_requested: u64,
    pub tiles_loaded: u64,
    pub tiles_failed: u64,
    pub tiles_in_flight: usize,

    // === Discards ===
    pub stale_results_discarded: u64,
    pub aborted_results_discarded: u64,

    // === Actors ===
    pub actor_rebinds: u64,
}

impl TelemetrySnapshot {
    /// Results that reached a terminal outcome, including discards.
    pub fn tiles_settled(&self) -> u64 {
        self.tiles_loaded
            + self.tiles_failed
            + self.stale_results_discarded
            + self.aborted_results_discarded
    }

    /// Fraction of settled tile loads that failed (0.0 - 1.0).
    pub fn failure_rate(&self) -> f64 {
        let settled = self.tiles_settled();
        if settled == 0 {
            0.0
        } else {
            self.tiles_failed as f64 / settled as f64
        }
    }
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Source Telemetry (uptime: {:.1}s)", self.uptime.as_secs_f64())?;
        writeln!(f, "─────────────────────────────────────────")?;
        writeln!(
            f,
            "Bootstraps: {} started, {} failed",
            self.bootstraps_started, self.bootstraps_failed
        )?;
        writeln!(f, "Tiles:")?;
        writeln!(f, "  Requested: {}", self.tiles_requested)?;
        writeln!(f, "  Loaded: {}", self.tiles_loaded)?;
        writeln!(
            f,
            "  Failed: {} ({:.1}%)",
            self.tiles_failed,
            self.failure_rate() * 100.0
        )?;
        writeln!(f, "  In flight: {}", self.tiles_in_flight)?;
        writeln!(
            f,
            "  Discarded: {} stale, {} aborted",
            self.stale_results_discarded, self.aborted_results_discarded
        )?;
        write!(f, "Actor rebinds: {}", self.actor_rebinds)
    }
}
