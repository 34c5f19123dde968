//! Source telemetry.
//!
//! Lock-free counters recorded by the bootstrapper and the tile loader,
//! read out as an immutable [`TelemetrySnapshot`].
//!
//! ```text
//! TiledModelSource / TileLoader ─────► SourceMetrics ─────► TelemetrySnapshot
//!                                     (atomic counters)    (point-in-time copy)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use modeltiles::telemetry::SourceMetrics;
//!
//! let metrics = SourceMetrics::new();
//! metrics.tile_requested();
//! metrics.tile_loaded();
//!
//! let snapshot = metrics.snapshot();
//! println!("{}", snapshot);
//! ```

mod metrics;
mod snapshot;

pub use metrics::SourceMetrics;
pub use snapshot::TelemetrySnapshot;
