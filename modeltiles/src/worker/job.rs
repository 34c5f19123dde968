//! Job and result types exchanged with worker actors.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::coord::OverscaledTileId;
use crate::request::RequestParameters;
use crate::tile::{BucketMap, TileUid};
use crate::transport::TransportError;

/// Pool-wide job identifier, increasing in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Handle to a dispatched job, stored on the tile that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobHandle {
    /// Job identifier.
    pub id: JobId,
    /// Worker slot the job was sent to.
    pub actor_id: usize,
}

/// Kind of work requested from a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Fetch and decode a tile.
    LoadTile,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::LoadTile => write!(f, "loadTile"),
        }
    }
}

/// Parameters of a tile job.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerJob {
    /// Transformed request for the tile payload.
    pub request: RequestParameters,
    /// Unique id of the tile record.
    pub uid: TileUid,
    /// Tile identity.
    pub tile_id: OverscaledTileId,
    /// Zoom the tile was requested for.
    pub tile_zoom: u8,
    /// Zoom the tile is rendered at.
    pub zoom: u8,
    /// Pixel size, scaled by the overscale factor.
    pub tile_size: u32,
    /// Source type tag.
    pub source_type: String,
    /// Source id.
    pub source: String,
    /// Renderer debug flag.
    pub show_collision_boxes: bool,
    /// Whether the tile feeds symbol placement.
    pub is_symbol_tile: bool,
}

/// Timing of one network exchange performed by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTiming {
    /// Requested URL.
    pub name: String,
    /// Wall-clock start of the request.
    pub start_time: DateTime<Utc>,
    /// Time until the body was fully read.
    pub duration: Duration,
    /// Body size in bytes.
    pub transfer_size: u64,
}

/// Successful outcome of a tile job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerResult {
    /// Newly decoded buckets.
    pub buckets: BucketMap,
    /// Resource timing, when requested.
    pub resource_timing: Option<Vec<ResourceTiming>>,
    /// `Cache-Control` header of the tile response.
    pub cache_control: Option<String>,
    /// `Expires` header of the tile response.
    pub expires: Option<String>,
}

/// Errors reported for a job.
///
/// Transport and decode failures are reported the same way; the loader
/// does not need to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// The tile payload could not be fetched.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The payload was fetched but could not be decoded.
    #[error("Failed to decode tile {tile}: {reason}")]
    Decode { tile: String, reason: String },

    /// The worker went away before answering.
    #[error("Worker {actor_id} terminated before the job completed")]
    Terminated { actor_id: usize },
}

impl WorkerError {
    /// Creates a decode error for a tile.
    pub fn decode(tile: &OverscaledTileId, reason: impl Into<String>) -> Self {
        Self::Decode {
            tile: tile.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_ordering_and_display() {
        assert!(JobId(1) < JobId(2));
        assert_eq!(JobId(7).to_string(), "job-7");
    }

    #[test]
    fn test_worker_error_display() {
        let tile = OverscaledTileId::new(5, 0, 5, 3, 2).unwrap();
        let err = WorkerError::decode(&tile, "truncated header");
        assert_eq!(err.to_string(), "Failed to decode tile 5/3/2: truncated header");

        let err: WorkerError = TransportError::Status {
            status: 500,
            url: "https://example/5/3/2".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "HTTP 500 from https://example/5/3/2");
    }
}
