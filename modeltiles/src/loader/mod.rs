//! Tile load orchestration.
//!
//! [`TileLoader`] turns a tile record into a worker job, dispatches it, and
//! applies the result back onto the record. Results are only applied if the
//! record has not been aborted and the job is still the newest one
//! dispatched for that record; anything else is dropped without touching the
//! record.
//!
//! ```text
//! load_tile ─► url + transform ─► WorkerJob ─► ActorBinding::send
//!                                                     │
//!    record ◄── complete / fail_request ◄── aborted? stale? ◄──┘
//! ```

mod error;

pub use error::TileLoadError;

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::request::ResourceKind;
use crate::source::{MapContext, SourceConfig, SOURCE_TYPE};
use crate::telemetry::SourceMetrics;
use crate::tile::SharedTile;
use crate::worker::{JobKind, WorkerJob, WorkerPool};

/// Loads tiles for one source.
#[derive(Clone)]
pub struct TileLoader {
    config: Arc<RwLock<SourceConfig>>,
    context: MapContext,
    pool: Arc<WorkerPool>,
    metrics: Arc<SourceMetrics>,
}

impl TileLoader {
    pub fn new(
        config: Arc<RwLock<SourceConfig>>,
        context: MapContext,
        pool: Arc<WorkerPool>,
        metrics: Arc<SourceMetrics>,
    ) -> Self {
        Self {
            config,
            context,
            pool,
            metrics,
        }
    }

    /// Loads a tile and applies the result to it.
    ///
    /// Returns `Ok(())` when the result was applied, and also when it was
    /// dropped because the record was aborted or a newer load superseded
    /// this one. There is no timeout: a job that never answers leaves the
    /// record loading.
    pub async fn load_tile(&self, tile: &SharedTile) -> Result<(), TileLoadError> {
        let (tile_id, sequence, pending) = {
            let config = self.config.read();
            let mut record = tile.lock();
            let tile_id = record.tile_id();

            if record.is_aborted() {
                debug!(tile = %tile_id, "Tile aborted before dispatch");
                return Ok(());
            }

            let url = tile_id
                .canonical
                .url(&config.tiles, config.scheme)
                .ok_or_else(|| TileLoadError::NoTileTemplates {
                    tile: tile_id.to_string(),
                })?;
            let url = self.context.requests.normalize_tile_url(&url);
            let request = self.context.requests.transform_request(&url, ResourceKind::Tile);

            let job = WorkerJob {
                request,
                uid: record.uid(),
                tile_id,
                tile_zoom: record.tile_zoom(),
                zoom: tile_id.overscaled_z,
                tile_size: config.tile_size.saturating_mul(tile_id.overscale_factor()),
                source_type: SOURCE_TYPE.to_string(),
                source: config.id.clone(),
                show_collision_boxes: self.context.show_collision_boxes,
                is_symbol_tile: record.is_symbol_tile(),
            };

            let (actor, rebound) = record.ensure_actor(|| self.pool.acquire(&tile_id));
            if rebound {
                self.metrics.actor_rebound();
                debug!(tile = %tile_id, actor_id = actor.actor_id(), "Tile bound to worker");
            }

            let sequence = record.begin_request();
            let pending = actor.send(JobKind::LoadTile, job);
            record.set_request(pending.handle());
            self.metrics.tile_requested();
            debug!(tile = %tile_id, url = %url, job = %pending.handle().id, "Tile requested");

            (tile_id, sequence, pending)
        };

        let result = pending.await;

        let mut record = tile.lock();
        if record.is_aborted() {
            self.metrics.aborted_result_discarded();
            debug!(tile = %tile_id, "Dropping result for aborted tile");
            return Ok(());
        }
        if !record.is_current(sequence) {
            self.metrics.stale_result_discarded();
            debug!(tile = %tile_id, sequence, "Dropping superseded tile result");
            return Ok(());
        }

        match result {
            Ok(result) => {
                let buckets = result.buckets.len();
                record.complete(result, self.context.refresh_expired_tiles, Utc::now());
                self.metrics.tile_loaded();
                debug!(tile = %tile_id, buckets, "Tile loaded");
                Ok(())
            }
            Err(e) => {
                record.fail_request();
                self.metrics.tile_failed();
                warn!(tile = %tile_id, error = %e, "Tile load failed");
                Err(TileLoadError::Worker {
                    tile: tile_id.to_string(),
                    source: e,
                })
            }
        }
    }

    /// Loads a tile in the background and reports the outcome to `callback`.
    ///
    /// The callback runs exactly once, on a runtime worker thread.
    pub fn spawn_load_tile<F>(&self, tile: SharedTile, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<(), TileLoadError>) + Send + 'static,
    {
        let loader = self.clone();
        tokio::spawn(async move {
            let result = loader.load_tile(&tile).await;
            callback(result);
        })
    }

    /// Loads several tiles concurrently. Results are in input order.
    pub async fn load_tiles(&self, tiles: &[SharedTile]) -> Vec<Result<(), TileLoadError>> {
        join_all(tiles.iter().map(|tile| self.load_tile(tile))).await
    }

    /// Worker pool used by this loader.
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }
}

impl std::fmt::Debug for TileLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileLoader")
            .field("source", &self.config.read().id)
            .field("pool", &self.pool)
            .finish()
    }
}
