//! Per-tile load state.
//!
//! A [`TileRecord`] is owned by the renderer and shared with the loader as a
//! [`SharedTile`]. The loader only holds the lock for short, synchronous
//! sections; it never awaits while holding it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::bucket::{merge_buckets, BucketMap};
use super::expiry::ExpiryData;
use crate::coord::OverscaledTileId;
use crate::worker::{ActorBinding, JobHandle, ResourceTiming, WorkerResult};

static NEXT_TILE_UID: AtomicU64 = AtomicU64::new(1);

/// Process-unique tile identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileUid(pub u64);

impl TileUid {
    /// Allocates the next identifier.
    pub fn next() -> Self {
        Self(NEXT_TILE_UID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TileUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Load state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileState {
    /// Never requested.
    #[default]
    Unloaded,
    /// A request is in flight.
    Loading,
    /// Content is available.
    Loaded,
    /// The last request failed.
    Errored,
    /// Content is stale and should be reloaded.
    Expired,
}

impl fmt::Display for TileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TileState::Unloaded => "unloaded",
            TileState::Loading => "loading",
            TileState::Loaded => "loaded",
            TileState::Errored => "errored",
            TileState::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// A tile shared between the renderer and the loader.
pub type SharedTile = Arc<Mutex<TileRecord>>;

/// Load state and content of one tile.
#[derive(Debug)]
pub struct TileRecord {
    uid: TileUid,
    tile_id: OverscaledTileId,
    tile_zoom: u8,
    is_symbol_tile: bool,
    state: TileState,
    aborted: bool,
    actor: Option<ActorBinding>,
    request: Option<JobHandle>,
    sequence: u64,
    buckets: BucketMap,
    expiry: ExpiryData,
    resource_timing: Option<Vec<ResourceTiming>>,
}

impl TileRecord {
    /// Creates an unloaded tile. The requested zoom defaults to the render zoom.
    pub fn new(tile_id: OverscaledTileId) -> Self {
        Self {
            uid: TileUid::next(),
            tile_id,
            tile_zoom: tile_id.overscaled_z,
            is_symbol_tile: false,
            state: TileState::Unloaded,
            aborted: false,
            actor: None,
            request: None,
            sequence: 0,
            buckets: BucketMap::new(),
            expiry: ExpiryData::default(),
            resource_timing: None,
        }
    }

    /// Sets the zoom the tile is requested for.
    pub fn with_tile_zoom(mut self, tile_zoom: u8) -> Self {
        self.tile_zoom = tile_zoom;
        self
    }

    /// Marks the tile as feeding symbol placement.
    pub fn with_symbol_tile(mut self, is_symbol_tile: bool) -> Self {
        self.is_symbol_tile = is_symbol_tile;
        self
    }

    /// Wraps the record for sharing with the loader.
    pub fn into_shared(self) -> SharedTile {
        Arc::new(Mutex::new(self))
    }

    pub fn uid(&self) -> TileUid {
        self.uid
    }

    pub fn tile_id(&self) -> OverscaledTileId {
        self.tile_id
    }

    pub fn tile_zoom(&self) -> u8 {
        self.tile_zoom
    }

    pub fn is_symbol_tile(&self) -> bool {
        self.is_symbol_tile
    }

    pub fn state(&self) -> TileState {
        self.state
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Handle of the newest job dispatched for this tile.
    pub fn request(&self) -> Option<JobHandle> {
        self.request
    }

    /// Worker the tile is bound to.
    pub fn actor(&self) -> Option<&ActorBinding> {
        self.actor.as_ref()
    }

    pub fn buckets(&self) -> &BucketMap {
        &self.buckets
    }

    pub fn expiry(&self) -> &ExpiryData {
        &self.expiry
    }

    pub fn resource_timing(&self) -> Option<&[ResourceTiming]> {
        self.resource_timing.as_deref()
    }

    /// Abandons the tile. Results that arrive afterwards are dropped.
    pub fn abort(&mut self) {
        self.aborted = true;
        self.request = None;
    }

    /// Flags the content as stale. The next load rebinds the worker.
    pub fn mark_expired(&mut self) {
        self.state = TileState::Expired;
    }

    /// Delay until the tile should be refreshed.
    pub fn expiry_timeout(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expiry.timeout(now)
    }

    /// Merges buckets into the tile.
    pub fn merge_buckets(&mut self, incoming: BucketMap) {
        merge_buckets(&mut self.buckets, incoming);
    }

    /// Applies response cache headers. Returns true if the content is expired.
    pub fn set_expiry_data(
        &mut self,
        cache_control: Option<&str>,
        expires: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        let expired = self.expiry.apply(cache_control, expires, now);
        if expired {
            self.state = TileState::Expired;
        }
        expired
    }

    pub(crate) fn needs_actor(&self) -> bool {
        match &self.actor {
            None => true,
            Some(actor) => self.state == TileState::Expired || actor.is_expired(),
        }
    }

    /// Returns the bound actor, binding a fresh one first if needed.
    ///
    /// The flag is true when `acquire` was called.
    pub(crate) fn ensure_actor<F>(&mut self, acquire: F) -> (ActorBinding, bool)
    where
        F: FnOnce() -> ActorBinding,
    {
        if !self.needs_actor() {
            if let Some(actor) = &self.actor {
                return (actor.clone(), false);
            }
        }
        let actor = acquire();
        self.actor = Some(actor.clone());
        (actor, true)
    }

    /// Starts a new request and returns its sequence number.
    pub(crate) fn begin_request(&mut self) -> u64 {
        self.sequence += 1;
        self.state = TileState::Loading;
        self.sequence
    }

    pub(crate) fn set_request(&mut self, handle: JobHandle) {
        self.request = Some(handle);
    }

    /// Returns true if `sequence` belongs to the newest request.
    pub(crate) fn is_current(&self, sequence: u64) -> bool {
        self.sequence == sequence
    }

    /// Records a failed request. Existing buckets are kept.
    pub(crate) fn fail_request(&mut self) {
        self.state = TileState::Errored;
        self.request = None;
    }

    /// Applies a successful result.
    pub(crate) fn complete(&mut self, result: WorkerResult, track_expiry: bool, now: DateTime<Utc>) {
        let WorkerResult {
            buckets,
            resource_timing,
            cache_control,
            expires,
        } = result;

        if resource_timing.is_some() {
            self.resource_timing = resource_timing;
        }
        if track_expiry {
            self.set_expiry_data(cache_control.as_deref(), expires.as_deref(), now);
        }
        self.merge_buckets(buckets);
        self.state = TileState::Loaded;
        self.request = None;
    }
}
