//! ModelTiles - tile source lifecycle and loading pipeline for tiled 3D models
//!
//! This library discovers a remote tile index, tracks the source's load
//! state, and loads individual tiles on demand through a pool of worker
//! actors, applying decoded results back onto renderer-owned tile records.
//!
//! # Architecture
//!
//! ```text
//! TiledModelSource ──► IndexBootstrapper ──► HttpTransport
//!        │                                        ▲
//!        └──────► TileLoader ──► WorkerPool ──► FetchDecodeHandler
//!                     │
//!                     └──► TileRecord (buckets, expiry, state)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use modeltiles::prelude::*;
//!
//! let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);
//! let handler = Arc::new(FetchDecodeHandler::new(Arc::clone(&transport)));
//! let pool = Arc::new(WorkerPool::new(WorkerPoolConfig::default(), handler));
//!
//! let options = SourceOptions::from_url("https://example.com/buildings.json");
//! let source = TiledModelSource::new("buildings", options, transport, pool);
//! source.on_add(MapContext::default()).await?;
//!
//! let tile = TileRecord::new(OverscaledTileId::new(16, 0, 16, 34_938, 22_814)?).into_shared();
//! source.load_tile(&tile).await?;
//! ```

pub mod bounds;
pub mod config;
pub mod coord;
pub mod index;
pub mod loader;
pub mod logging;
pub mod request;
pub mod source;
pub mod telemetry;
pub mod tile;
pub mod transport;
pub mod worker;

/// Commonly used types.
pub mod prelude {
    pub use crate::bounds::{LngLatBounds, TileBounds};
    pub use crate::coord::{CanonicalTileId, OverscaledTileId, Scheme};
    pub use crate::index::{FetchError, IndexDocument};
    pub use crate::loader::{TileLoadError, TileLoader};
    pub use crate::request::{DefaultRequestManager, RequestManager, ResourceKind};
    pub use crate::source::{
        MapContext, SourceConfig, SourceDataType, SourceEvent, SourceOptions, TiledModelSource,
    };
    pub use crate::tile::{SharedTile, TileRecord, TileState};
    pub use crate::transport::{HttpTransport, ReqwestTransport};
    pub use crate::worker::{FetchDecodeHandler, WorkerPool, WorkerPoolConfig};
}
