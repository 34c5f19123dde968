//! Tiled 3D-model source.
//!
//! Ties the pieces together: [`TiledModelSource`] bootstraps its index
//! document when added to a map, reconciles it into a [`SourceConfig`],
//! builds the bounds filter and then serves tile loads through a
//! [`TileLoader`](crate::loader::TileLoader).
//!
//! # Lifecycle
//!
//! ```text
//!  Unattached ──on_add──► Bootstrapping ──ok──► Ready
//!                              │
//!                              └──err──► ReadyWithError
//! ```
//!
//! `on_remove()` returns any state to `Unattached`; a bootstrap still in
//! flight at that point is dropped without further events.
//!
//! `is_loaded()` turns true when the first bootstrap settles, whatever the
//! outcome, and stays true.

mod config;
mod context;
mod events;
mod lifecycle;

pub use config::{
    SourceConfig, SourceOptions, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, SOURCE_TYPE, TILE_SIZE,
};
pub use context::MapContext;
pub use events::{EventListeners, Listener, ListenerId, SourceDataType, SourceEvent};
pub use lifecycle::{LifecycleState, TiledModelSource};
