//! Worker gateway.
//!
//! Tile decoding runs in a pool of worker actors. A tile obtains an
//! [`ActorBinding`] from the [`WorkerPool`], sends a [`WorkerJob`] through it,
//! and receives exactly one result per dispatched job.
//!
//! # Example
//!
//! ```ignore
//! use modeltiles::worker::{FetchDecodeHandler, JobKind, WorkerPool, WorkerPoolConfig};
//!
//! let handler = Arc::new(FetchDecodeHandler::new(transport));
//! let pool = WorkerPool::new(WorkerPoolConfig::default(), handler);
//!
//! let actor = pool.acquire(&tile_id);
//! let pending = actor.send(JobKind::LoadTile, job);
//! let handle = pending.handle();
//! let result = pending.await?;
//! ```

mod actor;
mod handler;
mod job;
mod pool;

pub use actor::{ActorBinding, PendingJob};
pub use handler::{FetchDecodeHandler, JobHandler, RawPayloadDecoder, TileDecoder, DEFAULT_BUCKET_NAME};
pub use job::{JobHandle, JobId, JobKind, ResourceTiming, WorkerError, WorkerJob, WorkerResult};
pub use pool::{WorkerPool, WorkerPoolConfig, MAX_DEFAULT_WORKERS};
