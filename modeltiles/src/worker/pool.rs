//! Worker pool and actor loop.
//!
//! The pool owns a fixed number of worker slots. Each slot runs one actor
//! task that receives [`Envelope`]s over an unbounded channel and drives
//! every job it receives concurrently on a [`JoinSet`].
//!
//! ```text
//!   ActorBinding::send ──► mpsc ──► run_worker ──► JoinSet ──► JobHandler
//!          ▲                                                     │
//!          └──────────────── oneshot reply ◄─────────────────────┘
//! ```
//!
//! Tiles are pinned to a slot by hashing their identity, so repeated loads
//! of the same tile land on the same worker.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::actor::{ActorBinding, Envelope, WorkerSlot};
use super::handler::JobHandler;
use crate::coord::OverscaledTileId;

// =============================================================================
// Configuration
// =============================================================================

/// Upper bound on the default worker count.
pub const MAX_DEFAULT_WORKERS: usize = 8;

/// Configuration for the worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Number of worker actors.
    pub workers: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .clamp(1, MAX_DEFAULT_WORKERS);
        Self { workers }
    }
}

impl WorkerPoolConfig {
    /// Sets the worker count. Zero is raised to one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

// =============================================================================
// Pool
// =============================================================================

/// Fixed-size pool of worker actors.
///
/// Must be created inside a tokio runtime.
pub struct WorkerPool {
    slots: Vec<Arc<WorkerSlot>>,
    handler: Arc<dyn JobHandler>,
    job_ids: Arc<AtomicU64>,
    shutdown: CancellationToken,
}

impl WorkerPool {
    /// Starts `config.workers` actors running `handler`.
    pub fn new(config: WorkerPoolConfig, handler: Arc<dyn JobHandler>) -> Self {
        let shutdown = CancellationToken::new();
        let slots = (0..config.workers.max(1))
            .map(|id| {
                let (tx, task) = spawn_worker(id, Arc::clone(&handler), shutdown.child_token());
                Arc::new(WorkerSlot::new(id, tx, task))
            })
            .collect::<Vec<_>>();
        info!(workers = slots.len(), "Worker pool started");

        Self {
            slots,
            handler,
            job_ids: Arc::new(AtomicU64::new(0)),
            shutdown,
        }
    }

    /// Number of worker actors.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; a pool has at least one worker.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Binds a tile to its worker.
    pub fn acquire(&self, tile: &OverscaledTileId) -> ActorBinding {
        let mut hasher = DefaultHasher::new();
        tile.hash(&mut hasher);
        let index = (hasher.finish() % self.slots.len() as u64) as usize;
        ActorBinding::new(Arc::clone(&self.slots[index]), Arc::clone(&self.job_ids))
    }

    /// Replaces the actor in a slot.
    ///
    /// Jobs queued on or running in the old actor resolve with
    /// [`WorkerError::Terminated`](super::WorkerError::Terminated) and every
    /// binding made before the restart reports itself expired.
    pub fn restart(&self, actor_id: usize) -> bool {
        let Some(slot) = self.slots.get(actor_id) else {
            return false;
        };

        let (tx, task) = spawn_worker(
            actor_id,
            Arc::clone(&self.handler),
            self.shutdown.child_token(),
        );
        *slot.sender.lock() = tx;
        slot.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(old) = slot.task.lock().replace(task) {
            old.abort();
        }
        debug!(actor_id, "Worker restarted");
        true
    }

    /// Stops every actor. Outstanding jobs resolve as terminated.
    pub fn shutdown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();
        for slot in &self.slots {
            if let Some(task) = slot.task.lock().take() {
                task.abort();
            }
        }
        info!("Worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.slots.len())
            .field("jobs_dispatched", &self.job_ids.load(Ordering::Relaxed))
            .finish()
    }
}

fn spawn_worker(
    id: usize,
    handler: Arc<dyn JobHandler>,
    shutdown: CancellationToken,
) -> (mpsc::UnboundedSender<Envelope>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_worker(id, rx, handler, shutdown));
    (tx, task)
}

/// Actor loop. Dropping the task drops every pending reply sender, which the
/// caller observes as a terminated job.
async fn run_worker(
    id: usize,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    handler: Arc<dyn JobHandler>,
    shutdown: CancellationToken,
) {
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let handler = Arc::clone(&handler);
                in_flight.spawn(async move {
                    let Envelope { id: job_id, kind, job, reply } = envelope;
                    let result = handler.handle(job_id, kind, job).await;
                    // Receiver may be gone if the tile was dropped
                    let _ = reply.send(result);
                });
            }

            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        warn!(actor_id = id, "Job panicked in worker");
                    }
                }
            }
        }
    }

    in_flight.abort_all();
    debug!(actor_id = id, "Worker stopped");
}
