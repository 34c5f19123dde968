//! Actor bindings: the capability a tile uses to reach its worker.
//!
//! A binding is tied to one worker slot *and* one generation of that slot.
//! Restarting the worker bumps the generation, so every binding handed out
//! before the restart reports itself expired and the owner rebinds.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::trace;

use super::job::{JobHandle, JobId, JobKind, WorkerError, WorkerJob, WorkerResult};

/// A job in transit to a worker.
pub(crate) struct Envelope {
    pub id: JobId,
    pub kind: JobKind,
    pub job: WorkerJob,
    pub reply: oneshot::Sender<Result<WorkerResult, WorkerError>>,
}

/// One worker position in the pool.
pub(crate) struct WorkerSlot {
    pub id: usize,
    pub generation: AtomicU64,
    pub sender: Mutex<mpsc::UnboundedSender<Envelope>>,
    pub task: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerSlot {
    pub fn new(id: usize, sender: mpsc::UnboundedSender<Envelope>, task: JoinHandle<()>) -> Self {
        Self {
            id,
            generation: AtomicU64::new(0),
            sender: Mutex::new(sender),
            task: Mutex::new(Some(task)),
        }
    }
}

/// Binding of a tile to a worker actor.
#[derive(Clone)]
pub struct ActorBinding {
    slot: Arc<WorkerSlot>,
    generation: u64,
    sender: mpsc::UnboundedSender<Envelope>,
    job_ids: Arc<AtomicU64>,
}

impl ActorBinding {
    pub(crate) fn new(slot: Arc<WorkerSlot>, job_ids: Arc<AtomicU64>) -> Self {
        let generation = slot.generation.load(Ordering::Acquire);
        let sender = slot.sender.lock().clone();
        Self {
            slot,
            generation,
            sender,
            job_ids,
        }
    }

    /// Worker slot this binding points at.
    pub fn actor_id(&self) -> usize {
        self.slot.id
    }

    /// Slot generation the binding was made against.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true once the worker behind this binding has been replaced or stopped.
    pub fn is_expired(&self) -> bool {
        self.slot.generation.load(Ordering::Acquire) != self.generation || self.sender.is_closed()
    }

    /// Sends a job. The returned future resolves exactly once.
    ///
    /// If the worker is gone the job resolves with [`WorkerError::Terminated`].
    pub fn send(&self, kind: JobKind, job: WorkerJob) -> PendingJob {
        let id = JobId(self.job_ids.fetch_add(1, Ordering::Relaxed) + 1);
        let actor_id = self.actor_id();
        let (reply, rx) = oneshot::channel();
        trace!(job = %id, actor_id, %kind, tile = %job.tile_id, "Dispatching job");

        let envelope = Envelope {
            id,
            kind,
            job,
            reply,
        };
        if let Err(mpsc::error::SendError(envelope)) = self.sender.send(envelope) {
            let _ = envelope.reply.send(Err(WorkerError::Terminated { actor_id }));
        }

        PendingJob {
            handle: JobHandle { id, actor_id },
            rx,
        }
    }
}

impl fmt::Debug for ActorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorBinding")
            .field("actor_id", &self.slot.id)
            .field("generation", &self.generation)
            .field("expired", &self.is_expired())
            .finish()
    }
}

/// Outcome of a dispatched job.
pub struct PendingJob {
    handle: JobHandle,
    rx: oneshot::Receiver<Result<WorkerResult, WorkerError>>,
}

impl PendingJob {
    /// Handle identifying the job.
    pub fn handle(&self) -> JobHandle {
        self.handle
    }
}

impl Future for PendingJob {
    type Output = Result<WorkerResult, WorkerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let actor_id = self.handle.actor_id;
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(WorkerError::Terminated { actor_id })))
    }
}

impl fmt::Debug for PendingJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingJob")
            .field("handle", &self.handle)
            .finish()
    }
}
