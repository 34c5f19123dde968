//! Source lifecycle events and the listener registry.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::index::FetchError;

/// What a `data` event announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceDataType {
    /// Configuration (templates, zoom range, bounds) is available.
    Metadata,
    /// Tiles can be requested.
    Content,
}

impl fmt::Display for SourceDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDataType::Metadata => write!(f, "metadata"),
            SourceDataType::Content => write!(f, "content"),
        }
    }
}

/// An event emitted by a source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// A bootstrap attempt started.
    DataLoading,
    /// Bootstrap succeeded.
    Data(SourceDataType),
    /// Bootstrap failed.
    Error(FetchError),
}

impl SourceEvent {
    /// Event name as seen by listeners keyed on strings.
    pub fn name(&self) -> &'static str {
        match self {
            SourceEvent::DataLoading => "dataloading",
            SourceEvent::Data(_) => "data",
            SourceEvent::Error(_) => "error",
        }
    }
}

impl fmt::Display for SourceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceEvent::Data(kind) => write!(f, "data/{}", kind),
            SourceEvent::Error(e) => write!(f, "error: {}", e),
            other => f.write_str(other.name()),
        }
    }
}

/// Identifies a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A listener callback.
pub type Listener = Arc<dyn Fn(&SourceEvent) + Send + Sync>;

/// Registry of event listeners.
///
/// Listeners run synchronously on the emitting task, in subscription order.
/// A listener may subscribe or unsubscribe while an event is being emitted;
/// the change takes effect from the next event.
#[derive(Default)]
pub struct EventListeners {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SourceEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn emit(&self, event: &SourceEvent) {
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("listeners", &self.len())
            .finish()
    }
}
