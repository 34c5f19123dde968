//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use modeltiles::request::RequestParameters;
use modeltiles::tile::{Bucket, BucketMap};
use modeltiles::transport::{BoxFuture, HttpResponse, HttpTransport, TransportError};
use modeltiles::worker::{JobHandler, JobId, JobKind, WorkerError, WorkerJob, WorkerResult};
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Transport answering from a URL-keyed table; unknown URLs are 404s.
#[derive(Default)]
pub struct TableTransport {
    responses: Mutex<HashMap<String, Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<RequestParameters>>,
}

impl TableTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, response: Result<HttpResponse, TransportError>) {
        self.responses.lock().insert(url.to_string(), response);
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.url.clone()).collect()
    }
}

impl HttpTransport for TableTransport {
    fn get<'a>(
        &'a self,
        request: &'a RequestParameters,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportError>> {
        Box::pin(async move {
            self.requests.lock().push(request.clone());
            self.responses
                .lock()
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| {
                    Err(TransportError::Status {
                        status: 404,
                        url: request.url.clone(),
                    })
                })
        })
    }
}

type Gate = oneshot::Sender<Result<WorkerResult, WorkerError>>;

/// Handler that parks jobs until the test releases them.
#[derive(Default)]
pub struct ParkingHandler {
    parked: Mutex<Vec<(JobId, WorkerJob, Gate)>>,
}

impl ParkingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn parked(&self) -> usize {
        self.parked.lock().len()
    }

    pub async fn wait_for(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.parked() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("jobs were never parked");
    }

    /// Releases the job with the given dispatch rank (0 = oldest parked).
    pub fn release(&self, rank: usize, result: Result<WorkerResult, WorkerError>) -> WorkerJob {
        let mut parked = self.parked.lock();
        parked.sort_by_key(|(id, _, _)| *id);
        let (_, job, gate) = parked.remove(rank);
        let _ = gate.send(result);
        job
    }
}

impl JobHandler for ParkingHandler {
    fn handle(
        &self,
        id: JobId,
        _kind: JobKind,
        job: WorkerJob,
    ) -> BoxFuture<'_, Result<WorkerResult, WorkerError>> {
        let (tx, rx) = oneshot::channel();
        self.parked.lock().push((id, job, tx));
        Box::pin(async move {
            rx.await
                .unwrap_or(Err(WorkerError::Terminated { actor_id: usize::MAX }))
        })
    }
}

/// Worker result with one bucket.
pub fn buckets(layer: &str, data: &[u8]) -> WorkerResult {
    let mut map = BucketMap::new();
    map.insert(layer.to_string(), Bucket::new(layer, data.to_vec()));
    WorkerResult {
        buckets: map,
        ..Default::default()
    }
}

/// Awaits a spawned task with a timeout.
pub async fn finish<T>(handle: tokio::task::JoinHandle<T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("task timed out")
        .expect("task panicked")
}
