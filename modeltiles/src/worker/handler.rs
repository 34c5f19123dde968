//! Job handlers executed inside worker actors.
//!
//! [`FetchDecodeHandler`] is the production handler: it fetches the tile
//! payload through an [`HttpTransport`] and hands the body to a
//! [`TileDecoder`] on the blocking thread pool.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, instrument};

use super::job::{JobId, JobKind, ResourceTiming, WorkerError, WorkerJob, WorkerResult};
use crate::tile::{Bucket, BucketMap};
use crate::transport::{BoxFuture, HttpTransport};

/// Bucket name used by [`RawPayloadDecoder`].
pub const DEFAULT_BUCKET_NAME: &str = "model";

/// Work performed by a worker for each job.
pub trait JobHandler: Send + Sync + 'static {
    /// Runs one job to completion.
    fn handle(
        &self,
        id: JobId,
        kind: JobKind,
        job: WorkerJob,
    ) -> BoxFuture<'_, Result<WorkerResult, WorkerError>>;
}

/// Turns a fetched payload into buckets.
///
/// Called on a blocking thread; implementations may do CPU-heavy work.
pub trait TileDecoder: Send + Sync + 'static {
    /// Decodes the payload of `job`.
    fn decode(&self, job: &WorkerJob, payload: Bytes) -> Result<BucketMap, WorkerError>;
}

/// Decoder that stores the payload as a single opaque bucket.
#[derive(Debug, Clone)]
pub struct RawPayloadDecoder {
    bucket: String,
}

impl RawPayloadDecoder {
    /// Creates a decoder writing to [`DEFAULT_BUCKET_NAME`].
    pub fn new() -> Self {
        Self {
            bucket: DEFAULT_BUCKET_NAME.to_string(),
        }
    }

    /// Uses a custom bucket name.
    pub fn with_bucket(mut self, name: impl Into<String>) -> Self {
        self.bucket = name.into();
        self
    }
}

impl Default for RawPayloadDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TileDecoder for RawPayloadDecoder {
    fn decode(&self, _job: &WorkerJob, payload: Bytes) -> Result<BucketMap, WorkerError> {
        let mut buckets = BucketMap::new();
        if !payload.is_empty() {
            buckets.insert(self.bucket.clone(), Bucket::new(self.bucket.clone(), payload));
        }
        Ok(buckets)
    }
}

/// Fetches a tile over HTTP and decodes it.
pub struct FetchDecodeHandler {
    transport: Arc<dyn HttpTransport>,
    decoder: Arc<dyn TileDecoder>,
}

impl FetchDecodeHandler {
    /// Creates a handler that stores raw payloads.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            decoder: Arc::new(RawPayloadDecoder::new()),
        }
    }

    /// Replaces the decoder.
    pub fn with_decoder(mut self, decoder: Arc<dyn TileDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    #[instrument(level = "debug", skip(self, job), fields(tile = %job.tile_id))]
    async fn load_tile(&self, id: JobId, job: WorkerJob) -> Result<WorkerResult, WorkerError> {
        let started_at = Utc::now();
        let started = Instant::now();
        let response = self.transport.get(&job.request).await?;

        let resource_timing = job.request.collect_resource_timing.then(|| {
            vec![ResourceTiming {
                name: job.request.url.clone(),
                start_time: started_at,
                duration: started.elapsed(),
                transfer_size: response.body.len() as u64,
            }]
        });

        let tile_id = job.tile_id;
        let decoder = Arc::clone(&self.decoder);
        let body = response.body;
        let buckets = tokio::task::spawn_blocking(move || decoder.decode(&job, body))
            .await
            .map_err(|e| WorkerError::decode(&tile_id, format!("decoder task failed: {}", e)))??;

        debug!(job = %id, buckets = buckets.len(), "Tile decoded");
        Ok(WorkerResult {
            buckets,
            resource_timing,
            cache_control: response.cache_control,
            expires: response.expires,
        })
    }
}

impl JobHandler for FetchDecodeHandler {
    fn handle(
        &self,
        id: JobId,
        kind: JobKind,
        job: WorkerJob,
    ) -> BoxFuture<'_, Result<WorkerResult, WorkerError>> {
        match kind {
            JobKind::LoadTile => Box::pin(self.load_tile(id, job)),
        }
    }
}

impl std::fmt::Debug for FetchDecodeHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchDecodeHandler").finish_non_exhaustive()
    }
}
