//! The tiled 3D-model source.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::config::{SourceConfig, SourceOptions, SOURCE_TYPE};
use super::context::MapContext;
use super::events::{EventListeners, SourceDataType, SourceEvent};
use crate::bounds::TileBounds;
use crate::coord::CanonicalTileId;
use crate::index::{FetchError, FetchErrorKind, IndexBootstrapper};
use crate::loader::{TileLoadError, TileLoader};
use crate::telemetry::SourceMetrics;
use crate::tile::SharedTile;
use crate::transport::HttpTransport;
use crate::worker::WorkerPool;

/// Lifecycle of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// Not added to a map.
    #[default]
    Unattached,
    /// Waiting for the index document.
    Bootstrapping,
    /// Index document applied.
    Ready,
    /// The last bootstrap failed; no tiles can be resolved.
    ReadyWithError,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Unattached => "unattached",
            LifecycleState::Bootstrapping => "bootstrapping",
            LifecycleState::Ready => "ready",
            LifecycleState::ReadyWithError => "ready-with-error",
        };
        f.write_str(name)
    }
}

/// A tile source serving batched 3D models.
///
/// # Example
///
/// ```ignore
/// use modeltiles::source::{MapContext, SourceOptions, TiledModelSource};
///
/// let source = TiledModelSource::new("buildings", options, transport, pool);
/// source.events().subscribe(|event| println!("{}", event));
/// source.on_add(MapContext::default()).await?;
///
/// let tile = TileRecord::new(tile_id).into_shared();
/// source.load_tile(&tile).await?;
/// ```
pub struct TiledModelSource {
    options: SourceOptions,
    config: Arc<RwLock<SourceConfig>>,
    pool: Arc<WorkerPool>,
    bootstrapper: IndexBootstrapper,
    context: RwLock<Option<MapContext>>,
    loader: RwLock<Option<TileLoader>>,
    tile_bounds: RwLock<Option<TileBounds>>,
    state: Mutex<LifecycleState>,
    loaded: AtomicBool,
    /// Bumped on every attach and detach.
    attach_epoch: AtomicU64,
    events: EventListeners,
    metrics: Arc<SourceMetrics>,
}

impl TiledModelSource {
    /// Creates an unattached source.
    pub fn new(
        id: impl Into<String>,
        options: SourceOptions,
        transport: Arc<dyn HttpTransport>,
        pool: Arc<WorkerPool>,
    ) -> Self {
        let config = SourceConfig::new(id, &options);
        Self {
            options,
            config: Arc::new(RwLock::new(config)),
            pool,
            bootstrapper: IndexBootstrapper::new(transport),
            context: RwLock::new(None),
            loader: RwLock::new(None),
            tile_bounds: RwLock::new(None),
            state: Mutex::new(LifecycleState::Unattached),
            loaded: AtomicBool::new(false),
            attach_epoch: AtomicU64::new(0),
            events: EventListeners::new(),
            metrics: Arc::new(SourceMetrics::new()),
        }
    }

    /// Attaches the source to a map and bootstraps it.
    pub async fn on_add(&self, context: MapContext) -> Result<(), FetchError> {
        let loader = TileLoader::new(
            Arc::clone(&self.config),
            context.clone(),
            Arc::clone(&self.pool),
            Arc::clone(&self.metrics),
        );
        *self.loader.write() = Some(loader);
        *self.context.write() = Some(context);
        self.attach_epoch.fetch_add(1, Ordering::AcqRel);
        self.load().await
    }

    /// Runs an index bootstrap.
    ///
    /// Emits `dataloading`, then either `data/metadata` and `data/content`,
    /// or `error`. A bootstrap superseded by a newer one, or outlived by
    /// the attachment it started under, returns `Ok(())` and emits nothing
    /// further.
    pub async fn load(&self) -> Result<(), FetchError> {
        let epoch = self.attach_epoch.load(Ordering::Acquire);
        let Some(context) = self.context.read().clone() else {
            return Err(FetchErrorKind::Detached.into());
        };
        let id = self.id();

        *self.state.lock() = LifecycleState::Bootstrapping;
        self.metrics.bootstrap_started();
        info!(source = %id, "Loading source index");
        self.events.emit(&SourceEvent::DataLoading);
        if !self.still_attached(epoch) {
            debug!(source = %id, "Source detached before index bootstrap");
            return Ok(());
        }

        let language = context.language_param();
        let worldview = context.worldview.clone();
        let request = self.bootstrapper.begin(
            &self.options,
            Arc::clone(&context.requests),
            language.as_deref(),
            worldview.as_deref(),
        );

        let Some(result) = request.settled().await else {
            debug!(source = %id, "Index bootstrap superseded");
            return Ok(());
        };
        if !self.still_attached(epoch) {
            debug!(source = %id, "Dropping index bootstrap for a detached source");
            return Ok(());
        }
        self.loaded.store(true, Ordering::Release);

        match result {
            Ok(document) => {
                {
                    let mut config = self.config.write();
                    config.reconcile(&document);
                    // Bounds are fixed once known; the zoom range follows the latest document.
                    *self.tile_bounds.write() = config.bounds.map(|bounds| {
                        TileBounds::new(&bounds.to_array(), config.min_zoom, config.max_zoom)
                    });
                }
                *self.state.lock() = LifecycleState::Ready;
                info!(source = %id, "Source ready");
                self.events.emit(&SourceEvent::Data(SourceDataType::Metadata));
                self.events.emit(&SourceEvent::Data(SourceDataType::Content));
                Ok(())
            }
            Err(err) => {
                let err = with_hint_diagnostics(err, language.as_deref(), worldview.as_deref());
                self.metrics.bootstrap_failed();
                *self.state.lock() = LifecycleState::ReadyWithError;
                warn!(source = %id, error = %err, "Source index failed to load");
                self.events.emit(&SourceEvent::Error(err.clone()));
                Err(err)
            }
        }
    }

    /// Detaches the source. An outstanding bootstrap is cancelled.
    pub fn on_remove(&self) {
        self.bootstrapper.cancel();
        *self.loader.write() = None;
        *self.context.write() = None;
        self.attach_epoch.fetch_add(1, Ordering::AcqRel);
        *self.state.lock() = LifecycleState::Unattached;
        debug!(source = %self.id(), "Source removed");
    }

    fn still_attached(&self, epoch: u64) -> bool {
        self.attach_epoch.load(Ordering::Acquire) == epoch && self.context.read().is_some()
    }

    /// True once a bootstrap attempt has settled, successfully or not.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// This source kind has no animated transitions.
    pub fn has_transition(&self) -> bool {
        false
    }

    /// Minimal descriptor for persistence and debugging.
    pub fn serialize(&self) -> Value {
        json!({ "type": SOURCE_TYPE })
    }

    pub fn id(&self) -> String {
        self.config.read().id.clone()
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> SourceConfig {
        self.config.read().clone()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    /// Bounds filter, if the index document declared bounds.
    pub fn tile_bounds(&self) -> Option<TileBounds> {
        self.tile_bounds.read().clone()
    }

    /// Returns true if the tile is in scope: within the zoom range and,
    /// when bounds are known, intersecting them.
    pub fn has_tile(&self, tile: &CanonicalTileId) -> bool {
        if let Some(bounds) = self.tile_bounds.read().as_ref() {
            return bounds.contains(tile);
        }
        let config = self.config.read();
        (config.min_zoom..=config.max_zoom).contains(&tile.z)
    }

    /// Loads a tile through the worker pool.
    pub async fn load_tile(&self, tile: &SharedTile) -> Result<(), TileLoadError> {
        let loader = self.loader().ok_or(TileLoadError::NotAttached)?;
        loader.load_tile(tile).await
    }

    /// Loader bound to the current map, if attached.
    pub fn loader(&self) -> Option<TileLoader> {
        self.loader.read().clone()
    }

    pub fn events(&self) -> &EventListeners {
        &self.events
    }

    pub fn metrics(&self) -> &Arc<SourceMetrics> {
        &self.metrics
    }
}

impl fmt::Debug for TiledModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiledModelSource")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

fn with_hint_diagnostics(
    mut err: FetchError,
    language: Option<&str>,
    worldview: Option<&str>,
) -> FetchError {
    if let Some(language) = language {
        let message = format!(
            "Ensure that your requested language string is a valid BCP-47 code or list of codes. Found: {}",
            language
        );
        warn!("{}", message);
        err = err.with_diagnostic(message);
    }
    if let Some(worldview) = worldview.filter(|w| w.chars().count() != 2) {
        let message = format!(
            "Requested worldview strings must be a valid ISO alpha-2 code. Found: {}",
            worldview
        );
        warn!("{}", message);
        err = err.with_diagnostic(message);
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::DefaultRequestManager;
    use crate::transport::tests::MockTransport;
    use crate::transport::HttpResponse;
    use crate::worker::tests::GatedHandler;
    use crate::worker::WorkerPoolConfig;

    const INDEX_URL: &str = "https://example/tiles.json";

    fn source(options: SourceOptions, transport: Arc<MockTransport>) -> TiledModelSource {
        let pool = Arc::new(WorkerPool::new(
            WorkerPoolConfig::default().with_workers(1),
            Arc::new(GatedHandler::new()),
        ));
        TiledModelSource::new("models", options, transport, pool)
    }

    fn recorder(source: &TiledModelSource) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        source
            .events()
            .subscribe(move |event| sink.lock().push(event.name().to_string()));
        seen
    }

    #[test]
    fn test_static_queries() {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let _guard = rt.enter();
        let source = source(SourceOptions::default(), Arc::new(MockTransport::new()));
        assert!(!source.is_loaded());
        assert!(!source.has_transition());
        assert_eq!(source.serialize(), json!({"type": "batched-model"}));
        assert_eq!(source.state(), LifecycleState::Unattached);
    }

    #[tokio::test]
    async fn test_load_before_add_is_detached() {
        let source = source(SourceOptions::default(), Arc::new(MockTransport::new()));
        let err = source.load().await.unwrap_err();
        assert_eq!(err.kind(), &FetchErrorKind::Detached);
        assert!(!source.is_loaded());
    }

    #[tokio::test]
    async fn test_bounds_from_index_document() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            INDEX_URL,
            Ok(HttpResponse::new(
                br#"{"tiles":["https://t/{z}/{x}/{y}"],"bounds":[0,0,10,10],"minzoom":2,"maxzoom":16}"#
                    .to_vec(),
            )),
        );
        let source = source(SourceOptions::from_url(INDEX_URL), transport);
        source.on_add(MapContext::default()).await.unwrap();

        assert_eq!(source.state(), LifecycleState::Ready);
        let bounds = source.tile_bounds().unwrap();
        assert_eq!(bounds.zoom_range(), (2, 16));

        // z=1 is below minzoom
        assert!(!source.has_tile(&CanonicalTileId::new(1, 1, 0).unwrap()));
        // Eastern hemisphere, north of the equator
        assert!(source.has_tile(&CanonicalTileId::new(4, 8, 7).unwrap()));
        // Western hemisphere
        assert!(!source.has_tile(&CanonicalTileId::new(4, 2, 7).unwrap()));
    }

    #[tokio::test]
    async fn test_reload_rebuilds_bounds_zoom_range() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            INDEX_URL,
            Ok(HttpResponse::new(
                br#"{"tiles":["https://t/{z}/{x}/{y}"],"bounds":[-180,-85,180,85],"minzoom":2,"maxzoom":10}"#
                    .to_vec(),
            )),
        );
        let source = source(SourceOptions::from_url(INDEX_URL), transport.clone());
        source.on_add(MapContext::default()).await.unwrap();
        let deep = CanonicalTileId::new(12, 0, 2047).unwrap();
        assert!(!source.has_tile(&deep));

        transport.respond(
            INDEX_URL,
            Ok(HttpResponse::new(
                br#"{"tiles":["https://t/{z}/{x}/{y}"],"bounds":[0,0,10,10],"minzoom":2,"maxzoom":14}"#
                    .to_vec(),
            )),
        );
        source.load().await.unwrap();

        let bounds = source.tile_bounds().unwrap();
        assert_eq!(bounds.zoom_range(), (2, 14));
        assert_eq!(source.config().max_zoom, 14);
        // The first document's bounds still apply
        assert!(source.has_tile(&deep));
    }

    #[tokio::test]
    async fn test_remove_from_dataloading_listener_drops_bootstrap() {
        let source = Arc::new(source(
            SourceOptions::from_tiles(["https://t/{z}/{x}/{y}"]),
            Arc::new(MockTransport::new()),
        ));
        let seen = recorder(&source);
        let weak = Arc::downgrade(&source);
        source.events().subscribe(move |event| {
            if matches!(event, SourceEvent::DataLoading) {
                if let Some(source) = weak.upgrade() {
                    source.on_remove();
                }
            }
        });

        source.on_add(MapContext::default()).await.unwrap();

        assert_eq!(source.state(), LifecycleState::Unattached);
        assert!(!source.is_loaded());
        assert!(source.loader().is_none());
        assert_eq!(*seen.lock(), vec!["dataloading"]);
    }

    #[tokio::test]
    async fn test_remove_after_ready_is_unattached() {
        let source = source(
            SourceOptions::from_tiles(["https://t/{z}/{x}/{y}"]),
            Arc::new(MockTransport::new()),
        );
        source.on_add(MapContext::default()).await.unwrap();
        assert_eq!(source.state(), LifecycleState::Ready);

        source.on_remove();
        assert_eq!(source.state(), LifecycleState::Unattached);
        assert!(source.is_loaded());
        assert_eq!(source.load().await.unwrap_err().kind(), &FetchErrorKind::Detached);
    }

    #[tokio::test]
    async fn test_has_tile_without_bounds_uses_zoom_range() {
        let options = SourceOptions::from_tiles(["https://t/{z}/{x}/{y}"]).with_zoom_range(3, 10);
        let source = source(options, Arc::new(MockTransport::new()));
        source.on_add(MapContext::default()).await.unwrap();

        assert!(source.tile_bounds().is_none());
        assert!(source.has_tile(&CanonicalTileId::new(3, 0, 0).unwrap()));
        assert!(!source.has_tile(&CanonicalTileId::new(11, 0, 0).unwrap()));
    }

    #[tokio::test]
    async fn test_failed_bootstrap_attaches_hint_diagnostics() {
        let source = source(SourceOptions::from_url(INDEX_URL), Arc::new(MockTransport::new()));
        let seen = recorder(&source);
        let context = MapContext::new(Arc::new(DefaultRequestManager::new()))
            .with_language(["en-US"])
            .with_worldview("USA");

        let err = source.on_add(context).await.unwrap_err();

        assert!(source.is_loaded());
        assert_eq!(source.state(), LifecycleState::ReadyWithError);
        assert_eq!(err.diagnostics().len(), 2);
        assert!(err.diagnostics()[0].contains("Found: en-US"));
        assert!(err.diagnostics()[1].contains("Found: USA"));
        assert_eq!(*seen.lock(), vec!["dataloading", "error"]);
        assert_eq!(source.metrics().snapshot().bootstraps_failed, 1);
    }

    #[tokio::test]
    async fn test_valid_worldview_adds_no_diagnostic() {
        let source = source(SourceOptions::from_url(INDEX_URL), Arc::new(MockTransport::new()));
        let context = MapContext::default().with_worldview("US");
        let err = source.on_add(context).await.unwrap_err();
        assert!(err.diagnostics().is_empty());
    }

    #[tokio::test]
    async fn test_loaded_stays_true_across_reloads() {
        let source = source(SourceOptions::from_tiles(["https://t/{z}/{x}/{y}"]), Arc::new(MockTransport::new()));
        source.on_add(MapContext::default()).await.unwrap();
        assert!(source.is_loaded());

        source.load().await.unwrap();
        assert!(source.is_loaded());
    }

    #[tokio::test]
    async fn test_load_tile_requires_attach() {
        let source = source(SourceOptions::from_tiles(["https://t/{z}/{x}/{y}"]), Arc::new(MockTransport::new()));
        let tile = crate::tile::TileRecord::new(
            crate::coord::OverscaledTileId::new(5, 0, 5, 3, 2).unwrap(),
        )
        .into_shared();
        assert_eq!(source.load_tile(&tile).await, Err(TileLoadError::NotAttached));
    }
}
