//! Tile loading scenarios: superseded results, aborts and worker restarts.

mod common;

use std::sync::Arc;

use common::{buckets, finish, ParkingHandler, TableTransport};
use modeltiles::coord::OverscaledTileId;
use modeltiles::loader::{TileLoadError, TileLoader};
use modeltiles::source::{MapContext, SourceOptions, TiledModelSource};
use modeltiles::tile::{SharedTile, TileRecord, TileState};
use modeltiles::worker::{WorkerError, WorkerPool, WorkerPoolConfig};

async fn attached(workers: usize) -> (TiledModelSource, TileLoader, Arc<ParkingHandler>) {
    let handler = ParkingHandler::new();
    let pool = Arc::new(WorkerPool::new(
        WorkerPoolConfig::default().with_workers(workers),
        handler.clone(),
    ));
    let source = TiledModelSource::new(
        "models",
        SourceOptions::from_tiles(["https://example/{z}/{x}/{y}"]),
        TableTransport::new(),
        pool,
    );
    source.on_add(MapContext::default()).await.unwrap();
    let loader = source.loader().unwrap();
    (source, loader, handler)
}

fn tile() -> SharedTile {
    TileRecord::new(OverscaledTileId::new(5, 0, 5, 3, 2).unwrap()).into_shared()
}

fn spawn_load(
    loader: &TileLoader,
    tile: &SharedTile,
) -> tokio::task::JoinHandle<Result<(), TileLoadError>> {
    let loader = loader.clone();
    let tile = Arc::clone(tile);
    tokio::spawn(async move { loader.load_tile(&tile).await })
}

fn bucket_data(tile: &SharedTile, layer: &str) -> Option<Vec<u8>> {
    tile.lock().buckets().get(layer).map(|b| b.data.to_vec())
}

#[tokio::test]
async fn test_newer_result_is_not_overwritten_by_older() {
    let (source, loader, handler) = attached(2).await;
    let tile = tile();

    let first = spawn_load(&loader, &tile);
    handler.wait_for(1).await;
    let second = spawn_load(&loader, &tile);
    handler.wait_for(2).await;

    handler.release(1, Ok(buckets("layerA", b"new")));
    finish(second).await.unwrap();
    assert_eq!(tile.lock().state(), TileState::Loaded);

    handler.release(0, Ok(buckets("layerA", b"old")));
    finish(first).await.unwrap();

    assert_eq!(bucket_data(&tile, "layerA").as_deref(), Some(&b"new"[..]));
    let snapshot = source.metrics().snapshot();
    assert_eq!(snapshot.tiles_loaded, 1);
    assert_eq!(snapshot.stale_results_discarded, 1);
}

#[tokio::test]
async fn test_older_result_arriving_first_is_dropped() {
    let (_source, loader, handler) = attached(2).await;
    let tile = tile();

    let first = spawn_load(&loader, &tile);
    handler.wait_for(1).await;
    let second = spawn_load(&loader, &tile);
    handler.wait_for(2).await;

    handler.release(0, Ok(buckets("layerA", b"old")));
    finish(first).await.unwrap();
    assert_eq!(tile.lock().state(), TileState::Loading);
    assert!(tile.lock().buckets().is_empty());

    handler.release(0, Ok(buckets("layerA", b"new")));
    finish(second).await.unwrap();
    assert_eq!(tile.lock().state(), TileState::Loaded);
    assert_eq!(bucket_data(&tile, "layerA").as_deref(), Some(&b"new"[..]));
}

#[tokio::test]
async fn test_stale_failure_does_not_mark_tile_errored() {
    let (_source, loader, handler) = attached(1).await;
    let tile = tile();

    let first = spawn_load(&loader, &tile);
    handler.wait_for(1).await;
    let second = spawn_load(&loader, &tile);
    handler.wait_for(2).await;

    handler.release(1, Ok(buckets("layerA", b"new")));
    finish(second).await.unwrap();

    let failure = WorkerError::Decode {
        tile: "5/3/2".to_string(),
        reason: "truncated".to_string(),
    };
    handler.release(0, Err(failure));
    assert_eq!(finish(first).await, Ok(()));
    assert_eq!(tile.lock().state(), TileState::Loaded);
}

#[tokio::test]
async fn test_abort_before_delivery_leaves_record_untouched() {
    let (source, loader, handler) = attached(1).await;
    let tile = tile();

    let task = spawn_load(&loader, &tile);
    handler.wait_for(1).await;

    tile.lock().abort();
    let state_before = tile.lock().state();

    handler.release(0, Ok(buckets("layerA", b"payload")));
    assert_eq!(finish(task).await, Ok(()));

    let record = tile.lock();
    assert_eq!(record.state(), state_before);
    assert!(record.buckets().is_empty());
    assert_eq!(source.metrics().snapshot().aborted_results_discarded, 1);
}

#[tokio::test]
async fn test_aborted_tile_is_never_dispatched() {
    let (_source, loader, handler) = attached(1).await;
    let tile = tile();
    tile.lock().abort();

    loader.load_tile(&tile).await.unwrap();

    assert_eq!(handler.parked(), 0);
    assert_eq!(tile.lock().state(), TileState::Unloaded);
    assert!(tile.lock().request().is_none());
}

#[tokio::test]
async fn test_restarted_worker_fails_in_flight_load() {
    let (source, loader, handler) = attached(1).await;
    let tile = tile();

    let first = spawn_load(&loader, &tile);
    handler.wait_for(1).await;
    handler.release(0, Ok(buckets("layerA", b"kept")));
    finish(first).await.unwrap();

    let second = spawn_load(&loader, &tile);
    handler.wait_for(1).await;
    let actor_id = tile.lock().actor().unwrap().actor_id();
    assert!(loader.pool().restart(actor_id));

    let err = finish(second).await.unwrap_err();
    assert!(matches!(
        err,
        TileLoadError::Worker {
            source: WorkerError::Terminated { .. },
            ..
        }
    ));

    let record = tile.lock();
    assert_eq!(record.state(), TileState::Errored);
    assert_eq!(bucket_data_locked(&record, "layerA").as_deref(), Some(&b"kept"[..]));
    assert_eq!(source.metrics().snapshot().tiles_failed, 1);
}

fn bucket_data_locked(record: &TileRecord, layer: &str) -> Option<Vec<u8>> {
    record.buckets().get(layer).map(|b| b.data.to_vec())
}

#[tokio::test]
async fn test_reload_after_restart_rebinds_to_live_worker() {
    let (source, loader, handler) = attached(1).await;
    let tile = tile();

    let first = spawn_load(&loader, &tile);
    handler.wait_for(1).await;
    handler.release(0, Ok(buckets("layerA", b"v1")));
    finish(first).await.unwrap();

    let (actor_id, generation) = {
        let record = tile.lock();
        let actor = record.actor().unwrap();
        (actor.actor_id(), actor.generation())
    };
    assert!(loader.pool().restart(actor_id));
    assert!(tile.lock().actor().unwrap().is_expired());

    let second = spawn_load(&loader, &tile);
    handler.wait_for(1).await;
    handler.release(0, Ok(buckets("layerA", b"v2")));
    finish(second).await.unwrap();

    let record = tile.lock();
    let actor = record.actor().unwrap();
    assert!(!actor.is_expired());
    assert!(actor.generation() > generation);
    assert_eq!(record.state(), TileState::Loaded);
    assert_eq!(bucket_data_locked(&record, "layerA").as_deref(), Some(&b"v2"[..]));
    assert_eq!(source.metrics().snapshot().actor_rebinds, 2);
}

#[tokio::test]
async fn test_removed_source_rejects_tile_loads() {
    let (source, _loader, _handler) = attached(1).await;
    source.on_remove();

    let tile = tile();
    assert_eq!(source.load_tile(&tile).await, Err(TileLoadError::NotAttached));
}

#[tokio::test]
async fn test_rebind_between_overlapping_loads_keeps_latest() {
    let (source, loader, handler) = attached(2).await;
    let tile = tile();

    let first = spawn_load(&loader, &tile);
    handler.wait_for(1).await;

    // Renderer flags the content stale while the first job is still out
    tile.lock().mark_expired();
    let second = spawn_load(&loader, &tile);
    handler.wait_for(2).await;

    handler.release(0, Ok(buckets("layerA", b"old")));
    finish(first).await.unwrap();
    assert!(tile.lock().buckets().is_empty());

    handler.release(0, Ok(buckets("layerA", b"new")));
    finish(second).await.unwrap();

    assert_eq!(tile.lock().state(), TileState::Loaded);
    assert_eq!(bucket_data(&tile, "layerA").as_deref(), Some(&b"new"[..]));
    let snapshot = source.metrics().snapshot();
    assert_eq!(snapshot.actor_rebinds, 2);
    assert_eq!(snapshot.stale_results_discarded, 1);
}
