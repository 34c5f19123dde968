//! Load command - load tiles through the worker pool.

use std::time::Instant;

use modeltiles::coord::{CanonicalTileId, OverscaledTileId};
use modeltiles::tile::{SharedTile, TileRecord};

use super::common::{CliRunner, SourceArgs};
use crate::error::CliError;

/// Run the load command.
pub async fn run(args: SourceArgs, tiles: Vec<CanonicalTileId>) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup("load");

    let source = runner.attach_source(&args).await?;
    let Some(loader) = source.loader() else {
        return Ok(());
    };

    let mut records: Vec<SharedTile> = Vec::with_capacity(tiles.len());
    for tile in tiles {
        if !source.has_tile(&tile) {
            println!("{}: skipped (outside source bounds or zoom range)", tile);
            continue;
        }
        records.push(TileRecord::new(OverscaledTileId::from_canonical(tile)).into_shared());
    }

    println!("Loading {} tile(s)...", records.len());
    let start = Instant::now();
    let results = loader.load_tiles(&records).await;
    let elapsed = start.elapsed();

    for (record, result) in records.iter().zip(results) {
        let record = record.lock();
        match result {
            Ok(()) => {
                println!("{}: {}", record.tile_id(), record.state());
                for (name, bucket) in record.buckets() {
                    println!("    {} ({} bytes)", name, bucket.len());
                }
                if let Some(expires) = record.expiry().expiration_time() {
                    println!("    expires {}", expires.to_rfc3339());
                }
            }
            Err(e) => println!("{}: {} ({})", record.tile_id(), record.state(), e),
        }
    }

    println!();
    println!("Finished in {:.2}s", elapsed.as_secs_f64());
    println!("{}", source.metrics().snapshot());

    Ok(())
}
