//! Bounds command - check which tiles a source serves.

use modeltiles::coord::CanonicalTileId;

use super::common::{CliRunner, SourceArgs};
use crate::error::CliError;

/// Run the bounds command.
pub async fn run(args: SourceArgs, tiles: Vec<CanonicalTileId>) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup("bounds");

    let source = runner.attach_source(&args).await?;

    match source.tile_bounds() {
        Some(filter) => {
            let b = filter.bounds();
            let (min_zoom, max_zoom) = filter.zoom_range();
            println!(
                "Bounds [{}, {}, {}, {}] at zoom {}..={}",
                b.west, b.south, b.east, b.north, min_zoom, max_zoom
            );
        }
        None => {
            let config = source.config();
            println!(
                "No bounds declared; zoom {}..={}",
                config.min_zoom, config.max_zoom
            );
        }
    }

    for tile in tiles {
        let verdict = if source.has_tile(&tile) {
            "in scope"
        } else {
            "out of scope"
        };
        println!("  {}: {}", tile, verdict);
    }

    Ok(())
}
