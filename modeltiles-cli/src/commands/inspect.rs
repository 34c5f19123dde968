//! Inspect command - bootstrap a source and print its resolved configuration.

use super::common::{CliRunner, SourceArgs};
use crate::error::CliError;

/// Run the inspect command.
pub async fn run(args: SourceArgs, json: bool) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup("inspect");

    let source = runner.attach_source(&args).await?;
    let config = source.config();

    if json {
        let document = serde_json::json!({
            "source": source.serialize(),
            "id": config.id,
            "tiles": config.tiles,
            "minzoom": config.min_zoom,
            "maxzoom": config.max_zoom,
            "tileSize": config.tile_size,
            "scheme": config.scheme.to_string(),
            "bounds": config.bounds.map(|b| b.to_array()),
            "attribution": config.attribution,
            "name": config.name,
        });
        let pretty = serde_json::to_string_pretty(&document)
            .map_err(|e| CliError::Config(e.to_string()))?;
        println!("{}", pretty);
        return Ok(());
    }

    println!("Source: {} ({})", config.id, source.state());
    if let Some(name) = &config.name {
        println!("  Name:        {}", name);
    }
    println!("  Zoom range:  {}..={}", config.min_zoom, config.max_zoom);
    println!("  Tile size:   {}", config.tile_size);
    println!("  Scheme:      {}", config.scheme);
    match config.bounds {
        Some(b) => println!(
            "  Bounds:      [{}, {}, {}, {}]",
            b.west, b.south, b.east, b.north
        ),
        None => println!("  Bounds:      (world)"),
    }
    if let Some(attribution) = &config.attribution {
        println!("  Attribution: {}", attribution);
    }
    println!("  Templates:");
    for template in &config.tiles {
        println!("    {}", template);
    }

    Ok(())
}
