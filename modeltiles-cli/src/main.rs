//! ModelTiles CLI - Command-line interface
//!
//! Bootstraps tiled 3D-model sources and loads tiles from the command line.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use modeltiles::coord::CanonicalTileId;

use commands::common::{parse_tile, SourceArgs};
use commands::config::ConfigCommands;
use error::CliError;

#[derive(Parser)]
#[command(name = "modeltiles")]
#[command(version, about = "Inspect and load tiled 3D model sources", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap a source and print its resolved configuration
    Inspect {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the configuration as JSON
        #[arg(long)]
        json: bool,
    },

    /// Bootstrap a source and load tiles through the worker pool
    Load {
        #[command(flatten)]
        source: SourceArgs,

        /// Tile address as z/x/y (repeatable)
        #[arg(long = "tile", required = true, value_parser = parse_tile)]
        tiles: Vec<CanonicalTileId>,
    },

    /// Report whether tiles are within a source's bounds and zoom range
    Bounds {
        #[command(flatten)]
        source: SourceArgs,

        /// Tile address as z/x/y (repeatable)
        #[arg(long = "tile", required = true, value_parser = parse_tile)]
        tiles: Vec<CanonicalTileId>,
    },

    /// Configuration file management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Inspect { source, json } => commands::inspect::run(source, json).await,
        Commands::Load { source, tiles } => commands::load::run(source, tiles).await,
        Commands::Bounds { source, tiles } => commands::bounds::run(source, tiles).await,
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
