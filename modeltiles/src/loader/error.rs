use thiserror::Error;

use crate::worker::WorkerError;

/// Errors reported to the caller of a single tile load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileLoadError {
    /// The source has not been added to a map yet.
    #[error("Source is not attached to a map")]
    NotAttached,

    /// No tile templates are configured, typically after a failed bootstrap.
    #[error("No tile templates configured for tile {tile}")]
    NoTileTemplates { tile: String },

    /// The worker reported a fetch or decode failure.
    #[error("Failed to load tile {tile}: {source}")]
    Worker {
        tile: String,
        #[source]
        source: WorkerError,
    },
}
