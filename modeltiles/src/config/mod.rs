//! User configuration.
//!
//! Settings live in `~/.modeltiles/config.ini`:
//!
//! ```ini
//! [http]
//! timeout = 30
//! access_token = pk.example
//!
//! [workers]
//! count = 4
//!
//! [tiles]
//! refresh_expired = true
//! collect_resource_timing = false
//!
//! [logging]
//! directory = ~/.modeltiles/logs
//! file = modeltiles.log
//! ```
//!
//! A missing file yields defaults. Unknown keys are ignored.

mod file;
mod parser;

pub use file::{
    config_directory, config_file_path, ConfigFile, ConfigFileError, HttpSettings,
    LoggingSettings, TileSettings, WorkerSettings, DEFAULT_LOG_FILE,
};
