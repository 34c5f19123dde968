//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use modeltiles::config::ConfigFile;
use modeltiles::coord::CanonicalTileId;
use modeltiles::logging::{init_logging, LoggingGuard};
use modeltiles::source::{MapContext, SourceEvent, SourceOptions, TiledModelSource};
use modeltiles::transport::{HttpTransport, ReqwestTransport};
use modeltiles::worker::{FetchDecodeHandler, WorkerPool};
use tracing::info;

use crate::error::CliError;

/// Source selection shared by every source command.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// JSON source description (`url` or `tiles`, plus optional zoom range and bounds)
    #[arg(long, conflicts_with = "url", required_unless_present = "url")]
    pub source: Option<PathBuf>,

    /// Index document URL
    #[arg(long)]
    pub url: Option<String>,

    /// Preferred languages, comma separated (e.g. en,fr)
    #[arg(long, value_delimiter = ',')]
    pub language: Vec<String>,

    /// Worldview hint (ISO alpha-2 code)
    #[arg(long)]
    pub worldview: Option<String>,

    /// Access token appended to index and tile URLs (overrides config.ini)
    #[arg(long)]
    pub access_token: Option<String>,

    /// Source id used in logs
    #[arg(long, default_value = "models")]
    pub id: String,
}

impl SourceArgs {
    /// Build source options from the JSON file or the URL.
    pub fn options(&self) -> Result<SourceOptions, CliError> {
        match (&self.source, &self.url) {
            (Some(path), _) => {
                let json = std::fs::read_to_string(path).map_err(|error| CliError::FileRead {
                    path: path.clone(),
                    error,
                })?;
                SourceOptions::from_json(&json).map_err(|error| CliError::SourceParse {
                    path: path.clone(),
                    error,
                })
            }
            (None, Some(url)) => Ok(SourceOptions::from_url(url.clone())),
            (None, None) => Err(CliError::Config(
                "Either --source or --url is required".to_string(),
            )),
        }
    }

    /// Map context from config, with command-line hints applied.
    pub fn context(&self, config: &ConfigFile) -> MapContext {
        let mut config = config.clone();
        if let Some(token) = &self.access_token {
            config.http.access_token = Some(token.clone());
        }

        let mut context = config.map_context();
        if !self.language.is_empty() {
            context = context.with_language(self.language.iter().cloned());
        }
        if let Some(worldview) = &self.worldview {
            context = context.with_worldview(worldview.clone());
        }
        context
    }
}

/// Parse a `z/x/y` tile address.
pub fn parse_tile(s: &str) -> Result<CanonicalTileId, String> {
    s.parse().map_err(|e: modeltiles::coord::CoordError| e.to_string())
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    pub fn new() -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("ModelTiles v{}", env!("CARGO_PKG_VERSION"));
        info!("ModelTiles CLI: {} command", command);
    }

    /// Create an unattached source with a worker pool that fetches over HTTP.
    pub fn create_source(&self, args: &SourceArgs) -> Result<TiledModelSource, CliError> {
        let options = args.options()?;
        let transport: Arc<dyn HttpTransport> =
            Arc::new(ReqwestTransport::with_timeout(self.config.http.timeout)?);
        let handler = FetchDecodeHandler::new(Arc::clone(&transport));
        let pool = Arc::new(WorkerPool::new(
            self.config.worker_pool_config(),
            Arc::new(handler),
        ));
        Ok(TiledModelSource::new(args.id.clone(), options, transport, pool))
    }

    /// Create a source, print its lifecycle events, and bootstrap it.
    pub async fn attach_source(&self, args: &SourceArgs) -> Result<TiledModelSource, CliError> {
        let source = self.create_source(args)?;
        source.events().subscribe(|event| match event {
            SourceEvent::Error(err) => println!("  event: error ({})", err),
            other => println!("  event: {}", other),
        });

        println!("Loading source '{}'...", args.id);
        source.on_add(args.context(&self.config)).await?;
        println!();
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args() -> SourceArgs {
        SourceArgs {
            source: None,
            url: None,
            language: Vec::new(),
            worldview: None,
            access_token: None,
            id: "models".to_string(),
        }
    }

    #[test]
    fn test_parse_tile() {
        let tile = parse_tile("5/3/2").unwrap();
        assert_eq!((tile.z, tile.x, tile.y), (5, 3, 2));
        assert!(parse_tile("5/3").is_err());
        assert!(parse_tile("2/9/0").is_err());
    }

    #[test]
    fn test_options_from_url() {
        let args = SourceArgs {
            url: Some("https://example.com/tiles.json".to_string()),
            ..args()
        };
        let options = args.options().unwrap();
        assert_eq!(options.url.as_deref(), Some("https://example.com/tiles.json"));
    }

    #[test]
    fn test_options_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tiles": ["https://t/{{z}}/{{x}}/{{y}}"], "maxzoom": 14}}"#
        )
        .unwrap();

        let args = SourceArgs {
            source: Some(file.path().to_path_buf()),
            ..args()
        };
        let options = args.options().unwrap();
        assert_eq!(options.maxzoom, Some(14));
        assert_eq!(options.tiles.unwrap().len(), 1);
    }

    #[test]
    fn test_options_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let args = SourceArgs {
            source: Some(file.path().to_path_buf()),
            ..args()
        };
        assert!(matches!(args.options(), Err(CliError::SourceParse { .. })));
    }

    #[test]
    fn test_context_applies_hints() {
        let args = SourceArgs {
            language: vec!["en".to_string(), "fr".to_string()],
            worldview: Some("US".to_string()),
            ..args()
        };
        let context = args.context(&ConfigFile::default());
        assert_eq!(context.language_param().as_deref(), Some("en,fr"));
        assert_eq!(context.worldview.as_deref(), Some("US"));
    }
}
