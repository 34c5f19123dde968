//! Configuration CLI commands.
//!
//! Provides `config path` and `config show`.

use clap::Subcommand;
use modeltiles::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
    }
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

fn run_show() -> Result<(), CliError> {
    let path = config_file_path();
    let config = ConfigFile::load()?;

    if path.exists() {
        println!("# {}", path.display());
    } else {
        println!("# {} (not found, showing defaults)", path.display());
    }
    println!();
    print!("{}", render(&config));
    Ok(())
}

fn render(config: &ConfigFile) -> String {
    let token = match &config.http.access_token {
        Some(_) => "(set)",
        None => "(not set)",
    };
    let workers = config
        .workers
        .count
        .map(|c| c.to_string())
        .unwrap_or_else(|| "auto".to_string());

    let mut out = String::new();
    out.push_str("[http]\n");
    out.push_str(&format!("  timeout = {}\n", config.http.timeout));
    out.push_str(&format!("  access_token = {}\n", token));
    out.push_str("\n[workers]\n");
    out.push_str(&format!("  count = {}\n", workers));
    out.push_str("\n[tiles]\n");
    out.push_str(&format!("  refresh_expired = {}\n", config.tiles.refresh_expired));
    out.push_str(&format!(
        "  collect_resource_timing = {}\n",
        config.tiles.collect_resource_timing
    ));
    out.push_str("\n[logging]\n");
    out.push_str(&format!("  directory = {}\n", config.logging.directory.display()));
    out.push_str(&format!("  file = {}\n", config.logging.file));
    out
}
