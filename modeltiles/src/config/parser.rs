//! Mapping between `Ini` and `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::{ConfigFile, ConfigFileError};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [http] section
    if let Some(section) = ini.section(Some("http")) {
        if let Some(v) = parse_value::<u64>(section, "http", "timeout", "must be a number of seconds")? {
            if v == 0 {
                return Err(invalid("http", "timeout", "0", "must be greater than zero"));
            }
            config.http.timeout = v;
        }
        if let Some(v) = non_empty(section, "access_token") {
            config.http.access_token = Some(v.to_string());
        }
    }

    // [workers] section
    if let Some(section) = ini.section(Some("workers")) {
        if let Some(v) = parse_value::<usize>(section, "workers", "count", "must be a positive integer")? {
            if v == 0 {
                return Err(invalid("workers", "count", "0", "must be a positive integer"));
            }
            config.workers.count = Some(v);
        }
    }

    // [tiles] section
    if let Some(section) = ini.section(Some("tiles")) {
        if let Some(v) = parse_bool(section, "tiles", "refresh_expired")? {
            config.tiles.refresh_expired = v;
        }
        if let Some(v) = parse_bool(section, "tiles", "collect_resource_timing")? {
            config.tiles.collect_resource_timing = v;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

/// Serialize a `ConfigFile` into an `Ini` object.
pub(super) fn to_ini(config: &ConfigFile) -> Ini {
    let mut ini = Ini::new();

    ini.with_section(Some("http"))
        .set("timeout", config.http.timeout.to_string())
        .set(
            "access_token",
            config.http.access_token.clone().unwrap_or_default(),
        );

    if let Some(count) = config.workers.count {
        ini.with_section(Some("workers"))
            .set("count", count.to_string());
    }

    ini.with_section(Some("tiles"))
        .set("refresh_expired", config.tiles.refresh_expired.to_string())
        .set(
            "collect_resource_timing",
            config.tiles.collect_resource_timing.to_string(),
        );

    ini.with_section(Some("logging"))
        .set("directory", config.logging.directory.display().to_string())
        .set("file", config.logging.file.clone());

    ini
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_value<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError> {
    match non_empty(section, key) {
        None => Ok(None),
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section_name, key, v, reason)),
    }
}

fn parse_bool(
    section: &Properties,
    section_name: &str,
    key: &str,
) -> Result<Option<bool>, ConfigFileError> {
    match non_empty(section, key).map(str::to_lowercase).as_deref() {
        None => Ok(None),
        Some("true" | "yes" | "on" | "1") => Ok(Some(true)),
        Some("false" | "no" | "off" | "0") => Ok(Some(false)),
        Some(other) => Err(invalid(section_name, key, other, "must be true or false")),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
