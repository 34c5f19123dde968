//! Freshness tracking for loaded tiles.
//!
//! Tiles carry the `Cache-Control` / `Expires` information of their last
//! response so the renderer can schedule a refresh. A server that keeps
//! handing out already-expired content is backed off exponentially.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Minimum re-arm interval when the server clock appears skewed.
pub const CLOCK_SKEW_RETRY_TIMEOUT_SECS: i64 = 30;

/// Upper bound accepted for `max-age`, ten years.
const MAX_AGE_LIMIT_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Expiry metadata of a tile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpiryData {
    expiration_time: Option<DateTime<Utc>>,
    expired_request_count: u32,
}

impl ExpiryData {
    /// When the content expires, if known.
    pub fn expiration_time(&self) -> Option<DateTime<Utc>> {
        self.expiration_time
    }

    /// Consecutive responses that were already expired on arrival.
    pub fn expired_request_count(&self) -> u32 {
        self.expired_request_count
    }

    /// Applies response headers. Returns true if the content is expired.
    ///
    /// `max-age` wins over `Expires`; an `Expires` header is only consulted
    /// when there is no `Cache-Control` header at all.
    pub fn apply(
        &mut self,
        cache_control: Option<&str>,
        expires: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        let prior = self.expiration_time;

        if let Some(cache_control) = cache_control {
            let max_age = parse_cache_control(cache_control)
                .get("max-age")
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|secs| *secs > 0);
            if let Some(secs) = max_age {
                let secs = secs.min(MAX_AGE_LIMIT_SECS);
                self.expiration_time = Some(now + chrono::Duration::seconds(secs));
            }
        } else if let Some(expires) = expires {
            if let Ok(parsed) = DateTime::parse_from_rfc2822(expires.trim()) {
                self.expiration_time = Some(parsed.with_timezone(&Utc));
            }
        }

        let Some(expiration) = self.expiration_time else {
            return false;
        };

        let is_expired = if expiration > now {
            false
        } else {
            match prior {
                None => true,
                Some(prior) if expiration < prior => true,
                Some(prior) => {
                    let delta = expiration - prior;
                    if delta == chrono::Duration::zero() {
                        true
                    } else {
                        let skew = chrono::Duration::seconds(CLOCK_SKEW_RETRY_TIMEOUT_SECS);
                        self.expiration_time = Some(now + delta.max(skew));
                        false
                    }
                }
            }
        };

        if is_expired {
            self.expired_request_count = self.expired_request_count.saturating_add(1);
        } else {
            self.expired_request_count = 0;
        }
        is_expired
    }

    /// Delay until the tile should be refreshed, if it has expiry data.
    ///
    /// While responses keep arriving expired this grows as `2^(n-1)` seconds.
    pub fn timeout(&self, now: DateTime<Utc>) -> Option<Duration> {
        let expiration = self.expiration_time?;
        if self.expired_request_count > 0 {
            let shift = (self.expired_request_count - 1).min(31);
            Some(Duration::from_millis(1000 * (1u64 << shift)))
        } else {
            let remaining = (expiration - now).num_milliseconds().clamp(0, i64::from(i32::MAX));
            Some(Duration::from_millis(remaining as u64))
        }
    }
}

/// Parses a `Cache-Control` header into lowercase directive names and values.
///
/// Valueless directives map to an empty string; quoted values are unquoted.
pub fn parse_cache_control(value: &str) -> BTreeMap<String, String> {
    value
        .split(',')
        .filter_map(|directive| {
            let directive = directive.trim();
            if directive.is_empty() {
                return None;
            }
            let (name, value) = match directive.split_once('=') {
                Some((name, value)) => (name.trim(), value.trim().trim_matches('"')),
                None => (directive, ""),
            };
            Some((name.to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}
