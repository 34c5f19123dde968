//! Tile records and their content.

mod bucket;
mod expiry;
mod record;

pub use bucket::{merge_buckets, Bucket, BucketMap};
pub use expiry::{parse_cache_control, ExpiryData, CLOCK_SKEW_RETRY_TIMEOUT_SECS};
pub use record::{SharedTile, TileRecord, TileState, TileUid};
