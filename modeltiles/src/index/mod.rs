//! Index document discovery.
//!
//! A source either names a remote index document (`url`) or lists its tile
//! templates inline. [`IndexBootstrapper`] turns either form into an
//! [`IndexDocument`], asynchronously and cancelably.
//!
//! # Example
//!
//! ```ignore
//! use modeltiles::index::IndexBootstrapper;
//!
//! let bootstrapper = IndexBootstrapper::new(transport);
//! let request = bootstrapper.begin(&options, requests, Some("en"), None);
//! let cancel = request.cancel_handle();
//!
//! match request.settled().await {
//!     Some(Ok(document)) => config.reconcile(&document),
//!     Some(Err(e)) => warn!(error = %e, "Index bootstrap failed"),
//!     None => {} // cancelled
//! }
//! ```

mod bootstrap;
mod document;
mod error;

pub use bootstrap::{CancelHandle, IndexBootstrapper, IndexRequest};
pub use document::IndexDocument;
pub use error::{FetchError, FetchErrorKind};
