//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`bounds`] - Check tiles against a source's bounds and zoom range
//! - [`config`] - Configuration file location and values
//! - [`inspect`] - Bootstrap a source and print its resolved configuration
//! - [`load`] - Load tiles through the worker pool

pub mod bounds;
pub mod common;
pub mod config;
pub mod inspect;
pub mod load;
