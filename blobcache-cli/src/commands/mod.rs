//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`store`] - Cache operations (add, get, purge, sweep, stats, clear)
//! - [`config`] - Configuration management (show, init, path)
//! - [`common`] - Shared config loading and cache construction

pub mod common;
pub mod config;
pub mod store;
