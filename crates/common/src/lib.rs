//! otmlt Common Utilities
//!
//! Shared infrastructure for all otmlt crates:
//! - Error types and result aliases
//! - Tracing/logging initialization
//! - Logging configuration

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
