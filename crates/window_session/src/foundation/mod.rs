//! Foundation module - shared utilities
//!
//! - Collections used for per-window bookkeeping
//! - Logging setup

pub mod collections;
pub mod logging;
