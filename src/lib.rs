// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v1.1
// Date Modified: 2027-08-20
// Author: Lukas Bower

//! Semihosting I/O shim for Cohesix debug monitors.
//!
//! Translates semihosting file and console requests (open, read, write,
//! seek, close, ...) into operations on a host filesystem and console.

#![forbid(unsafe_code)]

/// Session configuration (TOML file plus environment overrides).
pub mod config;

/// Handle table, mode table and request handler.
pub mod semihosting;

pub use config::{ConfigError, SemihostConfig};
pub use semihosting::{Request, Reply, Semihost, SemihostError};
