//! nctl core library
//!
//! Shared functionality for the `nctl` binary and its worker process:
//! - Environment configuration loading and validation
//! - Tracing setup with per-process labels
//! - Common error types

pub mod config;
pub mod error;
pub mod tracing_init;

pub use crate::config::{EnvConfig, collect_vars, collect_vars_in, load_env};
pub use error::{ConfigError, Result};
pub use tracing_init::{LogConfig, ProcessLabel};
