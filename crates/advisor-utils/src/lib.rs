//! Shared utilities for stock-advisor
//!
//! This crate provides common functionality used across the workspace,
//! including logging setup and environment/configuration loading.

pub mod config;
pub mod logging;

pub use config::{AppConfig, load_env};
pub use logging::{DEFAULT_FILTER, init_tracing, init_tracing_with};
