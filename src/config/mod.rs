//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and loading
//! - [`defaults`]: serde default values
//! - [`validation`]: startup checks returning every problem found

mod defaults;
mod types;
mod validation;

pub use types::{
    AdminConfig, AllowlistEntry, BotConfig, ChatConfig, Config, ConfigError, DatabaseConfig,
    HostingConfig, LoggingConfig, MetricsConfig, PollerConfig,
};
pub use validation::{ValidationError, validate};
