//! Configuration for the Lumen world service.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line. Missing sections and fields fall back to their defaults, so
//! older config files keep loading as new settings are added.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, Dimension, FlatLayer, LightingConfig, NetworkConfig, StorageConfig,
    WorldConfig,
};
pub use error::ConfigError;
