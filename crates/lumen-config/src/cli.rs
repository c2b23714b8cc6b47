//! Command-line argument parsing for the Lumen world service.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;
use crate::config::Dimension;
use crate::error::ConfigError;

/// Lumen command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "lumen", about = "Bedrock-compatible chunk storage and light engine")]
pub struct CliArgs {
    /// Dimension to generate (overworld, nether, end).
    #[arg(long)]
    pub dimension: Option<String>,

    /// Lowest block Y.
    #[arg(long, allow_hyphen_values = true)]
    pub min_y: Option<i16>,

    /// Highest block Y.
    #[arg(long, allow_hyphen_values = true)]
    pub max_y: Option<i16>,

    /// Spawn region radius in chunks.
    #[arg(long)]
    pub spawn_radius: Option<u32>,

    /// Light area width in chunks (odd).
    #[arg(long)]
    pub area_width: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    ///
    /// Choosing a dimension resets the world height to that dimension's
    /// default before explicit `--min-y`/`--max-y` are applied.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) -> Result<(), ConfigError> {
        if let Some(ref name) = args.dimension {
            let dimension = Dimension::from_name(name).ok_or_else(|| ConfigError::Invalid {
                field: "world.dimension",
                reason: format!("unknown dimension {name:?}"),
            })?;
            let (min_y, max_y) = dimension.default_height();
            self.world.dimension = dimension;
            self.world.min_y = min_y;
            self.world.max_y = max_y;
        }
        if let Some(min_y) = args.min_y {
            self.world.min_y = min_y;
        }
        if let Some(max_y) = args.max_y {
            self.world.max_y = max_y;
        }
        if let Some(radius) = args.spawn_radius {
            self.world.spawn_radius = radius;
        }
        if let Some(width) = args.area_width {
            self.lighting.area_width = width;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            spawn_radius: Some(6),
            log_level: Some("debug".to_string()),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args).unwrap();
        assert_eq!(config.world.spawn_radius, 6);
        assert_eq!(config.debug.log_level, "debug");
        // Non-overridden fields retain defaults
        assert_eq!(config.world.min_y, -64);
        assert_eq!(config.lighting.area_width, 3);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default()).unwrap();
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_dimension_sets_height() {
        let mut config = Config::default();
        let args = CliArgs {
            dimension: Some("nether".to_string()),
            max_y: Some(255),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args).unwrap();
        assert_eq!(config.world.dimension, Dimension::Nether);
        assert_eq!(config.world.min_y, 0);
        assert_eq!(config.world.max_y, 255);
    }

    #[test]
    fn test_cli_unknown_dimension_rejected() {
        let mut config = Config::default();
        let args = CliArgs {
            dimension: Some("moon".to_string()),
            ..CliArgs::default()
        };
        assert!(config.apply_cli_overrides(&args).is_err());
    }

    #[test]
    fn test_cli_parses_negative_min_y() {
        let args = CliArgs::parse_from(["lumen", "--min-y", "-128", "--spawn-radius", "1"]);
        assert_eq!(args.min_y, Some(-128));
        assert_eq!(args.spawn_radius, Some(1));
    }
}
