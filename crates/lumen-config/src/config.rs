//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// World shape and spawn region.
    pub world: WorldConfig,
    /// Light engine settings.
    pub lighting: LightingConfig,
    /// Persistence settings.
    pub storage: StorageConfig,
    /// Network chunk encoding settings.
    pub network: NetworkConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// The three world dimensions, each with its own database key space.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Dimension {
    #[default]
    Overworld,
    Nether,
    End,
}

impl Dimension {
    /// Numeric id used in chunk database keys.
    pub fn id(self) -> i32 {
        match self {
            Dimension::Overworld => 0,
            Dimension::Nether => 1,
            Dimension::End => 2,
        }
    }

    /// Default `(min_y, max_y)` for the dimension.
    pub fn default_height(self) -> (i16, i16) {
        match self {
            Dimension::Overworld => (-64, 319),
            Dimension::Nether => (0, 127),
            Dimension::End => (0, 255),
        }
    }

    /// Parses a dimension name as used on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "overworld" => Some(Dimension::Overworld),
            "nether" => Some(Dimension::Nether),
            "end" | "the_end" => Some(Dimension::End),
            _ => None,
        }
    }
}

/// One horizontal band of a flat world, listed bottom to top.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlatLayer {
    /// Block name, e.g. `minecraft:stone`.
    pub block: String,
    /// Number of blocks in the band.
    pub thickness: u16,
}

impl FlatLayer {
    pub fn new(block: impl Into<String>, thickness: u16) -> Self {
        Self {
            block: block.into(),
            thickness,
        }
    }
}

/// World configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    pub dimension: Dimension,
    /// Lowest block Y. Must be a multiple of 16.
    pub min_y: i16,
    /// Highest block Y. `max_y - min_y + 1` must be a multiple of 16.
    pub max_y: i16,
    /// Chunks generated around the origin in each direction.
    pub spawn_radius: u32,
    /// Flat terrain bands starting at `min_y`.
    pub flat_layers: Vec<FlatLayer>,
}

/// Light engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingConfig {
    /// Side length in chunks of the area lit around each chunk. Must be odd.
    pub area_width: u32,
    /// Recompute light for chunks read back from storage.
    pub relight_on_load: bool,
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Compact palettes and drop empty layers before writing a chunk.
    pub compact_before_save: bool,
}

/// Network chunk encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Chunks needing more sub chunks than this in one packet are skipped.
    pub max_sub_chunks: u8,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level filter (e.g., "debug", "info", "lumen_chunk=trace").
    pub log_level: String,
    /// Directory for JSON log files in debug builds.
    pub log_dir: Option<PathBuf>,
    /// Decode saved and encoded chunks again and compare them.
    pub verify_round_trip: bool,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        let dimension = Dimension::default();
        let (min_y, max_y) = dimension.default_height();
        Self {
            dimension,
            min_y,
            max_y,
            spawn_radius: 2,
            flat_layers: vec![
                FlatLayer::new("minecraft:bedrock", 1),
                FlatLayer::new("minecraft:dirt", 2),
                FlatLayer::new("minecraft:grass", 1),
            ],
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            area_width: 3,
            relight_on_load: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            compact_before_save: true,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { max_sub_chunks: 24 }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
            verify_round_trip: true,
        }
    }
}

// --- Validation ---

impl WorldConfig {
    /// Total thickness of the flat terrain bands.
    pub fn terrain_height(&self) -> i32 {
        self.flat_layers
            .iter()
            .map(|layer| i32::from(layer.thickness))
            .sum()
    }
}

impl Config {
    /// Checks values that would make the world unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if world.min_y % 16 != 0 {
            return Err(ConfigError::Invalid {
                field: "world.min_y",
                reason: format!("{} is not a multiple of 16", world.min_y),
            });
        }
        let height = i32::from(world.max_y) - i32::from(world.min_y) + 1;
        if height <= 0 || height % 16 != 0 {
            return Err(ConfigError::Invalid {
                field: "world.max_y",
                reason: format!("world height {height} is not a positive multiple of 16"),
            });
        }
        if world.terrain_height() > height {
            return Err(ConfigError::Invalid {
                field: "world.flat_layers",
                reason: format!(
                    "terrain of {} blocks exceeds world height {height}",
                    world.terrain_height()
                ),
            });
        }
        if self.lighting.area_width % 2 == 0 {
            return Err(ConfigError::Invalid {
                field: "lighting.area_width",
                reason: format!("{} is not odd", self.lighting.area_width),
            });
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
