//! Configuration structs with defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the config file inside the config directory.
pub const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Streaming and cache settings.
    pub streaming: StreamingConfig,
    /// Viewer settings.
    pub camera: CameraConfig,
    /// Map description.
    pub map: MapConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Level-of-detail and texture cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Screen-space error in pixels a tile may show before it is refined.
    pub pixel_tolerance: f32,
    /// Soft limit on resident textures.
    pub cache_soft_limit: usize,
    /// Build mip chains for uploaded textures.
    pub mipmaps: bool,
}

/// Camera projection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Horizontal field of view in degrees.
    pub fov_degrees: f32,
    /// Near plane distance.
    pub near: f32,
    /// Far plane distance.
    pub far: f32,
    /// Viewport width in pixels.
    pub viewport_width: u32,
    /// Viewport height in pixels.
    pub viewport_height: u32,
}

/// Heightfield map metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    /// Directory holding the `<row>_<col>` cell directories.
    pub path: PathBuf,
    /// Descriptive name.
    pub name: String,
    /// Meters per horizontal grid unit.
    pub h_scale: f32,
    /// Meters per quantized elevation unit.
    pub v_scale: f32,
    /// Elevation of quantized zero.
    pub base_elevation: f32,
    pub min_elevation: f32,
    pub max_elevation: f32,
    /// Cell width in grid units (power of two).
    pub cell_size: u32,
    pub n_rows: u32,
    pub n_cols: u32,
    /// Cells carry a `color.tqt` texture.
    pub color_map: bool,
    /// Cells carry a `norm.tqt` texture.
    pub normal_map: bool,
    /// Texture rows are stored south to north and are flipped at load.
    pub flip_textures: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Frames simulated by the headless fly-through.
    pub frames: u32,
}

// --- Default implementations ---

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            pixel_tolerance: 2.0,
            cache_soft_limit: 1024,
            mipmaps: false,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 1.0,
            far: 100_000.0,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("maps/default"),
            name: "default".to_string(),
            h_scale: 1.0,
            v_scale: 1.0,
            base_elevation: 0.0,
            min_elevation: 0.0,
            max_elevation: 1000.0,
            cell_size: 1024,
            n_rows: 1,
            n_cols: 1,
            color_map: true,
            normal_map: true,
            flip_textures: false,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            frames: 600,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Per-user config directory (`<config dir>/terra`).
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("terra"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

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

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Returns `Some(new_config)` if the file on disk differs, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
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
