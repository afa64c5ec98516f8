use terra_config::ConfigError;
use terra_terrain::TerrainError;

/// Failures that stop the streamer before or while opening a map.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Terrain(#[from] TerrainError),
}
