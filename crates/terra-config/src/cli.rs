//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Terrain streamer command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "terra", about = "Out-of-core quadtree terrain streamer")]
pub struct CliArgs {
    /// Map directory.
    #[arg(long)]
    pub map: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Screen-space error tolerance in pixels.
    #[arg(long)]
    pub pixel_error: Option<f32>,

    /// Soft limit on resident textures.
    #[arg(long)]
    pub cache_limit: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref map) = args.map {
            self.map.path = map.clone();
        }
        if let Some(frames) = args.frames {
            self.debug.frames = frames;
        }
        if let Some(tolerance) = args.pixel_error {
            self.streaming.pixel_tolerance = tolerance;
        }
        if let Some(limit) = args.cache_limit {
            self.streaming.cache_soft_limit = limit;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
