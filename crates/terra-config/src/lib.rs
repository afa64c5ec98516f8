//! Configuration for the terrain streamer.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line via clap.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CONFIG_FILE, CameraConfig, Config, DebugConfig, MapConfig, StreamingConfig};
pub use error::ConfigError;
