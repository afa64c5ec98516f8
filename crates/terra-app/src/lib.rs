//! Streaming driver tying the terrain hierarchy, frontier selection and
//! texture cache together frame by frame.

mod error;
mod flight;
mod session;

pub use error::AppError;
pub use flight::Flight;
pub use session::{CellTrees, FrameReport, StreamingSession, camera_from_config, map_info};
