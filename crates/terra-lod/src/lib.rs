//! View-dependent selection of the terrain frontier: the coarsest set of
//! visible tiles whose projected geometric error is within tolerance.

mod frontier;

pub use frontier::{DEFAULT_PIXEL_TOLERANCE, Frontier, FrontierNode, FrontierSelector, SelectionStats};
