//! Output module for reporting on stored offers

mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};
