pub mod detectors;
pub mod evaluator;
pub mod filter;
pub mod metrics;
pub mod signal;

pub use evaluator::*;
pub use metrics::*;
pub use signal::*;
