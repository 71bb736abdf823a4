//! Activity aggregation.

pub mod aggregator;

pub use aggregator::*;
