//! Bias fusion layer: neutralization, Monte Carlo reliability, aggregation.

pub mod aggregator;
pub mod monte_carlo;
pub mod neutralizer;

pub use aggregator::aggregate;
pub use monte_carlo::{MonteCarloEstimator, MonteCarloResult};
pub use neutralizer::{BiasNeutralizer, NeutralizedBias};
