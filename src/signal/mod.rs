//! Signal intake for the risk engine.

pub mod normalizer;

pub use normalizer::{normalize, NormalizedSignals};
