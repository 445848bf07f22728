//! Monte Carlo confidence estimation.
//!
//! Resamples a Gaussian perturbation of the neutralized bias to measure how
//! reliable that bias is under noise. Dispersion of the samples is the
//! system's confidence-interval proxy: higher volatility widens the noise,
//! which lowers reliability without ever computing an explicit interval.
//!
//! Every run is seeded explicitly so identical inputs reproduce identical
//! statistics. Regression tests and the calibration loop depend on that –
//! absent real new data the pipeline must not drift from run to run.

use crate::utils::error::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Default RNG seed for estimator runs.
pub const DEFAULT_SEED: u64 = 42;

/// Default number of resampled trials.
pub const DEFAULT_SIMULATIONS: usize = 4000;

/// Smallest simulation count that still gives stable statistics.
pub const MIN_SIMULATIONS: usize = 100;

/// Aggregate statistics of one resampling run.
/// Deterministic given `(seed, inputs)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MonteCarloResult {
    /// Arithmetic mean of the clamped samples, in [0,1]
    pub mean_confidence: f64,
    /// 1 − variance·3.5, clamped to [0,1]
    pub reliability_score: f64,
    /// Dispersion- and volatility-discounted stability, in [0,100]
    pub stability_index: f64,
    /// mean·reliability·120, clamped to [0,100]
    pub reflective_integrity: f64,
}

/// Monte Carlo estimator with a fixed trial count and seed.
#[derive(Debug, Clone)]
pub struct MonteCarloEstimator {
    simulations: usize,
    seed: u64,
}

impl Default for MonteCarloEstimator {
    fn default() -> Self {
        Self { simulations: DEFAULT_SIMULATIONS, seed: DEFAULT_SEED }
    }
}

impl MonteCarloEstimator {
    /// Create an estimator. `simulations` below the minimum is rejected –
    /// tiny runs produce garbage variance estimates.
    pub fn new(simulations: usize, seed: u64) -> Result<Self> {
        if simulations < MIN_SIMULATIONS {
            return Err(Error::InvalidArgument(format!(
                "simulation count must be at least {}, got {}",
                MIN_SIMULATIONS, simulations
            )));
        }
        Ok(Self { simulations, seed })
    }

    pub fn simulations(&self) -> usize {
        self.simulations
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run the resampling trial.
    ///
    /// * `base_bias` – neutralized bias in [0,1]
    /// * `coherence` – reflective coherence factor in [0,100]
    /// * `volatility` – normalized volatility in [0,1]
    /// * `confidence_weight` – calibration weight applied to the bias
    pub fn run(
        &self,
        base_bias: f64,
        coherence: f64,
        volatility: f64,
        confidence_weight: f64,
    ) -> MonteCarloResult {
        let weighted_bias = (base_bias * confidence_weight).clamp(0.0, 1.0);
        let coherence_lift = (coherence / 100.0 - 0.5) * 0.2;
        let sigma = 0.05 + volatility * 0.08;

        let mut rng = StdRng::seed_from_u64(self.seed);
        // sigma > 0 for all finite volatility, so this cannot fail
        let noise = Normal::new(0.0, sigma)
            .unwrap_or_else(|_| Normal::new(0.0, 0.05).expect("fixed sigma is valid"));

        let mut samples = Vec::with_capacity(self.simulations);
        for _ in 0..self.simulations {
            let sample: f64 = weighted_bias + coherence_lift + noise.sample(&mut rng);
            samples.push(sample.clamp(0.0, 1.0));
        }

        let n = samples.len() as f64;
        let mean_confidence = samples.iter().sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|x| (x - mean_confidence).powi(2))
            .sum::<f64>()
            / n;

        let reliability_score = (1.0 - variance * 3.5).clamp(0.0, 1.0);
        let stability_index = ((1.0 - variance) * 100.0 * (1.0 - volatility * 0.2)).clamp(0.0, 100.0);
        let reflective_integrity =
            (mean_confidence * reliability_score * 120.0).clamp(0.0, 100.0);

        MonteCarloResult {
            mean_confidence,
            reliability_score,
            stability_index,
            reflective_integrity,
        }
    }
}
