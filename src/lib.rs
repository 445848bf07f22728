//! # FusionRisk
//! Main library file for FusionRisk
//! An adaptive trade-confidence and position-sizing engine built in Rust.
//!
//! Raw signals flow through the normalizer, the bias neutralizer, the Monte
//! Carlo estimator and the confidence aggregator, then the adaptive sizer
//! turns the final CONF score into a bounded risk fraction and lot size.
//! The calibrator feeds realized outcomes back into the confidence weight.

pub use crate::utils::error::{Error, Result};

pub mod fusion;
pub mod risk;
pub mod signal;
pub mod utils;

use crate::fusion::{aggregate, BiasNeutralizer, MonteCarloEstimator, MonteCarloResult, NeutralizedBias};
use crate::risk::{
    CalibrationState, CalibrationSummary, RiskAssessment, RiskCalibrator, RiskSizer,
};
use crate::signal::normalize;
use crate::utils::config::Config;
use crate::utils::types::{RiskRequest, TradeMode};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Full evaluation record: the final sizing decision plus the intermediate
/// confidence artifacts, for the journaling collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskEvaluation {
    pub bias: NeutralizedBias,
    pub monte_carlo: MonteCarloResult,
    /// Final aggregated confidence on the 0–100 scale
    pub conf: f64,
    pub assessment: RiskAssessment,
}

/// Main engine that coordinates the confidence pipeline and the sizer.
pub struct RiskEngine {
    config: Config,
    neutralizer: BiasNeutralizer,
    estimator: MonteCarloEstimator,
    sizer: RiskSizer,
    calibrator: RiskCalibrator,
}

impl RiskEngine {
    /// Build an engine from configuration. Hydrates the calibration weight
    /// from the last persisted snapshot when one exists.
    pub fn new(config: Config) -> Result<Self> {
        let neutralizer = BiasNeutralizer::new(config.fusion.volatility_damping);
        let estimator =
            MonteCarloEstimator::new(config.monte_carlo.simulations, config.monte_carlo.seed)?;
        let sizer = RiskSizer::new(
            config.risk.base_risk_fraction,
            config.risk.max_risk_fraction,
        );
        let calibrator = RiskCalibrator::new(
            &config.calibration.history_dir,
            CalibrationState::default(),
            config.calibration.min_samples,
        )?;
        calibrator.hydrate();

        info!(
            "Risk engine initialized ({} simulations, seed {}, weight {:.4})",
            estimator.simulations(),
            estimator.seed(),
            calibrator.state().weight()
        );

        Ok(Self { config, neutralizer, estimator, sizer, calibrator })
    }

    /// Engine with default configuration (cold-start weight 1.0).
    pub fn with_defaults() -> Result<Self> {
        Self::new(Config::default())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn calibrator(&self) -> &RiskCalibrator {
        &self.calibrator
    }

    /// Current calibration weight snapshot.
    pub fn confidence_weight(&self) -> f64 {
        self.calibrator.state().weight()
    }

    /// Run one evaluation: normalize, neutralize, resample, aggregate, size.
    pub fn evaluate(&self, request: &RiskRequest) -> Result<RiskEvaluation> {
        let signals = normalize(&request.signals);
        let bias = self.neutralizer.neutralize(&signals);

        let weight = self.confidence_weight();
        let monte_carlo = self.estimator.run(
            bias.value,
            bias.reflective_coherence,
            signals.volatility,
            weight,
        );

        let conf = aggregate(&bias, &monte_carlo);
        let confidence = conf / 100.0;

        let drawdown_fraction = if request.drawdown > 1.0 {
            request.drawdown / 100.0
        } else {
            request.drawdown
        };
        let mode = request
            .mode
            .unwrap_or_else(|| TradeMode::infer(drawdown_fraction, confidence));

        let assessment = self.sizer.calculate_risk(
            request.balance,
            request.drawdown,
            confidence,
            mode,
            request.entry_price,
            request.stop_loss,
            request.resolve_pip_value(),
            weight,
        )?;

        debug!(
            "Evaluated request: bias {:.4} ({}), CONF {:.2}, fraction {:.4}, lots {:.2}",
            bias.value, bias.state, conf, assessment.risk_fraction, assessment.lot_size
        );

        Ok(RiskEvaluation { bias, monte_carlo, conf, assessment })
    }

    /// Execute one feedback calibration cycle and swap in the new weight.
    pub fn run_calibration(&self) -> CalibrationSummary {
        let (summary, path) = self
            .calibrator
            .run_cycle(self.config.calibration.history_limit);
        match &path {
            | Some(path) => info!(
                "Calibration cycle complete: weight {:.4} from {} samples (snapshot {:?})",
                summary.new_confidence_weight, summary.sample_size, path
            ),
            | None => info!(
                "Calibration cycle complete without persistence: weight {:.4} from {} samples",
                summary.new_confidence_weight, summary.sample_size
            ),
        }
        summary
    }
}
