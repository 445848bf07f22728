//! Adaptive position sizing.
//!
//! Converts final confidence, calibration weight, drawdown level and trading
//! mode into a bounded risk fraction, then into a monetary risk amount and
//! lot size given entry/stop prices. Malformed price inputs are caller bugs
//! and fail fast; a zero stop distance is valid-but-degenerate and sizes to
//! zero instead.

use crate::utils::error::{Error, Result};
use crate::utils::types::TradeMode;
use serde::{Deserialize, Serialize};

/// Base risk fraction before confidence scaling (1% of balance).
pub const BASE_RISK_FRACTION: f64 = 0.01;

/// Hard ceiling on the adjusted risk fraction (2% of balance).
pub const MAX_RISK_FRACTION: f64 = 0.02;

/// Pips per unit of price distance for 4-decimal quoted pairs.
const PIPS_PER_PRICE_UNIT: f64 = 10_000.0;

/// Final sizing decision for one evaluation request. Immutable; consumed by
/// the execution collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub balance: f64,
    /// Realized drawdown as a fraction of balance
    pub drawdown: f64,
    /// Final confidence in [0,1]
    pub confidence: f64,
    pub mode: TradeMode,
    /// Confidence- and mode-scaled fraction before throttles
    pub dynamic_fraction: f64,
    /// Bounded final risk fraction in [0, MAX_RISK_FRACTION]
    pub risk_fraction: f64,
    /// Monetary risk at the adjusted fraction
    pub risk_amount: f64,
    /// Position size; 0.0 when there is no valid stop distance
    pub lot_size: f64,
}

/// Adaptive risk sizer with configurable base and ceiling fractions.
#[derive(Debug, Clone)]
pub struct RiskSizer {
    base_risk: f64,
    max_risk: f64,
}

impl Default for RiskSizer {
    fn default() -> Self {
        Self { base_risk: BASE_RISK_FRACTION, max_risk: MAX_RISK_FRACTION }
    }
}

impl RiskSizer {
    pub fn new(base_risk: f64, max_risk: f64) -> Self {
        Self { base_risk: base_risk.max(0.0), max_risk: max_risk.max(0.0) }
    }

    pub fn max_risk(&self) -> f64 {
        self.max_risk
    }

    /// Confidence- and mode-scaled risk fraction before throttles.
    /// Monotonically non-decreasing in `confidence`.
    pub fn dynamic_fraction(&self, confidence: f64, mode: TradeMode) -> f64 {
        let confidence = confidence.clamp(0.0, 1.0);
        self.base_risk * (0.85 + 0.75 * confidence) * mode.multiplier()
    }

    /// Step-function throttle keyed to realized drawdown. Beyond 15% the
    /// kill-switch zeroes all new risk.
    pub fn drawdown_multiplier(&self, drawdown: f64) -> Result<f64> {
        if drawdown < 0.0 {
            return Err(Error::InvalidArgument(
                "drawdown cannot be negative".to_string(),
            ));
        }
        Ok(if drawdown <= 0.05 {
            1.0
        } else if drawdown <= 0.10 {
            0.75
        } else if drawdown <= 0.15 {
            0.5
        } else {
            0.0
        })
    }

    /// Lot size from the risk amount and stop distance.
    /// Returns 0.0 for a zero stop distance (no position, not an error).
    fn lot_size(
        &self,
        risk_amount: f64,
        entry_price: f64,
        stop_loss: f64,
        pip_value: f64,
    ) -> f64 {
        let price_distance = (entry_price - stop_loss).abs();
        if price_distance == 0.0 {
            return 0.0;
        }
        let pip_distance = price_distance * PIPS_PER_PRICE_UNIT;
        let per_lot_risk = pip_distance * pip_value;
        round2(risk_amount / per_lot_risk)
    }

    /// Calculate the adaptive risk exposure for a trade context.
    ///
    /// * `confidence` – final CONF on the 0–1 scale
    /// * `calibration_weight` – feedback multiplier from the calibrator
    ///
    /// Drawdown supplied as a percentage (value > 1) is normalized to a
    /// fraction first.
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_risk(
        &self,
        balance: f64,
        drawdown: f64,
        confidence: f64,
        mode: TradeMode,
        entry_price: f64,
        stop_loss: f64,
        pip_value: f64,
        calibration_weight: f64,
    ) -> Result<RiskAssessment> {
        if balance <= 0.0 {
            return Err(Error::InvalidArgument("balance must be positive".to_string()));
        }
        if pip_value <= 0.0 {
            return Err(Error::InvalidArgument("pip value must be positive".to_string()));
        }
        if entry_price <= 0.0 || stop_loss <= 0.0 {
            return Err(Error::InvalidArgument(
                "entry and stop loss must be positive".to_string(),
            ));
        }

        let drawdown_fraction = if drawdown > 1.0 { drawdown / 100.0 } else { drawdown };
        let confidence = confidence.clamp(0.0, 1.0);

        let dynamic_fraction = self.dynamic_fraction(confidence, mode);
        let drawdown_multiplier = self.drawdown_multiplier(drawdown_fraction)?;

        let adjusted_fraction = (dynamic_fraction * drawdown_multiplier * calibration_weight)
            .clamp(0.0, self.max_risk);
        let risk_amount = balance * adjusted_fraction;
        let lot_size = self.lot_size(risk_amount, entry_price, stop_loss, pip_value);

        Ok(RiskAssessment {
            balance: round2(balance),
            drawdown: round4(drawdown_fraction),
            confidence: round4(confidence),
            mode,
            dynamic_fraction: round4(dynamic_fraction),
            risk_fraction: round4(adjusted_fraction),
            risk_amount: round2(risk_amount),
            lot_size,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn sizer() -> RiskSizer {
        RiskSizer::default()
    }

    fn assess(
        balance: f64,
        drawdown: f64,
        confidence: f64,
        mode: TradeMode,
        weight: f64,
    ) -> RiskAssessment {
        sizer()
            .calculate_risk(balance, drawdown, confidence, mode, 1.25, 1.245, 10.0, weight)
            .unwrap()
    }

    #[test]
    fn test_basic_sizing() {
        let assessment = assess(10_000.0, 0.05, 0.8, TradeMode::Normal, 1.0);
        // dynamic = 0.01 * (0.85 + 0.6) = 0.0145; tier 1.0; weight 1.0
        assert!((assessment.dynamic_fraction - 0.0145).abs() < 1e-9);
        assert!((assessment.risk_fraction - 0.0145).abs() < 1e-9);
        assert!((assessment.risk_amount - 145.0).abs() < 1e-6);
        // 50 pips * $10/pip = $500 per lot -> 0.29 lots
        assert!((assessment.lot_size - 0.29).abs() < 1e-9);
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(0.05, 1.0)]
    #[case(0.08, 0.75)]
    #[case(0.10, 0.75)]
    #[case(0.12, 0.5)]
    #[case(0.15, 0.5)]
    #[case(0.151, 0.0)]
    #[case(0.20, 0.0)]
    fn test_drawdown_tiers(#[case] drawdown: f64, #[case] expected: f64) {
        assert!((sizer().drawdown_multiplier(drawdown).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_negative_drawdown_rejected() {
        assert_matches!(
            sizer().drawdown_multiplier(-0.01),
            Err(Error::InvalidArgument(_))
        );
    }

    #[test]
    fn test_kill_switch_zeroes_risk() {
        for mode in [TradeMode::Normal, TradeMode::Reflexive, TradeMode::Aggressive] {
            let assessment = assess(10_000.0, 0.20, 1.0, mode, 1.5);
            assert_eq!(assessment.risk_fraction, 0.0);
            assert_eq!(assessment.risk_amount, 0.0);
            assert_eq!(assessment.lot_size, 0.0);
        }
    }

    #[test]
    fn test_ceiling_never_exceeded() {
        // Maximal confidence, aggressive mode, maximal calibration weight.
        let assessment = assess(1_000_000.0, 0.0, 1.0, TradeMode::Aggressive, 1.5);
        assert!(assessment.risk_fraction <= MAX_RISK_FRACTION + 1e-12);
    }

    #[test]
    fn test_confidence_monotonicity() {
        let sizer = sizer();
        let mut previous = 0.0;
        for step in 0..=20 {
            let confidence = step as f64 / 20.0;
            let fraction = sizer.dynamic_fraction(confidence, TradeMode::Normal);
            assert!(fraction >= previous);
            previous = fraction;
        }
    }

    #[test]
    fn test_mode_ordering() {
        let sizer = sizer();
        let reflexive = sizer.dynamic_fraction(0.7, TradeMode::Reflexive);
        let normal = sizer.dynamic_fraction(0.7, TradeMode::Normal);
        let aggressive = sizer.dynamic_fraction(0.7, TradeMode::Aggressive);
        assert!(reflexive < normal);
        assert!(normal < aggressive);
    }

    #[test]
    fn test_zero_stop_distance_sizes_to_zero() {
        let assessment = sizer()
            .calculate_risk(10_000.0, 0.0, 0.8, TradeMode::Normal, 1.1, 1.1, 10.0, 1.0)
            .unwrap();
        assert_eq!(assessment.lot_size, 0.0);
        assert!(assessment.risk_fraction > 0.0);
    }

    #[test]
    fn test_validation_errors() {
        let sizer = sizer();
        assert_matches!(
            sizer.calculate_risk(0.0, 0.0, 0.8, TradeMode::Normal, 1.1, 1.095, 10.0, 1.0),
            Err(Error::InvalidArgument(_))
        );
        assert_matches!(
            sizer.calculate_risk(10_000.0, 0.0, 0.8, TradeMode::Normal, 1.1, 1.095, 0.0, 1.0),
            Err(Error::InvalidArgument(_))
        );
        assert_matches!(
            sizer.calculate_risk(10_000.0, 0.0, 0.8, TradeMode::Normal, -1.1, 1.095, 10.0, 1.0),
            Err(Error::InvalidArgument(_))
        );
        assert_matches!(
            sizer.calculate_risk(10_000.0, 0.0, 0.8, TradeMode::Normal, 1.1, 0.0, 10.0, 1.0),
            Err(Error::InvalidArgument(_))
        );
    }

    #[test]
    fn test_percentage_drawdown_normalized() {
        let pct = assess(10_000.0, 8.0, 0.8, TradeMode::Normal, 1.0);
        let frac = assess(10_000.0, 0.08, 0.8, TradeMode::Normal, 1.0);
        assert_eq!(pct.risk_fraction, frac.risk_fraction);
        assert!((pct.drawdown - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_calibration_weight_scales_risk() {
        let damped = assess(10_000.0, 0.0, 0.8, TradeMode::Normal, 0.5);
        let neutral = assess(10_000.0, 0.0, 0.8, TradeMode::Normal, 1.0);
        assert!(damped.risk_fraction < neutral.risk_fraction);
    }
}
