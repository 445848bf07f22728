//! Final confidence aggregation.
//!
//! Combines the neutralizer's fusion confidence with the Monte Carlo
//! reflective integrity into the single CONF score feeding position sizing.
//! The /1.1 divisor keeps the blend from reaching the theoretical maximum of
//! both halves at once: the engine is never fully certain.

use crate::fusion::monte_carlo::MonteCarloResult;
use crate::fusion::neutralizer::NeutralizedBias;

/// Conservative damper applied to the blended score.
const CONSERVATIVE_DIVISOR: f64 = 1.1;

/// Produce the final CONF score on a 0–100 scale.
pub fn aggregate(bias: &NeutralizedBias, mc: &MonteCarloResult) -> f64 {
    ((bias.fusion_confidence * 0.5 + mc.reflective_integrity * 0.5) / CONSERVATIVE_DIVISOR)
        .clamp(0.0, 100.0)
}
