//! Bias neutralization.
//!
//! Blends the normalized signal sources into a single directional bias and
//! derives a reflective-coherence score that penalizes disagreement between
//! the fundamental and technical sources. Coherence is a *trust* signal,
//! distinct from the bias direction itself.

use crate::signal::NormalizedSignals;
use crate::utils::types::BiasState;
use serde::{Deserialize, Serialize};

/// Blend weights over the directional sources.
const FUNDAMENTAL_WEIGHT: f64 = 0.5;
const TECHNICAL_WEIGHT: f64 = 0.3;
const SENTIMENT_WEIGHT: f64 = 0.2;

/// Default volatility damping factor (valid range 0.28–0.30).
pub const DEFAULT_VOLATILITY_DAMPING: f64 = 0.29;

/// Result of one neutralization pass. Never mutated after creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NeutralizedBias {
    /// Blended, volatility-damped directional bias in [0,1]
    pub value: f64,
    /// Directional classification of `value`
    pub state: BiasState,
    /// Agreement score between the primary sources, in [50,96]
    pub reflective_coherence: f64,
    /// Pre-Monte-Carlo confidence in [30,99]
    pub fusion_confidence: f64,
}

/// Core bias neutralizer.
#[derive(Debug, Clone)]
pub struct BiasNeutralizer {
    damping_factor: f64,
}

impl Default for BiasNeutralizer {
    fn default() -> Self {
        Self::new(DEFAULT_VOLATILITY_DAMPING)
    }
}

impl BiasNeutralizer {
    /// Create a neutralizer with an explicit damping factor.
    /// The factor is clamped into its valid band.
    pub fn new(damping_factor: f64) -> Self {
        Self { damping_factor: damping_factor.clamp(0.28, 0.30) }
    }

    /// Blend normalized signals into a neutralized bias.
    ///
    /// High volatility systematically pulls the bias toward neutral: strong
    /// directional signals are not trusted during turbulent regimes. Total
    /// function – never errors for any pre-clamped input.
    pub fn neutralize(&self, signals: &NormalizedSignals) -> NeutralizedBias {
        let blended = signals.fundamental * FUNDAMENTAL_WEIGHT
            + signals.technical_fusion * TECHNICAL_WEIGHT
            + signals.sentiment * SENTIMENT_WEIGHT;
        let damped = (blended * (1.0 - signals.volatility * self.damping_factor)).clamp(0.0, 1.0);

        // Coherence falls when the two primary sources disagree or when
        // volatility is high.
        let divergence = (signals.fundamental - signals.technical_fusion).abs();
        let reflective_coherence =
            (90.0 - divergence * 40.0 - signals.volatility * 15.0).clamp(50.0, 96.0);

        let fusion_confidence =
            (reflective_coherence * 0.92 + (1.0 - signals.volatility) * 9.0).clamp(30.0, 99.0);

        NeutralizedBias {
            value: damped,
            state: BiasState::from_bias(damped),
            reflective_coherence,
            fusion_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::normalize;
    use crate::utils::types::SignalSet;

    fn neutralize(f: f64, t: f64, s: f64, v: f64) -> NeutralizedBias {
        BiasNeutralizer::default().neutralize(&normalize(&SignalSet::new(f, t, s, v)))
    }

    #[test]
    fn test_bias_stays_bounded() {
        for &(f, t, s, v) in &[
            (0.0, 0.0, 0.0, 0.0),
            (1.0, 1.0, 1.0, 0.0),
            (1.0, 1.0, 1.0, 1.0),
            (0.9, 0.1, 0.5, 0.2),
            (100.0, -100.0, 50.0, 7.0),
        ] {
            let result = neutralize(f, t, s, v);
            assert!(result.value >= 0.0 && result.value <= 1.0);
            assert!(result.reflective_coherence >= 50.0 && result.reflective_coherence <= 96.0);
            assert!(result.fusion_confidence >= 30.0 && result.fusion_confidence <= 99.0);
        }
    }

    #[test]
    fn test_volatility_dampens_bias() {
        let calm = neutralize(0.9, 0.9, 0.9, 0.0);
        let turbulent = neutralize(0.9, 0.9, 0.9, 1.0);
        assert!(turbulent.value < calm.value);
    }

    #[test]
    fn test_disagreement_penalty() {
        let conflicted = neutralize(0.9, 0.1, 0.5, 0.2);
        let agreeing = neutralize(0.9, 0.9, 0.5, 0.2);
        assert!(conflicted.reflective_coherence < agreeing.reflective_coherence);
    }

    #[test]
    fn test_state_classification() {
        // All sources fully bullish, no volatility: blended = 1.0
        assert_eq!(neutralize(1.0, 1.0, 1.0, 0.0).state, BiasState::Bullish);
        assert_eq!(neutralize(0.0, 0.0, 0.0, 0.0).state, BiasState::Bearish);
        assert_eq!(neutralize(0.5, 0.5, 0.5, 0.0).state, BiasState::Neutral);
    }

    #[test]
    fn test_strong_signal_pulled_neutral_by_volatility() {
        // A clear bullish consensus loses its directional state once
        // volatility damping bites.
        let calm = neutralize(0.7, 0.7, 0.7, 0.0);
        let turbulent = neutralize(0.7, 0.7, 0.7, 1.0);
        assert_eq!(calm.state, BiasState::Bullish);
        assert_ne!(turbulent.state, BiasState::Bullish);
    }

    #[test]
    fn test_damping_factor_clamped_to_band() {
        let neutralizer = BiasNeutralizer::new(0.9);
        let signals = normalize(&SignalSet::new(1.0, 1.0, 1.0, 1.0));
        let result = neutralizer.neutralize(&signals);
        // With the factor clamped to 0.30 the damped bias stays at 0.70.
        assert!((result.value - 0.70).abs() < 1e-12);
    }
}
