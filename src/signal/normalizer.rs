//! Signal normalization.
//!
//! Heterogeneous raw inputs arrive on arbitrary scales; everything downstream
//! assumes [0,1]. Out-of-range values saturate rather than error, and a
//! missing source defaults to the neutral midpoint. The function is pure –
//! the Monte Carlo layer's reproducibility guarantee depends on it.

use crate::utils::types::SignalSet;
use serde::{Deserialize, Serialize};

/// Fully-populated, range-clamped signal inputs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NormalizedSignals {
    pub fundamental: f64,
    pub technical_fusion: f64,
    pub sentiment: f64,
    pub volatility: f64,
}

/// Neutral midpoint used for missing sources.
pub const NEUTRAL_MIDPOINT: f64 = 0.5;

fn clamp_unit(value: Option<f64>) -> f64 {
    match value {
        | Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        // Missing or non-finite sources carry no information.
        | _ => NEUTRAL_MIDPOINT,
    }
}

/// Map every field of a raw [`SignalSet`] into [0,1].
pub fn normalize(raw: &SignalSet) -> NormalizedSignals {
    NormalizedSignals {
        fundamental: clamp_unit(raw.fundamental),
        technical_fusion: clamp_unit(raw.technical_fusion),
        sentiment: clamp_unit(raw.sentiment),
        volatility: clamp_unit(raw.volatility),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_values_pass_through() {
        let raw = SignalSet::new(0.7, 0.3, 0.55, 0.2);
        let normalized = normalize(&raw);
        assert!((normalized.fundamental - 0.7).abs() < 1e-12);
        assert!((normalized.technical_fusion - 0.3).abs() < 1e-12);
        assert!((normalized.sentiment - 0.55).abs() < 1e-12);
        assert!((normalized.volatility - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_values_saturate() {
        let raw = SignalSet::new(3.5, -2.0, 1.0001, -0.0001);
        let normalized = normalize(&raw);
        assert_eq!(normalized.fundamental, 1.0);
        assert_eq!(normalized.technical_fusion, 0.0);
        assert_eq!(normalized.sentiment, 1.0);
        assert_eq!(normalized.volatility, 0.0);
    }

    #[test]
    fn test_missing_sources_default_to_midpoint() {
        let normalized = normalize(&SignalSet::default());
        assert_eq!(normalized.fundamental, NEUTRAL_MIDPOINT);
        assert_eq!(normalized.technical_fusion, NEUTRAL_MIDPOINT);
        assert_eq!(normalized.sentiment, NEUTRAL_MIDPOINT);
        assert_eq!(normalized.volatility, NEUTRAL_MIDPOINT);
    }

    #[test]
    fn test_non_finite_inputs_default_to_midpoint() {
        let raw = SignalSet::new(f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0.4);
        let normalized = normalize(&raw);
        assert_eq!(normalized.fundamental, NEUTRAL_MIDPOINT);
        assert_eq!(normalized.technical_fusion, NEUTRAL_MIDPOINT);
        assert_eq!(normalized.sentiment, NEUTRAL_MIDPOINT);
        assert!((normalized.volatility - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_referential_transparency() {
        let raw = SignalSet::new(0.9, 0.1, 0.5, 0.2);
        assert_eq!(normalize(&raw), normalize(&raw));
    }
}
