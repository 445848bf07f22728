//! Common types used throughout the risk engine.

use crate::utils::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Raw signal inputs for one evaluation.
///
/// Every field is independently optional; a missing source defaults to the
/// neutral midpoint 0.5 during normalization. Values are unbounded here –
/// the normalizer clamps them into [0,1].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SignalSet {
    /// Macro/fundamental bias score
    pub fundamental: Option<f64>,
    /// Technical fusion bias output
    pub technical_fusion: Option<f64>,
    /// Market sentiment index
    pub sentiment: Option<f64>,
    /// Volatility index, already rescaled by the upstream feed
    pub volatility: Option<f64>,
}

impl SignalSet {
    pub fn new(
        fundamental: f64,
        technical_fusion: f64,
        sentiment: f64,
        volatility: f64,
    ) -> Self {
        Self {
            fundamental: Some(fundamental),
            technical_fusion: Some(technical_fusion),
            sentiment: Some(sentiment),
            volatility: Some(volatility),
        }
    }
}

/// Operating mode of the sizer.
///
/// Reflexive mode deliberately under-sizes (assumes lower conviction),
/// aggressive over-sizes within the hard risk ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeMode {
    Normal,
    Reflexive,
    Aggressive,
}

impl TradeMode {
    /// Sizing multiplier applied on top of the confidence-scaled base risk.
    pub fn multiplier(&self) -> f64 {
        match self {
            | TradeMode::Normal => 1.0,
            | TradeMode::Reflexive => 0.9,
            | TradeMode::Aggressive => 1.2,
        }
    }

    /// Derive a mode from the trade context when the caller supplies none.
    ///
    /// Deep drawdown forces reflexive sizing; only near-certain setups in a
    /// healthy account qualify for aggressive sizing.
    pub fn infer(drawdown: f64, confidence: f64) -> Self {
        if drawdown >= 0.12 {
            TradeMode::Reflexive
        } else if confidence >= 0.93 && drawdown <= 0.05 {
            TradeMode::Aggressive
        } else {
            TradeMode::Normal
        }
    }
}

impl FromStr for TradeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            | "normal" => Ok(TradeMode::Normal),
            | "reflexive" => Ok(TradeMode::Reflexive),
            | "aggressive" => Ok(TradeMode::Aggressive),
            | other => Err(Error::InvalidArgument(format!(
                "unrecognized trade mode: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for TradeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            | TradeMode::Normal => write!(f, "normal"),
            | TradeMode::Reflexive => write!(f, "reflexive"),
            | TradeMode::Aggressive => write!(f, "aggressive"),
        }
    }
}

/// Directional state of the neutralized bias.
///
/// Thresholds are asymmetric around 0.5 (0.62 / 0.38) so a meaningful
/// margin is required before committing to a directional call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BiasState {
    Bullish,
    Bearish,
    Neutral,
}

impl BiasState {
    /// Classify a neutralized bias value.
    pub fn from_bias(value: f64) -> Self {
        if value >= 0.62 {
            BiasState::Bullish
        } else if value <= 0.38 {
            BiasState::Bearish
        } else {
            BiasState::Neutral
        }
    }
}

impl std::fmt::Display for BiasState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            | BiasState::Bullish => write!(f, "BULLISH"),
            | BiasState::Bearish => write!(f, "BEARISH"),
            | BiasState::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// One evaluation request into the pipeline.
///
/// All numeric fields are consumer-supplied doubles; `mode` may be omitted
/// and is then inferred from drawdown and confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRequest {
    #[serde(flatten)]
    pub signals: SignalSet,
    pub balance: f64,
    #[serde(default)]
    pub drawdown: f64,
    #[serde(default)]
    pub mode: Option<TradeMode>,
    pub entry_price: f64,
    pub stop_loss: f64,
    /// Per-pip monetary value; resolved from `pair` when absent.
    #[serde(default)]
    pub pip_value: Option<f64>,
    /// Trading pair symbol (e.g. "EUR/USD"), used for pip-value resolution.
    #[serde(default)]
    pub pair: Option<String>,
}

impl RiskRequest {
    /// Resolve the effective pip value: explicit wins, JPY pairs quote at
    /// 9.1 per pip, everything else at 10.0.
    pub fn resolve_pip_value(&self) -> f64 {
        if let Some(pip) = self.pip_value {
            return pip;
        }
        match &self.pair {
            | Some(pair) if pair.to_uppercase().contains("JPY") => 9.1,
            | _ => 10.0,
        }
    }
}
