//! Configuration management for the risk engine.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Main configuration structure for the risk engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General application settings
    pub app: AppConfig,
    /// Bias neutralization settings
    pub fusion: FusionConfig,
    /// Monte Carlo simulation settings
    pub monte_carlo: MonteCarloConfig,
    /// Position sizing settings
    pub risk: RiskConfig,
    /// Feedback calibration settings
    pub calibration: CalibrationConfig,
}

/// Application-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log level (debug, info, warn, error)
    pub log_level: String,
}

/// Bias neutralization parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Volatility damping factor applied to the blended bias (0.28–0.30)
    pub volatility_damping: f64,
}

/// Monte Carlo simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Number of resampled trials per run (minimum 100)
    pub simulations: usize,
    /// Explicit RNG seed so runs are reproducible
    pub seed: u64,
}

/// Position sizing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Base risk fraction before confidence scaling (e.g. 0.01 = 1%)
    pub base_risk_fraction: f64,
    /// Hard ceiling on the adjusted risk fraction
    pub max_risk_fraction: f64,
}

/// Feedback calibration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Directory holding historical risk/outcome records
    pub history_dir: String,
    /// Maximum number of most-recent records loaded per cycle
    pub history_limit: usize,
    /// Minimum sample size before a new weight is fully trusted
    pub min_samples: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig { log_level: "info".to_string() },
            fusion: FusionConfig { volatility_damping: 0.29 },
            monte_carlo: MonteCarloConfig { simulations: 4000, seed: 42 },
            risk: RiskConfig { base_risk_fraction: 0.01, max_risk_fraction: 0.02 },
            calibration: CalibrationConfig {
                history_dir: "./data/risk_logs".to_string(),
                history_limit: 10,
                min_samples: 3,
            },
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration as a TOML string
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap()
    }
}
