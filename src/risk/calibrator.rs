//! Feedback calibration of the confidence weight.
//!
//! The engine's self-correction loop: recent risk/outcome records are folded
//! into a confidence-weight multiplier that corrects systematic over- or
//! under-confidence. This is the only place state crosses cycle boundaries.
//! A cycle loads history, computes a summary in memory, then atomically
//! replaces the persisted snapshot (write-to-temp-then-rename) so a
//! concurrent reader only ever observes a complete snapshot.

use crate::utils::error::Result;
use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

/// File name of the calibration snapshot inside the history directory.
pub const SNAPSHOT_FILE: &str = "calibration_snapshot.json";

/// Bounds of the confidence weight.
pub const MIN_WEIGHT: f64 = 0.5;
pub const MAX_WEIGHT: f64 = 1.5;

/// Drawdown level above which the weight is penalized.
const DRAWDOWN_BRAKE_THRESHOLD: f64 = 0.10;
const DRAWDOWN_BRAKE_FACTOR: f64 = 0.85;

/// One historical risk/outcome record.
///
/// The on-disk contract is a flat key-value map; unknown keys are ignored,
/// missing keys default (`confidence` to 0.5, drawdown-like metrics to 0.0).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub drawdown: f64,
    #[serde(default)]
    pub error: f64,
    #[serde(default)]
    pub drift: f64,
}

fn default_confidence() -> f64 {
    0.5
}

/// Outcome status of one calibration cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalibrationStatus {
    NoData,
    Ready,
}

/// Result of one calibration cycle; persisted as the sole side effect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibrationSummary {
    pub status: CalibrationStatus,
    pub new_confidence_weight: f64,
    pub sample_size: usize,
}

/// Snapshot document written to disk each cycle (overwritten, not appended).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotDocument {
    new_confidence_weight: f64,
    sample_size: usize,
    status: CalibrationStatus,
    timestamp: String,
}

/// Injectable shared calibration weight.
///
/// Readers take a snapshot copy; writers replace the whole value. No hidden
/// module-level singletons.
#[derive(Debug, Clone)]
pub struct CalibrationState {
    weight: Arc<RwLock<f64>>,
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl CalibrationState {
    /// Create a state with an explicit starting weight (1.0 on cold start).
    pub fn new(weight: f64) -> Self {
        Self { weight: Arc::new(RwLock::new(weight.clamp(MIN_WEIGHT, MAX_WEIGHT))) }
    }

    /// Current weight snapshot.
    pub fn weight(&self) -> f64 {
        *self.weight.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the weight with a newly calibrated value.
    pub fn replace(&self, weight: f64) {
        let mut guard = self
            .weight
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = weight.clamp(MIN_WEIGHT, MAX_WEIGHT);
    }
}

/// Calibrates the confidence weight from stored risk history.
#[derive(Debug, Clone)]
pub struct RiskCalibrator {
    history_dir: PathBuf,
    state: CalibrationState,
    min_samples: usize,
}

impl RiskCalibrator {
    /// Create a calibrator over a history directory, creating it if needed.
    pub fn new<P: AsRef<Path>>(
        history_dir: P,
        state: CalibrationState,
        min_samples: usize,
    ) -> Result<Self> {
        let history_dir = history_dir.as_ref().to_path_buf();
        fs::create_dir_all(&history_dir)?;
        Ok(Self { history_dir, state, min_samples: min_samples.max(1) })
    }

    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    pub fn history_dir(&self) -> &Path {
        &self.history_dir
    }

    fn snapshot_path(&self) -> PathBuf {
        self.history_dir.join(SNAPSHOT_FILE)
    }

    /// Load up to `limit` most-recent history records (newest first by
    /// modification time). Malformed or unreadable records are skipped
    /// individually; one bad record never aborts the batch.
    pub fn load_history(&self, limit: usize) -> Vec<HistoryRecord> {
        let entries = match fs::read_dir(&self.history_dir) {
            | Ok(entries) => entries,
            | Err(err) => {
                warn!("Cannot read history directory {:?}: {}", self.history_dir, err);
                return Vec::new();
            }
        };

        let mut files: Vec<(PathBuf, SystemTime)> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().map(|ext| ext == "json").unwrap_or(false)
                    && path.file_name() != Some(std::ffi::OsStr::new(SNAPSHOT_FILE))
            })
            .filter_map(|path| {
                let mtime = path.metadata().and_then(|m| m.modified()).ok()?;
                Some((path, mtime))
            })
            .collect();
        files.sort_by(|a, b| b.1.cmp(&a.1));

        let mut records = Vec::new();
        for (path, _) in files.into_iter().take(limit) {
            match fs::read_to_string(&path) {
                | Ok(content) => match serde_json::from_str::<HistoryRecord>(&content) {
                    | Ok(record) => records.push(record),
                    | Err(err) => warn!("Skipping malformed history record {:?}: {}", path, err),
                },
                | Err(err) => warn!("Skipping unreadable history record {:?}: {}", path, err),
            }
        }
        debug!("Loaded {} history records from {:?}", records.len(), self.history_dir);
        records
    }

    /// Derive a new confidence weight from history.
    ///
    /// Empty history leaves the weight unchanged and reports `NO_DATA`.
    /// Average confidence above/below 0.5 shifts the weight up/down; a run
    /// of large realized drawdowns applies a negative-feedback brake. Below
    /// the minimum sample size the new weight is only partially trusted and
    /// blended toward the previous one.
    pub fn calibrate(&self, history: &[HistoryRecord]) -> CalibrationSummary {
        let previous_weight = self.state.weight();

        if history.is_empty() {
            return CalibrationSummary {
                status: CalibrationStatus::NoData,
                new_confidence_weight: previous_weight,
                sample_size: 0,
            };
        }

        let sample_size = history.len();
        let avg_confidence =
            history.iter().map(|r| r.confidence).sum::<f64>() / sample_size as f64;
        let avg_drawdown =
            history.iter().map(|r| r.drawdown.abs()).sum::<f64>() / sample_size as f64;

        let mut weight = 1.0 + (avg_confidence - 0.5) * 0.5;
        if avg_drawdown > DRAWDOWN_BRAKE_THRESHOLD {
            weight *= DRAWDOWN_BRAKE_FACTOR;
        }

        // Small-sample gate: a single record must not swing the weight to an
        // extreme, so trust grows linearly with the sample size.
        if sample_size < self.min_samples {
            let trust = sample_size as f64 / self.min_samples as f64;
            weight = previous_weight + (weight - previous_weight) * trust;
        }

        let weight = weight.clamp(MIN_WEIGHT, MAX_WEIGHT);
        debug!(
            "Calibrated weight {:.4} from {} samples (avg confidence {:.4}, avg drawdown {:.4})",
            weight, sample_size, avg_confidence, avg_drawdown
        );

        CalibrationSummary {
            status: CalibrationStatus::Ready,
            new_confidence_weight: weight,
            sample_size,
        }
    }

    /// Persist the summary snapshot, overwriting the previous one.
    ///
    /// Written to a temp file then renamed so a concurrent reader never
    /// observes a half-written snapshot. Failure is reported as `None` –
    /// calibration continuing without persistence is acceptable degraded
    /// behavior, never a crash.
    pub fn persist(&self, summary: &CalibrationSummary) -> Option<PathBuf> {
        let document = SnapshotDocument {
            new_confidence_weight: summary.new_confidence_weight,
            sample_size: summary.sample_size,
            status: summary.status,
            timestamp: Utc::now().to_rfc3339(),
        };
        let payload = match serde_json::to_string_pretty(&document) {
            | Ok(payload) => payload,
            | Err(err) => {
                warn!("Cannot serialize calibration snapshot: {}", err);
                return None;
            }
        };

        let final_path = self.snapshot_path();
        let temp_path = self.history_dir.join(format!(".{}.tmp", SNAPSHOT_FILE));
        if let Err(err) = fs::write(&temp_path, payload) {
            warn!("Cannot write calibration snapshot {:?}: {}", temp_path, err);
            return None;
        }
        if let Err(err) = fs::rename(&temp_path, &final_path) {
            warn!("Cannot publish calibration snapshot {:?}: {}", final_path, err);
            fs::remove_file(&temp_path).ok();
            return None;
        }
        Some(final_path)
    }

    /// Reload the last persisted weight into the shared state.
    /// Missing or corrupt snapshots are ignored (cold-start behavior).
    pub fn hydrate(&self) {
        let path = self.snapshot_path();
        let content = match fs::read_to_string(&path) {
            | Ok(content) => content,
            | Err(_) => return,
        };
        match serde_json::from_str::<SnapshotDocument>(&content) {
            | Ok(document) => self.state.replace(document.new_confidence_weight),
            | Err(err) => warn!("Ignoring corrupt calibration snapshot {:?}: {}", path, err),
        }
    }

    /// Execute one full calibration cycle: load, calibrate, persist, swap.
    pub fn run_cycle(&self, limit: usize) -> (CalibrationSummary, Option<PathBuf>) {
        let history = self.load_history(limit);
        let summary = self.calibrate(&history);
        let path = self.persist(&summary);
        if summary.status == CalibrationStatus::Ready {
            self.state.replace(summary.new_confidence_weight);
        }
        (summary, path)
    }
}
