//! Risk layer: feedback calibration and adaptive position sizing.

pub mod calibrator;
pub mod sizer;

pub use calibrator::{
    CalibrationState, CalibrationStatus, CalibrationSummary, HistoryRecord, RiskCalibrator,
};
pub use sizer::{RiskAssessment, RiskSizer, BASE_RISK_FRACTION, MAX_RISK_FRACTION};
