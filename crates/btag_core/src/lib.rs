//! # btag_core - B-Jet Tagging Efficiency Correction Engine
//!
//! This library classifies jets as b-tagged or not against a configured
//! operating point and, for calibrated operating points, looks up a per-jet
//! scale factor for every requested systematic variation of the calibration.
//!
//! ## Features
//! - Operating-point catalog with calibration availability
//! - Per-event memoized tag decisions
//! - Scale-factor sequences in published variation order
//! - Sentinel values for out-of-acceptance jets and failed lookups

pub mod capability;
pub mod config;
pub mod corrector;
pub mod decision;
pub mod error;
pub mod jet;
pub mod operating_point;
pub mod output;
pub mod systematics;

pub use capability::{
    CalibrationEntry, CalibrationTable, CorrectionCurve, EfficiencyProvider, LookupResult,
    ProviderOptions, SelectionPredicate, TableEfficiencyProvider, ThresholdSelection,
};
pub use config::CorrectorConfig;
pub use corrector::{
    BtagCorrector, EventCorrections, JetCorrection, ACCEPTANCE_MAX_ABS_ETA, SF_LOOKUP_ERROR,
    SF_OUT_OF_ACCEPTANCE,
};
pub use error::{CorrectorError, Result};
pub use jet::{Event, Jet};
pub use operating_point::{CutFamily, OperatingPoint};
pub use output::OutputRecorder;
pub use systematics::{SystematicVariation, VariationRegistry};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
