//! Operating-point catalog.
//!
//! Static knowledge of the legal b-tagging operating points: which names are
//! known, which of them are calibrated (scale factors available), and how a
//! calibrated name maps to the label the calibration table uses internally.
//!
//! The cut-string table must stay in lock-step with the calibration data
//! interface naming convention; it is the one hard dependency this crate has
//! on that convention.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::error::{CorrectorError, Result};

pub const FIXED_CUT_PREFIX: &str = "FixedCutBEff_";
pub const FLAT_CUT_PREFIX: &str = "FlatCutBEff_";

/// Known fixed-cut efficiency points.
const FIXED_CUT_EFFICIENCIES: [u32; 8] = [30, 50, 60, 70, 77, 80, 85, 90];

/// The subset of fixed-cut points with scale-factor calibrations.
const CALIBRATED_EFFICIENCIES: [u32; 4] = [60, 70, 77, 85];

/// Known flat-efficiency points. None are calibrated.
const FLAT_CUT_EFFICIENCIES: [u32; 7] = [30, 40, 50, 60, 70, 77, 85];

/// MV2c20 cut strings as the calibration table names them, keyed by fixed-cut
/// efficiency. Only calibrated points appear here.
static MV2C20_CUT_LABELS: Lazy<HashMap<u32, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (60, "0_4496"),
        (70, "-0_0436"),
        (77, "-0_4434"),
        (85, "-0_7887"),
    ])
});

/// Which cut family an operating point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutFamily {
    /// Fixed discriminant cut, quoted by its b-efficiency on a reference
    /// sample.
    FixedCut,
    /// Flat-efficiency (variable) cut.
    FlatCut,
}

/// A validated operating point.
///
/// Constructed only through [`OperatingPoint::validate`]; an instance always
/// names a known point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatingPoint {
    name: String,
    family: CutFamily,
    efficiency: u32,
    cdi_label: Option<String>,
}

impl OperatingPoint {
    /// Validate an operating-point name against the catalog.
    ///
    /// Unknown names fail with `ConfigurationError` so setup aborts before
    /// any capability is constructed.
    pub fn validate(name: &str) -> Result<Self> {
        if let Some(eff) = parse_efficiency(name, FIXED_CUT_PREFIX) {
            if FIXED_CUT_EFFICIENCIES.contains(&eff) {
                let cdi_label = MV2C20_CUT_LABELS.get(&eff).map(|s| s.to_string());
                return Ok(Self {
                    name: name.to_string(),
                    family: CutFamily::FixedCut,
                    efficiency: eff,
                    cdi_label,
                });
            }
        }
        if let Some(eff) = parse_efficiency(name, FLAT_CUT_PREFIX) {
            if FLAT_CUT_EFFICIENCIES.contains(&eff) {
                return Ok(Self {
                    name: name.to_string(),
                    family: CutFamily::FlatCut,
                    efficiency: eff,
                    cdi_label: None,
                });
            }
        }
        Err(CorrectorError::Configuration(format!(
            "unknown operating point: {name}"
        )))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> CutFamily {
        self.family
    }

    /// Quoted b-efficiency in percent.
    pub fn efficiency(&self) -> u32 {
        self.efficiency
    }

    /// True when scale factors are available for this point.
    pub fn is_calibrated(&self) -> bool {
        self.cdi_label.is_some()
    }

    /// The label the calibration table uses for this point. `None` for
    /// decision-only points.
    pub fn cdi_label(&self) -> Option<&str> {
        self.cdi_label.as_deref()
    }
}

fn parse_efficiency(name: &str, prefix: &str) -> Option<u32> {
    name.strip_prefix(prefix)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibrated_fixed_cut_points() {
        for eff in CALIBRATED_EFFICIENCIES {
            let op = OperatingPoint::validate(&format!("FixedCutBEff_{eff}")).unwrap();
            assert!(op.is_calibrated(), "FixedCutBEff_{eff} should be calibrated");
            assert_eq!(op.family(), CutFamily::FixedCut);
            assert!(op.cdi_label().is_some());
        }
    }

    #[test]
    fn decision_only_fixed_cut_points() {
        for eff in [30, 50, 80, 90] {
            let op = OperatingPoint::validate(&format!("FixedCutBEff_{eff}")).unwrap();
            assert!(!op.is_calibrated(), "FixedCutBEff_{eff} is not calibrated");
            assert!(op.cdi_label().is_none());
        }
    }

    #[test]
    fn flat_cut_points_are_known_but_uncalibrated() {
        for eff in FLAT_CUT_EFFICIENCIES {
            let op = OperatingPoint::validate(&format!("FlatCutBEff_{eff}")).unwrap();
            assert_eq!(op.family(), CutFamily::FlatCut);
            assert!(!op.is_calibrated());
        }
    }

    #[test]
    fn unknown_names_fail_validation() {
        for name in ["FixedCutBEff_42", "FlatCutBEff_90", "Loose", "", "FixedCutBEff_"] {
            let err = OperatingPoint::validate(name).unwrap_err();
            assert!(matches!(err, CorrectorError::Configuration(_)), "{name} should be rejected");
        }
    }

    #[test]
    fn cdi_labels_follow_the_mv2c20_convention() {
        let op = OperatingPoint::validate("FixedCutBEff_77").unwrap();
        assert_eq!(op.cdi_label(), Some("-0_4434"));
        let op = OperatingPoint::validate("FixedCutBEff_60").unwrap();
        assert_eq!(op.cdi_label(), Some("0_4496"));
    }
}
