//! Selection and efficiency capabilities.
//!
//! The corrector drives two capabilities through trait seams: a selection
//! predicate that classifies a jet as tagged or not, and an efficiency
//! provider that serves per-jet scale factors under a configured systematic
//! variation. Both are injected at setup; the implementations here are the
//! built-in ones (a threshold cut and a JSON-table-backed provider).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{CorrectorError, Result};
use crate::jet::Jet;
use crate::operating_point::OperatingPoint;
use crate::systematics::SystematicVariation;

/// Minimum transverse momentum for tag consideration, in MeV.
pub const SELECTION_MIN_PT: f64 = 20_000.0;

/// Maximum absolute pseudorapidity for tag consideration.
pub const SELECTION_MAX_ABS_ETA: f64 = 2.5;

/// Outcome of one scale-factor or efficiency lookup.
///
/// `OutOfValidityRange` still carries a usable value: beyond the validity
/// range the table pins the correction at its last valid point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LookupResult {
    Ok(f64),
    OutOfValidityRange(f64),
    Error,
}

impl LookupResult {
    pub fn value(&self) -> Option<f64> {
        match self {
            LookupResult::Ok(v) | LookupResult::OutOfValidityRange(v) => Some(*v),
            LookupResult::Error => None,
        }
    }
}

/// Tag decision capability: threshold-based accept/reject over kinematics and
/// the tag discriminant. The outcome does not depend on the systematic
/// variation applied to the efficiency provider.
pub trait SelectionPredicate {
    fn accept(&self, jet: &Jet) -> bool;
}

/// Scale-factor capability. One instance is exclusively owned by a corrector
/// for the life of the worker.
pub trait EfficiencyProvider {
    /// Configure the provider for a variation. Returns false when the
    /// variation is not supported.
    fn apply_variation(&mut self, variation: &SystematicVariation) -> bool;

    /// Efficiency scale factor for a tagged jet under the current variation.
    fn scale_factor(&self, jet: &Jet) -> LookupResult;

    /// Inefficiency scale factor for an untagged jet under the current
    /// variation.
    fn inefficiency_scale_factor(&self, jet: &Jet) -> LookupResult;

    /// Tagging efficiency itself. Diagnostic only.
    fn efficiency(&self, jet: &Jet) -> LookupResult;

    /// Every variation that can affect this provider.
    fn affecting_systematics(&self) -> Vec<SystematicVariation>;

    /// The variations recommended for evaluation, nominal included, in
    /// enumeration order.
    fn recommended_systematics(&self) -> Vec<SystematicVariation>;
}

/// MV2c20 discriminant cuts per quoted b-efficiency. Covers both cut
/// families; higher efficiency means a looser (lower) cut.
static MV2C20_WEIGHT_CUTS: Lazy<HashMap<u32, f64>> = Lazy::new(|| {
    HashMap::from([
        (30, 0.9237),
        (40, 0.8244),
        (50, 0.7110),
        (60, 0.4496),
        (70, -0.0436),
        (77, -0.4434),
        (80, -0.5911),
        (85, -0.7887),
        (90, -0.9195),
    ])
});

/// Built-in selection predicate: fixed kinematic thresholds plus the
/// operating point's discriminant cut.
#[derive(Debug, Clone)]
pub struct ThresholdSelection {
    min_pt: f64,
    max_abs_eta: f64,
    weight_cut: f64,
    tagger_name: String,
    jet_author: String,
}

impl ThresholdSelection {
    pub fn new(
        operating_point: &OperatingPoint,
        tagger_name: impl Into<String>,
        jet_author: impl Into<String>,
    ) -> Result<Self> {
        let weight_cut =
            MV2C20_WEIGHT_CUTS.get(&operating_point.efficiency()).copied().ok_or_else(|| {
                CorrectorError::Initialization(format!(
                    "no discriminant cut for operating point {}",
                    operating_point.name()
                ))
            })?;
        Ok(Self {
            min_pt: SELECTION_MIN_PT,
            max_abs_eta: SELECTION_MAX_ABS_ETA,
            weight_cut,
            tagger_name: tagger_name.into(),
            jet_author: jet_author.into(),
        })
    }

    pub fn weight_cut(&self) -> f64 {
        self.weight_cut
    }

    pub fn tagger_name(&self) -> &str {
        &self.tagger_name
    }

    pub fn jet_author(&self) -> &str {
        &self.jet_author
    }
}

impl SelectionPredicate for ThresholdSelection {
    fn accept(&self, jet: &Jet) -> bool {
        jet.pt > self.min_pt && jet.abs_eta() < self.max_abs_eta && jet.tag_weight > self.weight_cut
    }
}

fn default_max_valid_pt() -> f64 {
    1_200_000.0
}

fn default_flavour_label() -> String {
    "cone".to_string()
}

/// Correction values for one variation of one operating point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionCurve {
    /// Efficiency scale factor.
    pub sf: f64,
    /// Inefficiency scale factor.
    pub inefficiency_sf: f64,
    /// Tagging efficiency (diagnostic).
    #[serde(default)]
    pub efficiency: f64,
    /// Upper pt validity bound in MeV. Lookups above it report
    /// `OutOfValidityRange` with the value pinned at the bound.
    #[serde(default = "default_max_valid_pt")]
    pub max_valid_pt: f64,
}

/// One operating point's block in the calibration table, keyed by variation
/// name (empty = nominal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationEntry {
    /// Recommended variations in enumeration order.
    #[serde(default)]
    pub recommended: Vec<String>,
    /// Variations that can affect this entry.
    #[serde(default)]
    pub affecting: Vec<String>,
    pub variations: HashMap<String, CorrectionCurve>,
}

/// The on-disk calibration table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationTable {
    pub tagger: String,
    pub jet_author: String,
    /// Development tables are only usable when explicitly allowed.
    #[serde(default)]
    pub development: bool,
    /// Flavour-labelling scheme the table was derived with.
    #[serde(default = "default_flavour_label")]
    pub flavour_label: String,
    /// Entries keyed by the operating point's table label.
    pub operating_points: HashMap<String, CalibrationEntry>,
}

impl CalibrationTable {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&text).map_err(|e| {
            CorrectorError::CalibrationFile(format!(
                "{}: {e}",
                path.as_ref().display()
            ))
        })
    }
}

/// Construction options for [`TableEfficiencyProvider`], mirrored from the
/// corrector configuration.
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    pub tagger_name: String,
    pub jet_author: String,
    pub use_development_file: bool,
    pub cone_flavour_label: bool,
}

/// Built-in efficiency provider backed by a JSON calibration table.
#[derive(Debug, Clone)]
pub struct TableEfficiencyProvider {
    entry: CalibrationEntry,
    recommended: Vec<SystematicVariation>,
    affecting: Vec<SystematicVariation>,
    current: SystematicVariation,
}

impl TableEfficiencyProvider {
    /// Load a calibration table from disk and select one operating point's
    /// entry.
    pub fn from_file(
        path: impl AsRef<Path>,
        cdi_label: &str,
        options: &ProviderOptions,
    ) -> Result<Self> {
        let table = CalibrationTable::from_file(path)?;
        Self::from_table(table, cdi_label, options)
    }

    /// Select one operating point's entry from an already-parsed table.
    pub fn from_table(
        table: CalibrationTable,
        cdi_label: &str,
        options: &ProviderOptions,
    ) -> Result<Self> {
        if table.tagger != options.tagger_name {
            return Err(CorrectorError::Initialization(format!(
                "calibration table is for tagger {}, expected {}",
                table.tagger, options.tagger_name
            )));
        }
        if table.jet_author != options.jet_author {
            return Err(CorrectorError::Initialization(format!(
                "calibration table is for jet author {}, expected {}",
                table.jet_author, options.jet_author
            )));
        }
        if table.development && !options.use_development_file {
            return Err(CorrectorError::Initialization(
                "calibration table is development-only and use_development_file is off"
                    .to_string(),
            ));
        }
        let expected_label = if options.cone_flavour_label { "cone" } else { "ghost" };
        if table.flavour_label != expected_label {
            return Err(CorrectorError::Initialization(format!(
                "calibration table uses {} flavour labelling, expected {expected_label}",
                table.flavour_label
            )));
        }

        let entry = table.operating_points.get(cdi_label).cloned().ok_or_else(|| {
            CorrectorError::CalibrationFile(format!(
                "no calibration entry for operating point label {cdi_label}"
            ))
        })?;

        let mut recommended: Vec<SystematicVariation> =
            entry.recommended.iter().map(SystematicVariation::new).collect();
        if !recommended.iter().any(|v| v.is_nominal()) {
            recommended.insert(0, SystematicVariation::nominal());
        }
        let affecting = entry.affecting.iter().map(SystematicVariation::new).collect();

        Ok(Self { entry, recommended, affecting, current: SystematicVariation::nominal() })
    }

    fn lookup(&self, jet: &Jet, pick: impl Fn(&CorrectionCurve) -> f64) -> LookupResult {
        match self.entry.variations.get(self.current.name()) {
            Some(curve) if jet.pt > curve.max_valid_pt => {
                LookupResult::OutOfValidityRange(pick(curve))
            }
            Some(curve) => LookupResult::Ok(pick(curve)),
            None => LookupResult::Error,
        }
    }
}

impl EfficiencyProvider for TableEfficiencyProvider {
    fn apply_variation(&mut self, variation: &SystematicVariation) -> bool {
        if variation.is_nominal() || self.entry.variations.contains_key(variation.name()) {
            self.current = variation.clone();
            true
        } else {
            false
        }
    }

    fn scale_factor(&self, jet: &Jet) -> LookupResult {
        self.lookup(jet, |c| c.sf)
    }

    fn inefficiency_scale_factor(&self, jet: &Jet) -> LookupResult {
        self.lookup(jet, |c| c.inefficiency_sf)
    }

    fn efficiency(&self, jet: &Jet) -> LookupResult {
        self.lookup(jet, |c| c.efficiency)
    }

    fn affecting_systematics(&self) -> Vec<SystematicVariation> {
        self.affecting.clone()
    }

    fn recommended_systematics(&self) -> Vec<SystematicVariation> {
        self.recommended.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn op77() -> OperatingPoint {
        OperatingPoint::validate("FixedCutBEff_77").unwrap()
    }

    fn options() -> ProviderOptions {
        ProviderOptions {
            tagger_name: "MV2c20".to_string(),
            jet_author: "AntiKt4EMTopoJets".to_string(),
            use_development_file: true,
            cone_flavour_label: true,
        }
    }

    fn test_table() -> CalibrationTable {
        let nominal = CorrectionCurve {
            sf: 0.95,
            inefficiency_sf: 1.02,
            efficiency: 0.77,
            max_valid_pt: 1_200_000.0,
        };
        let up = CorrectionCurve {
            sf: 0.99,
            inefficiency_sf: 1.01,
            efficiency: 0.78,
            max_valid_pt: 1_200_000.0,
        };
        let entry = CalibrationEntry {
            recommended: vec![String::new(), "FT_EFF_Eigen_B_0__1up".to_string()],
            affecting: vec![
                "FT_EFF_Eigen_B_0__1up".to_string(),
                "FT_EFF_Eigen_B_0__1down".to_string(),
            ],
            variations: HashMap::from([
                (String::new(), nominal),
                ("FT_EFF_Eigen_B_0__1up".to_string(), up),
            ]),
        };
        CalibrationTable {
            tagger: "MV2c20".to_string(),
            jet_author: "AntiKt4EMTopoJets".to_string(),
            development: true,
            flavour_label: "cone".to_string(),
            operating_points: HashMap::from([("-0_4434".to_string(), entry)]),
        }
    }

    #[test]
    fn threshold_selection_applies_kinematic_and_weight_cuts() {
        let sel = ThresholdSelection::new(&op77(), "MV2c20", "AntiKt4EMTopoJets").unwrap();
        assert_eq!(sel.weight_cut(), -0.4434);

        // Passes everything.
        assert!(sel.accept(&Jet::new(50_000.0, 0.5, 0.0, 0.2)));
        // Below min pt.
        assert!(!sel.accept(&Jet::new(15_000.0, 0.5, 0.0, 0.2)));
        // Outside eta.
        assert!(!sel.accept(&Jet::new(50_000.0, 2.7, 0.0, 0.2)));
        // Below the discriminant cut.
        assert!(!sel.accept(&Jet::new(50_000.0, 0.5, 0.0, -0.9)));
    }

    #[test]
    fn provider_serves_current_variation_values() {
        let mut provider = TableEfficiencyProvider::from_table(test_table(), "-0_4434", &options())
            .unwrap();
        let jet = Jet::new(50_000.0, 0.5, 0.0, 0.2);

        assert_eq!(provider.scale_factor(&jet), LookupResult::Ok(0.95));
        assert_eq!(provider.inefficiency_scale_factor(&jet), LookupResult::Ok(1.02));

        assert!(provider.apply_variation(&SystematicVariation::new("FT_EFF_Eigen_B_0__1up")));
        assert_eq!(provider.scale_factor(&jet), LookupResult::Ok(0.99));

        assert!(provider.apply_variation(&SystematicVariation::nominal()));
        assert_eq!(provider.scale_factor(&jet), LookupResult::Ok(0.95));
    }

    #[test]
    fn unsupported_variation_is_rejected() {
        let mut provider = TableEfficiencyProvider::from_table(test_table(), "-0_4434", &options())
            .unwrap();
        assert!(!provider.apply_variation(&SystematicVariation::new("FT_EFF_NoSuch__1up")));
    }

    #[test]
    fn lookup_above_validity_range_pins_the_value() {
        let provider =
            TableEfficiencyProvider::from_table(test_table(), "-0_4434", &options()).unwrap();
        let jet = Jet::new(1_500_000.0, 0.5, 0.0, 0.2);
        assert_eq!(provider.scale_factor(&jet), LookupResult::OutOfValidityRange(0.95));
        assert_eq!(provider.scale_factor(&jet).value(), Some(0.95));
    }

    #[test]
    fn nominal_is_always_recommended() {
        let mut table = test_table();
        table
            .operating_points
            .get_mut("-0_4434")
            .unwrap()
            .recommended
            .retain(|name| !name.is_empty());
        let provider =
            TableEfficiencyProvider::from_table(table, "-0_4434", &options()).unwrap();
        let recommended = provider.recommended_systematics();
        assert!(recommended[0].is_nominal());
    }

    #[test]
    fn mismatched_tagger_fails_initialization() {
        let mut opts = options();
        opts.tagger_name = "DL1".to_string();
        let err = TableEfficiencyProvider::from_table(test_table(), "-0_4434", &opts).unwrap_err();
        assert!(matches!(err, CorrectorError::Initialization(_)));
    }

    #[test]
    fn development_table_requires_explicit_opt_in() {
        let mut opts = options();
        opts.use_development_file = false;
        let err = TableEfficiencyProvider::from_table(test_table(), "-0_4434", &opts).unwrap_err();
        assert!(matches!(err, CorrectorError::Initialization(_)));
    }

    #[test]
    fn missing_label_is_a_calibration_file_error() {
        let err =
            TableEfficiencyProvider::from_table(test_table(), "0_4496", &options()).unwrap_err();
        assert!(matches!(err, CorrectorError::CalibrationFile(_)));
    }

    #[test]
    fn table_round_trips_through_a_file() {
        let table = test_table();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&table).unwrap()).unwrap();

        let provider =
            TableEfficiencyProvider::from_file(file.path(), "-0_4434", &options()).unwrap();
        let jet = Jet::new(50_000.0, 0.5, 0.0, 0.2);
        assert_eq!(provider.scale_factor(&jet), LookupResult::Ok(0.95));
    }

    #[test]
    fn unreadable_table_reports_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = CalibrationTable::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CorrectorError::CalibrationFile(_)));
    }
}
