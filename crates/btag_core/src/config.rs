//! Corrector configuration.
//!
//! All tuning knobs for one corrector instance live here. Defaults match the
//! standard MV2c20 / AntiKt4EMTopoJets setup; a JSON file can override any
//! subset of keys.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CorrectorError, Result};

/// Configuration for one [`BtagCorrector`](crate::corrector::BtagCorrector)
/// instance.
///
/// Read once at setup and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectorConfig {
    /// Verbose per-jet logging, including the diagnostic efficiency lookup.
    pub debug: bool,

    /// Name of the jet container to read from the event. Required.
    pub input_container: String,

    /// Requested systematic variation: `""` = nominal only, a name = that
    /// variation only, any name containing `"All"` = every recommended
    /// variation.
    pub syst_name: String,

    /// Base name for the published variation-name record. The operating point
    /// is appended to keep concurrently configured instances apart.
    pub output_syst_name: String,

    /// Path to the JSON calibration table. Only read for calibrated
    /// operating points.
    pub correction_file: String,

    /// Jet collection the calibration was derived for.
    pub jet_author: String,

    /// Tagging discriminant name.
    pub tagger_name: String,

    /// Accept calibration tables marked as development-only.
    pub use_development_file: bool,

    /// Use cone-based flavour labelling when matching table entries.
    pub cone_flavour_label: bool,

    /// Operating point name, e.g. `"FixedCutBEff_77"`. Required.
    pub operating_point: String,

    /// Base name for the per-jet decision and scale-factor records.
    pub decoration_name: String,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        Self {
            debug: false,
            input_container: String::new(),
            syst_name: String::new(),
            output_syst_name: "BJetEfficiency_Algo".to_string(),
            correction_file: "data/btag_calibration.json".to_string(),
            jet_author: "AntiKt4EMTopoJets".to_string(),
            tagger_name: "MV2c20".to_string(),
            use_development_file: true,
            cone_flavour_label: true,
            operating_point: String::new(),
            decoration_name: "BTag".to_string(),
        }
    }
}

impl CorrectorConfig {
    /// Parse a configuration from a JSON string. Missing keys keep their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        log::info!("Corrector configuration read from {}", path.as_ref().display());
        Ok(config)
    }

    /// Check the required keys. Operating-point validity is checked separately
    /// by the catalog.
    pub fn validate(&self) -> Result<()> {
        if self.input_container.is_empty() {
            return Err(CorrectorError::Configuration("input_container is empty".to_string()));
        }
        if self.operating_point.is_empty() {
            return Err(CorrectorError::Configuration("operating_point is empty".to_string()));
        }
        Ok(())
    }

    /// True when the requested variation name selects the run-all mode.
    pub fn run_all_systematics(&self) -> bool {
        self.syst_name.contains("All")
    }
}
