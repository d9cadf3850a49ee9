//! The b-jet efficiency correction engine.
//!
//! For every event the corrector classifies each jet against the configured
//! operating point, and for calibrated points looks up one scale factor per
//! requested systematic variation. Results come back as a typed per-event
//! structure; nothing is attached to the jets themselves.

use serde::Serialize;

use crate::capability::{
    EfficiencyProvider, ProviderOptions, SelectionPredicate, TableEfficiencyProvider,
    ThresholdSelection,
};
use crate::config::CorrectorConfig;
use crate::decision::DecisionCache;
use crate::error::{CorrectorError, Result};
use crate::jet::Event;
use crate::operating_point::OperatingPoint;
use crate::systematics::{SystematicVariation, VariationRegistry};

/// Sentinel recorded for jets outside the acceptance window.
pub const SF_OUT_OF_ACCEPTANCE: f64 = -1.0;

/// Sentinel recorded when the efficiency provider reports a lookup error.
pub const SF_LOOKUP_ERROR: f64 = -2.0;

/// Calibration data is only defined below this absolute pseudorapidity.
pub const ACCEPTANCE_MAX_ABS_ETA: f64 = 2.5;

/// Whether this corrector produces scale factors or only tag decisions.
/// Fixed once at setup; the per-object loop never re-checks capability flags.
enum EngineMode {
    Calibrated(Box<dyn EfficiencyProvider>),
    DecisionOnly,
}

/// Correction results for one jet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JetCorrection {
    /// Tag decision. `None` when no variation pass touched this jet.
    pub tagged: Option<bool>,
    /// One scale factor per evaluated variation, in registry order. `None`
    /// for uncalibrated operating points.
    pub scale_factors: Option<Vec<f64>>,
}

/// Correction results for one event.
#[derive(Debug, Clone, Serialize)]
pub struct EventCorrections {
    /// Record name for the per-jet tag decision.
    pub decision_key: String,
    /// Record name for the per-jet scale-factor sequence.
    pub sf_key: String,
    /// Key under which the variation-name list is published.
    pub output_key: String,
    /// Names of the variations evaluated for this event, in order. Entry `i`
    /// matches index `i` of every jet's scale-factor sequence.
    pub variation_names: Vec<String>,
    /// Per-jet results, parallel to the input container.
    pub jets: Vec<JetCorrection>,
}

/// The correction engine. Built once per worker, then driven one event at a
/// time. Owns its capabilities for the life of the worker.
pub struct BtagCorrector {
    config: CorrectorConfig,
    operating_point: OperatingPoint,
    selection: Box<dyn SelectionPredicate>,
    mode: EngineMode,
    registry: VariationRegistry,
    decision_key: String,
    sf_key: String,
    output_key: String,
    warned_data_event: bool,
}

impl std::fmt::Debug for BtagCorrector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BtagCorrector")
            .field("decision_key", &self.decision_key)
            .field("sf_key", &self.sf_key)
            .field("output_key", &self.output_key)
            .finish_non_exhaustive()
    }
}

impl BtagCorrector {
    /// Build a corrector with the built-in capabilities: a threshold
    /// selection and, for calibrated operating points, a table-backed
    /// efficiency provider loaded from the configured calibration file.
    pub fn new(config: CorrectorConfig) -> Result<Self> {
        config.validate()?;
        let operating_point = OperatingPoint::validate(&config.operating_point)?;

        let selection = ThresholdSelection::new(
            &operating_point,
            config.tagger_name.clone(),
            config.jet_author.clone(),
        )?;

        let provider: Option<Box<dyn EfficiencyProvider>> = match operating_point.cdi_label() {
            Some(label) => {
                let options = ProviderOptions {
                    tagger_name: config.tagger_name.clone(),
                    jet_author: config.jet_author.clone(),
                    use_development_file: config.use_development_file,
                    cone_flavour_label: config.cone_flavour_label,
                };
                Some(Box::new(TableEfficiencyProvider::from_file(
                    &config.correction_file,
                    label,
                    &options,
                )?))
            }
            None => None,
        };

        Self::with_capabilities(config, Box::new(selection), provider)
    }

    /// Build a corrector with injected capabilities. A calibrated operating
    /// point requires an efficiency provider.
    pub fn with_capabilities(
        config: CorrectorConfig,
        selection: Box<dyn SelectionPredicate>,
        provider: Option<Box<dyn EfficiencyProvider>>,
    ) -> Result<Self> {
        config.validate()?;
        let operating_point = OperatingPoint::validate(&config.operating_point)?;

        let decision_key = format!("{}_{}", config.decoration_name, operating_point.name());
        let sf_key = format!("{}_SF_{}", config.decoration_name, operating_point.name());
        let output_key = format!("{}_{}", config.output_syst_name, operating_point.name());

        let (mode, registry) = match (operating_point.is_calibrated(), provider) {
            (true, Some(provider)) => {
                if !config.syst_name.is_empty() {
                    for variation in provider.affecting_systematics() {
                        log::debug!("Provider can be affected by systematic: {variation}");
                    }
                    for variation in provider.recommended_systematics() {
                        log::info!("Available recommended systematic: {variation}");
                    }
                }
                let registry = VariationRegistry::build(
                    &config.syst_name,
                    config.run_all_systematics(),
                    &provider.recommended_systematics(),
                );
                if registry.is_empty() {
                    log::warn!(
                        "Requested systematic {} matches no recommended variation; \
                         no corrections will be produced",
                        config.syst_name
                    );
                }
                (EngineMode::Calibrated(provider), registry)
            }
            (true, None) => {
                return Err(CorrectorError::Initialization(format!(
                    "operating point {} is calibrated but no efficiency provider was supplied",
                    operating_point.name()
                )));
            }
            (false, _) => {
                log::warn!(
                    "Operating point {} is not calibrated - no SFs will be obtained",
                    operating_point.name()
                );
                (EngineMode::DecisionOnly, VariationRegistry::nominal_only())
            }
        };

        if config.syst_name.is_empty() {
            log::info!("Running with nominal configuration");
        } else if config.run_all_systematics() {
            log::info!("Running with all recommended systematics");
        }

        Ok(Self {
            config,
            operating_point,
            selection,
            mode,
            registry,
            decision_key,
            sf_key,
            output_key,
            warned_data_event: false,
        })
    }

    pub fn operating_point(&self) -> &OperatingPoint {
        &self.operating_point
    }

    /// Key under which the evaluated-variation list is published.
    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    /// Variation names this corrector evaluates, in order.
    pub fn variation_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Run the correction pass over one event.
    ///
    /// Returns `Ok(None)` for data events: scale factors are only defined
    /// for simulation, so the event passes through untouched. A rejected
    /// variation aborts the event with `CalibrationApply`; results already
    /// produced for earlier variations are dropped with it, and the event is
    /// expected to be excluded or flagged downstream.
    pub fn process_event(&mut self, event: &Event) -> Result<Option<EventCorrections>> {
        if !event.is_simulation {
            if !self.warned_data_event {
                log::warn!("Running b-tagging scale factors on data; events are skipped");
                self.warned_data_event = true;
            }
            return Ok(None);
        }

        let jets = event.retrieve(&self.config.input_container)?;
        log::debug!(
            "Applying b-jet efficiency correction to {} jets in {}",
            jets.len(),
            self.config.input_container
        );

        let calibrated = matches!(self.mode, EngineMode::Calibrated(_));
        let mut cache = DecisionCache::new(jets.len());
        let mut results: Vec<JetCorrection> = jets
            .iter()
            .map(|_| JetCorrection {
                tagged: None,
                scale_factors: calibrated.then(Vec::new),
            })
            .collect();

        let variations: Vec<SystematicVariation> = self.registry.iter().cloned().collect();
        let mut evaluated = Vec::with_capacity(variations.len());

        for variation in &variations {
            evaluated.push(variation.name().to_string());

            if let EngineMode::Calibrated(provider) = &mut self.mode {
                if !provider.apply_variation(variation) {
                    return Err(CorrectorError::CalibrationApply {
                        variation: variation.name().to_string(),
                    });
                }
                log::debug!("Applied systematic variation {variation}");
            }

            for (index, jet) in jets.iter().enumerate() {
                let tagged = cache.decide(index, jet, self.selection.as_ref());
                results[index].tagged = Some(tagged);

                let EngineMode::Calibrated(provider) = &self.mode else {
                    continue;
                };

                let sf = if jet.abs_eta() < ACCEPTANCE_MAX_ABS_ETA {
                    let lookup = if tagged {
                        provider.scale_factor(jet)
                    } else {
                        provider.inefficiency_scale_factor(jet)
                    };
                    match lookup.value() {
                        Some(value) => value,
                        None => {
                            log::warn!(
                                "Scale-factor lookup failed for jet {index} under {variation}; \
                                 recording sentinel"
                            );
                            SF_LOOKUP_ERROR
                        }
                    }
                } else {
                    SF_OUT_OF_ACCEPTANCE
                };

                if let Some(sequence) = results[index].scale_factors.as_mut() {
                    sequence.push(sf);
                }

                if self.config.debug && jet.abs_eta() < ACCEPTANCE_MAX_ABS_ETA {
                    match provider.efficiency(jet).value() {
                        Some(eff) => log::debug!("Jet {index} tagging efficiency = {eff}"),
                        None => log::warn!("Efficiency lookup failed for jet {index}"),
                    }
                }
            }
        }

        Ok(Some(EventCorrections {
            decision_key: self.decision_key.clone(),
            sf_key: self.sf_key.clone(),
            output_key: self.output_key.clone(),
            variation_names: evaluated,
            jets: results,
        }))
    }
}
