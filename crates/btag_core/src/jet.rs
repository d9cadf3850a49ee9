//! Jet and event data model.
//!
//! The corrector never owns the jets it annotates: it borrows a container
//! from the event for the duration of one `process_event` call and returns
//! its results in a separate structure.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CorrectorError, Result};

/// One reconstructed jet. Momenta are in MeV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jet {
    /// Transverse momentum in MeV.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// Tagging discriminant weight (MV2c20 range is [-1, 1]).
    pub tag_weight: f64,
}

impl Jet {
    pub fn new(pt: f64, eta: f64, phi: f64, tag_weight: f64) -> Self {
        Self { pt, eta, phi, tag_weight }
    }

    /// Absolute pseudorapidity, the quantity the acceptance window is
    /// defined on.
    pub fn abs_eta(&self) -> f64 {
        self.eta.abs()
    }
}

/// One event as seen by the corrector: a simulation flag plus named jet
/// containers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    /// True for simulated events. Scale factors are only defined for
    /// simulation; data events pass through untouched.
    pub is_simulation: bool,
    /// Jet containers keyed by name.
    #[serde(default)]
    pub containers: HashMap<String, Vec<Jet>>,
}

impl Event {
    pub fn simulation() -> Self {
        Self { is_simulation: true, containers: HashMap::new() }
    }

    pub fn with_container(mut self, name: impl Into<String>, jets: Vec<Jet>) -> Self {
        self.containers.insert(name.into(), jets);
        self
    }

    /// Look up a jet container by name.
    pub fn retrieve(&self, name: &str) -> Result<&[Jet]> {
        self.containers
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| CorrectorError::Retrieval { name: name.to_string() })
    }
}
