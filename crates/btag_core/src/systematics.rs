//! Systematic variations and the per-run variation registry.

use serde::{Deserialize, Serialize};

/// A named systematic variation of the calibration model. The empty name is
/// the nominal (unperturbed) configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystematicVariation(String);

impl SystematicVariation {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The nominal configuration.
    pub fn nominal() -> Self {
        Self(String::new())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_nominal(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for SystematicVariation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_nominal() {
            f.write_str("<nominal>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// The ordered list of variations one corrector instance iterates per event.
///
/// Built once at initialization from the efficiency provider's recommended
/// set and immutable afterwards. The output is a filtered copy of the input;
/// the recommended set is never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationRegistry {
    variations: Vec<SystematicVariation>,
}

impl VariationRegistry {
    /// Select the variations to evaluate.
    ///
    /// With `run_all` every recommended variation is kept in the provider's
    /// enumeration order. Otherwise exactly the entries whose name equals
    /// `requested` are kept; an empty `requested` therefore selects exactly
    /// the nominal entry, which the recommended set always contains.
    pub fn build(requested: &str, run_all: bool, recommended: &[SystematicVariation]) -> Self {
        let variations = if run_all {
            recommended.to_vec()
        } else {
            recommended.iter().filter(|v| v.name() == requested).cloned().collect()
        };
        Self { variations }
    }

    /// A registry holding only the nominal entry, for decision-only mode.
    pub fn nominal_only() -> Self {
        Self { variations: vec![SystematicVariation::nominal()] }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SystematicVariation> {
        self.variations.iter()
    }

    pub fn len(&self) -> usize {
        self.variations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variations.is_empty()
    }

    /// Variation names in evaluation order.
    pub fn names(&self) -> Vec<String> {
        self.variations.iter().map(|v| v.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recommended() -> Vec<SystematicVariation> {
        vec![
            SystematicVariation::nominal(),
            SystematicVariation::new("FT_EFF_Eigen_B_0__1up"),
            SystematicVariation::new("FT_EFF_Eigen_B_0__1down"),
            SystematicVariation::new("FT_EFF_Light_0__1up"),
        ]
    }

    #[test]
    fn empty_request_keeps_exactly_the_nominal() {
        let reg = VariationRegistry::build("", false, &recommended());
        assert_eq!(reg.len(), 1);
        assert!(reg.iter().next().unwrap().is_nominal());
        assert_eq!(reg.names(), vec![String::new()]);
    }

    #[test]
    fn run_all_preserves_enumeration_order() {
        let rec = recommended();
        let reg = VariationRegistry::build("All", true, &rec);
        assert_eq!(reg.len(), rec.len());
        let names: Vec<_> = reg.iter().map(|v| v.name().to_string()).collect();
        let expected: Vec<_> = rec.iter().map(|v| v.name().to_string()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn single_request_selects_only_that_variation() {
        let reg = VariationRegistry::build("FT_EFF_Eigen_B_0__1down", false, &recommended());
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.iter().next().unwrap().name(), "FT_EFF_Eigen_B_0__1down");
    }

    #[test]
    fn unknown_request_selects_nothing() {
        let reg = VariationRegistry::build("FT_EFF_NoSuch__1up", false, &recommended());
        assert!(reg.is_empty());
    }

    #[test]
    fn build_does_not_touch_the_input_set() {
        let rec = recommended();
        let before = rec.clone();
        let _ = VariationRegistry::build("", false, &rec);
        assert_eq!(rec, before);
    }

    #[test]
    fn nominal_displays_readably() {
        assert_eq!(SystematicVariation::nominal().to_string(), "<nominal>");
        assert_eq!(SystematicVariation::new("FT_EFF_Light_0__1up").to_string(), "FT_EFF_Light_0__1up");
    }
}
