//! Per-event output recorder.
//!
//! After the variation loop the corrector publishes the ordered list of
//! variation names it evaluated, so that index `i` of every jet's
//! scale-factor sequence corresponds to entry `i` of the published list.
//! Downstream consumers key on this positional contract.

use std::collections::HashMap;

use crate::error::{CorrectorError, Result};

/// Keyed store for the published variation-name lists of one event.
///
/// Keys are unique within an event; recording the same key twice is an
/// error, matching the behavior of the surrounding event store.
#[derive(Debug, Default)]
pub struct OutputRecorder {
    records: HashMap<String, Vec<String>>,
}

impl OutputRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the evaluated-variation list under `key`.
    pub fn record(&mut self, key: impl Into<String>, names: Vec<String>) -> Result<()> {
        let key = key.into();
        if self.records.contains_key(&key) {
            return Err(CorrectorError::Record { key });
        }
        self.records.insert(key, names);
        Ok(())
    }

    /// The list published under `key`, in evaluation order.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.records.get(key).map(Vec::as_slice)
    }

    /// Drop all records, to be called when the event is released.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_returned_in_evaluation_order() {
        let mut recorder = OutputRecorder::new();
        let names = vec![String::new(), "FT_EFF_Eigen_B_0__1up".to_string()];
        recorder.record("BJetEfficiency_Algo_FixedCutBEff_77", names.clone()).unwrap();

        let stored = recorder.get("BJetEfficiency_Algo_FixedCutBEff_77").unwrap();
        assert_eq!(stored, names.as_slice());
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut recorder = OutputRecorder::new();
        recorder.record("key", vec![]).unwrap();
        let err = recorder.record("key", vec![]).unwrap_err();
        assert!(matches!(err, CorrectorError::Record { .. }));
    }

    #[test]
    fn clear_releases_event_scope() {
        let mut recorder = OutputRecorder::new();
        recorder.record("key", vec![]).unwrap();
        recorder.clear();
        assert!(recorder.get("key").is_none());
        assert!(recorder.record("key", vec![]).is_ok());
    }
}
