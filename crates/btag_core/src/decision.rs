//! Per-event tag-decision cache.
//!
//! The selection predicate's outcome does not depend on the systematic
//! variation applied to the efficiency provider, so each jet's decision is
//! computed at most once per event and reused across the whole variation
//! loop.

use crate::capability::SelectionPredicate;
use crate::jet::Jet;

/// Memoized tag decisions for the jets of one event, indexed by container
/// position. Scoped to a single `process_event` call.
#[derive(Debug)]
pub struct DecisionCache {
    decisions: Vec<Option<bool>>,
}

impl DecisionCache {
    pub fn new(jet_count: usize) -> Self {
        Self { decisions: vec![None; jet_count] }
    }

    /// The tag decision for the jet at `index`, invoking the predicate only
    /// on first access.
    pub fn decide(
        &mut self,
        index: usize,
        jet: &Jet,
        predicate: &dyn SelectionPredicate,
    ) -> bool {
        match self.decisions[index] {
            Some(decision) => decision,
            None => {
                let decision = predicate.accept(jet);
                self.decisions[index] = Some(decision);
                decision
            }
        }
    }

    /// The cached decision, if one has been computed.
    pub fn get(&self, index: usize) -> Option<bool> {
        self.decisions.get(index).copied().flatten()
    }
}
