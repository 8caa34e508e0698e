//! The reliability layer (C11): probability propagation, direct partial
//! logic derivatives, importance measures, and minimal cut/path vectors,
//! all built on the manager's core apply/enumerate primitives.
//!
//! This module only calls through the manager's existing public surface
//! plus the same crate-visible internals `manager::{apply,enumerate,gc}`
//! use — it is an adapter on the core, not a second copy of it.

mod dpld;
mod importance;
mod mcv;
mod probability;

use crate::diagram::Diagram;
use crate::error::Result;
use crate::manager::{Manager, ManagerInner, SatisfyCollector};
use crate::node::VarIndex;

pub use dpld::{ChangeDirection, DpldKind};
pub use probability::{ProbabilityModel, ProbabilityResult};

impl Manager {
    /// Computes, for each state in `states`, the probability that `d`
    /// evaluates to that state under `model`. Retrieve individual results
    /// with [`ProbabilityResult::get_probability`].
    pub fn calculate_probabilities(&self, model: &ProbabilityModel, d: &Diagram, states: &[i32]) -> Result<ProbabilityResult> {
        let inner_rc = self.inner_handle();
        let inner = inner_rc.borrow();
        Ok(probability::calculate_probabilities(&inner, model, d.node(), states))
    }

    /// `Pr{d >= j}`.
    pub fn availability(&self, model: &ProbabilityModel, d: &Diagram, j: i32) -> Result<f64> {
        let inner_rc = self.inner_handle();
        let inner = inner_rc.borrow();
        Ok(probability::availability(&inner, model, d.node(), j))
    }

    /// `Pr{d < j}`.
    pub fn unavailability(&self, model: &ProbabilityModel, d: &Diagram, j: i32) -> Result<f64> {
        let inner_rc = self.inner_handle();
        let inner = inner_rc.borrow();
        Ok(probability::unavailability(&inner, model, d.node(), j))
    }

    /// `satisfy_count(j, d) / |domain|`.
    pub fn state_frequency(&self, d: &Diagram, j: i32) -> Result<f64> {
        let inner_rc = self.inner_handle();
        let inner = inner_rc.borrow();
        let total = probability::domain_product(&inner);
        drop(inner);
        Ok(self.satisfy_count(j, d)? as f64 / total as f64)
    }

    /// The DPLD for a change to `change_index` from `from` to `to`, under
    /// the given Δ predicate.
    pub fn dpld(&self, change_index: VarIndex, from: u32, to: u32, kind: DpldKind, d: &Diagram) -> Result<Diagram> {
        let inner_rc = self.inner_handle();
        let mut inner = inner_rc.borrow_mut();
        let mark = inner.protected_mark();
        let outcome = dpld::dpld(&mut inner, change_index, from, to, &kind, d.node());
        if outcome.is_err() {
            inner.release_protected(mark);
        }
        let node = outcome?;
        drop(inner);
        let result = Diagram::new(inner_rc.clone(), node);
        inner_rc.borrow_mut().release_protected(mark);
        Ok(result)
    }

    /// Decorates `derivative` so positions where `change_index` isn't
    /// `from` read `Undefined`. Used by `mcvs`/`mpvs`, exposed for direct
    /// use.
    pub fn to_dpld_e(&self, change_index: VarIndex, from: u32, derivative: &Diagram) -> Result<Diagram> {
        let inner_rc = self.inner_handle();
        let mut inner = inner_rc.borrow_mut();
        let mark = inner.protected_mark();
        let outcome = dpld::to_dpld_e(&mut inner, change_index, from, derivative.node());
        if outcome.is_err() {
            inner.release_protected(mark);
        }
        let node = outcome?;
        drop(inner);
        let result = Diagram::new(inner_rc.clone(), node);
        inner_rc.borrow_mut().release_protected(mark);
        Ok(result)
    }

    /// `satisfy_count(1, derivative) / (|domain| / domain(index))`.
    pub fn structural_importance(&self, index: VarIndex, derivative: &Diagram) -> Result<f64> {
        let count = self.satisfy_count(1, derivative)?;
        let inner_rc = self.inner_handle();
        let inner = inner_rc.borrow();
        Ok(importance::structural_importance(&inner, index, count))
    }

    /// Probability that `derivative` evaluates to 1 under `model`.
    pub fn birnbaum_importance(&self, model: &ProbabilityModel, derivative: &Diagram) -> Result<f64> {
        let inner_rc = self.inner_handle();
        let inner = inner_rc.borrow();
        Ok(importance::birnbaum_importance(&inner, model, derivative.node()))
    }

    /// `(Σ_{s<critical_state} P[index][s]) * Pr{MNF(derivative)=1} / system_unavailability`.
    pub fn fussell_vesely_importance(
        &self,
        model: &ProbabilityModel,
        derivative: &Diagram,
        index: VarIndex,
        critical_state: u32,
        system_unavailability: f64,
    ) -> Result<f64> {
        let inner_rc = self.inner_handle();
        let mut inner = inner_rc.borrow_mut();
        importance::fussell_vesely_importance(&mut inner, model, derivative.node(), index, critical_state, system_unavailability)
    }

    /// Minimal cut vectors: one assignment per minimal way to push the
    /// structure function from below a threshold to at/above it.
    pub fn mcvs<V: SatisfyCollector>(&self, d: &Diagram) -> Result<Vec<V>> {
        mcv::mcvs(self, d)
    }

    /// Minimal path vectors: the dual of `mcvs`, using downward component
    /// transitions.
    pub fn mpvs<V: SatisfyCollector>(&self, d: &Diagram) -> Result<Vec<V>> {
        mcv::mpvs(self, d)
    }
}
