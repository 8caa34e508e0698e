//! Probability descriptors and the post-order propagation every
//! reliability metric in this module is built from.

use crate::mem::fxhash::FxHashMap;
use crate::node::{NodeId, VarIndex};

use super::ManagerInner;

/// Per-variable state probabilities. Binary managers carry `Pr{xᵢ=1}`
/// directly, with `Pr{xᵢ=0}` implied; multi-state managers carry the full
/// per-state row.
#[derive(Clone, Debug)]
pub enum ProbabilityModel {
    Binary(Vec<f64>),
    MultiState(Vec<Vec<f64>>),
}

impl ProbabilityModel {
    pub(crate) fn p(&self, index: VarIndex, state: u32) -> f64 {
        match self {
            ProbabilityModel::Binary(v) => {
                if state == 1 {
                    v[index as usize]
                } else {
                    1.0 - v[index as usize]
                }
            }
            ProbabilityModel::MultiState(rows) => rows[index as usize][state as usize],
        }
    }
}

/// Result of a `calculate_probabilities` call: one entry per selected
/// state, retrievable with `get_probability`.
#[derive(Clone, Debug, Default)]
pub struct ProbabilityResult {
    values: FxHashMap<i32, f64>,
}

impl ProbabilityResult {
    pub fn get_probability(&self, state: i32) -> Option<f64> {
        self.values.get(&state).copied()
    }
}

fn propagate(
    inner: &ManagerInner,
    model: &ProbabilityModel,
    node: NodeId,
    memo: &mut FxHashMap<NodeId, f64>,
    selected: &impl Fn(i32) -> bool,
) -> f64 {
    if let Some(v) = inner.pool().get(node).value() {
        return if selected(v) { 1.0 } else { 0.0 };
    }
    if let Some(&cached) = memo.get(&node) {
        return cached;
    }
    let index = inner.var_index_of(node).unwrap();
    let degree = inner.domain(index);
    let mut total = 0.0;
    for k in 0..degree {
        let son = inner.son_of(node, k);
        total += propagate(inner, model, son, memo, selected) * model.p(index, k);
    }
    memo.insert(node, total);
    total
}

pub(crate) fn calculate_probability(
    inner: &ManagerInner,
    model: &ProbabilityModel,
    root: NodeId,
    selected: &impl Fn(i32) -> bool,
) -> f64 {
    let mut memo = FxHashMap::default();
    propagate(inner, model, root, &mut memo, selected)
}

pub(crate) fn calculate_probabilities(
    inner: &ManagerInner,
    model: &ProbabilityModel,
    root: NodeId,
    states: &[i32],
) -> ProbabilityResult {
    let values = states
        .iter()
        .map(|&s| (s, calculate_probability(inner, model, root, &|v| v == s)))
        .collect();
    ProbabilityResult { values }
}

pub(crate) fn availability(inner: &ManagerInner, model: &ProbabilityModel, root: NodeId, j: i32) -> f64 {
    calculate_probability(inner, model, root, &|v| v >= j)
}

pub(crate) fn unavailability(inner: &ManagerInner, model: &ProbabilityModel, root: NodeId, j: i32) -> f64 {
    calculate_probability(inner, model, root, &|v| v < j)
}

pub(crate) fn domain_product(inner: &ManagerInner) -> u64 {
    (0..inner.var_count()).map(|i| inner.domain(i) as u64).product()
}
