//! Importance measures built on top of a component's DPLD: structural,
//! Birnbaum, and Fussell-Vesely.

use crate::error::Result;
use crate::mem::fxhash::FxHashMap;
use crate::node::VarIndex;

use super::dpld::monotone_normal_form;
use super::probability::{calculate_probability, domain_product, ProbabilityModel};
use super::ManagerInner;

pub(crate) fn structural_importance(inner: &ManagerInner, index: VarIndex, dpld_count: u64) -> f64 {
    let total = domain_product(inner);
    let di = inner.domain(index) as u64;
    dpld_count as f64 / (total as f64 / di as f64)
}

pub(crate) fn birnbaum_importance(
    inner: &ManagerInner,
    model: &ProbabilityModel,
    dpld_root: crate::node::NodeId,
) -> f64 {
    calculate_probability(inner, model, dpld_root, &|v| v == 1)
}

pub(crate) fn fussell_vesely_importance(
    inner: &mut ManagerInner,
    model: &ProbabilityModel,
    dpld_root: crate::node::NodeId,
    index: VarIndex,
    critical_state: u32,
    system_unavailability: f64,
) -> Result<f64> {
    let mark = inner.protected_mark();
    let mut memo = FxHashMap::default();
    let mnf = monotone_normal_form(inner, &mut memo, dpld_root)?;
    let pr_mnf = calculate_probability(inner, model, mnf, &|v| v == 1);
    inner.release_protected(mark);
    let weighted: f64 = (0..critical_state).map(|s| model.p(index, s)).sum();
    Ok(weighted * pr_mnf / system_unavailability)
}
