//! Enumeration algorithms (C8): evaluate, cofactor, transform, the
//! satisfy-count family, and satisfy-one/-all, all built on the node
//! identity memoisation pattern traversal already establishes.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::error::{Error, Result};
use crate::mem::fxhash::FxHashMap;
use crate::node::{Level, NodeId, VarIndex};

use super::ManagerInner;

/// Output container for a full variable assignment, as produced by
/// `satisfy_one`/`satisfy_all`. `Vec<u32>` covers ordinary use; a caller
/// may implement this for a richer named-assignment type.
pub trait SatisfyCollector: Sized {
    fn from_assignment(values: Vec<u32>) -> Self;
}

impl SatisfyCollector for Vec<u32> {
    fn from_assignment(values: Vec<u32>) -> Self {
        values
    }
}

pub(super) fn evaluate(inner: &ManagerInner, root: NodeId, vars: &[u32]) -> Result<i32> {
    let mut node = root;
    loop {
        let slot = inner.pool().get(node);
        if let Some(v) = slot.value() {
            return Ok(v);
        }
        let index = slot.var_index().expect("non-terminal node must carry a variable index");
        let value = *vars
            .get(index as usize)
            .ok_or_else(|| Error::invalid(format!("assignment is missing variable {index}")))?;
        if value >= inner.domain(index) {
            return Err(Error::invalid(format!(
                "assignment value {value} is out of domain for variable {index}"
            )));
        }
        node = inner.son_of(node, value);
    }
}

fn cofactor_rec(
    inner: &mut ManagerInner,
    memo: &mut FxHashMap<NodeId, NodeId>,
    node: NodeId,
    restrictions: &[(VarIndex, u32)],
) -> Result<NodeId> {
    if inner.pool().get(node).is_terminal() {
        return Ok(node);
    }
    if let Some(&cached) = memo.get(&node) {
        return Ok(cached);
    }
    let index = inner.var_index_of(node).unwrap();
    let result = if let Some(&(_, v)) = restrictions.iter().find(|(i, _)| *i == index) {
        let son = inner.son_of(node, v);
        cofactor_rec(inner, memo, son, restrictions)?
    } else {
        let degree = inner.domain(index);
        let mut sons = Vec::with_capacity(degree as usize);
        for k in 0..degree {
            let son = inner.son_of(node, k);
            sons.push(cofactor_rec(inner, memo, son, restrictions)?);
        }
        inner.make_internal_node(index, &sons)?
    };
    inner.protect(result);
    memo.insert(node, result);
    Ok(result)
}

pub(super) fn cofactor(inner: &mut ManagerInner, root: NodeId, restrictions: &[(VarIndex, u32)]) -> Result<NodeId> {
    for &(index, value) in restrictions {
        if index >= inner.var_count() {
            return Err(Error::invalid(format!("variable index {index} out of range")));
        }
        if value >= inner.domain(index) {
            return Err(Error::invalid(format!("value {value} out of domain for variable {index}")));
        }
    }
    let mut memo = FxHashMap::default();
    cofactor_rec(inner, &mut memo, root, restrictions)
}

fn transform_rec(
    inner: &mut ManagerInner,
    memo: &mut FxHashMap<NodeId, NodeId>,
    node: NodeId,
    phi: &impl Fn(i32) -> i32,
) -> Result<NodeId> {
    if let Some(v) = inner.pool().get(node).value() {
        let result = inner.make_terminal(phi(v))?;
        inner.protect(result);
        return Ok(result);
    }
    if let Some(&cached) = memo.get(&node) {
        return Ok(cached);
    }
    let index = inner.var_index_of(node).unwrap();
    let degree = inner.domain(index);
    let mut sons = Vec::with_capacity(degree as usize);
    for k in 0..degree {
        let son = inner.son_of(node, k);
        sons.push(transform_rec(inner, memo, son, phi)?);
    }
    let result = inner.make_internal_node(index, &sons)?;
    inner.protect(result);
    memo.insert(node, result);
    Ok(result)
}

pub(super) fn transform(inner: &mut ManagerInner, root: NodeId, phi: &impl Fn(i32) -> i32) -> Result<NodeId> {
    let mut memo = FxHashMap::default();
    transform_rec(inner, &mut memo, root, phi)
}

fn skip_product_u64(inner: &ManagerInner, from_level: Level, to_level: Level) -> u64 {
    (from_level..to_level).map(|l| inner.domain(inner.index_at_level(l)) as u64).product()
}

fn satisfy_count_rec(inner: &ManagerInner, memo: &mut FxHashMap<NodeId, u64>, node: NodeId, j: i32) -> u64 {
    if let Some(v) = inner.pool().get(node).value() {
        return if v == j { 1 } else { 0 };
    }
    if let Some(&cached) = memo.get(&node) {
        return cached;
    }
    let index = inner.var_index_of(node).unwrap();
    let node_level = inner.level_of_index(index);
    let degree = inner.domain(index);
    let mut total = 0u64;
    for k in 0..degree {
        let son = inner.son_of(node, k);
        let gap = skip_product_u64(inner, node_level + 1, inner.level_of_node(son));
        total += satisfy_count_rec(inner, memo, son, j) * gap;
    }
    memo.insert(node, total);
    total
}

pub(super) fn satisfy_count(inner: &ManagerInner, j: i32, root: NodeId) -> Result<u64> {
    let mut memo = FxHashMap::default();
    let prefix = skip_product_u64(inner, 0, inner.level_of_node(root));
    Ok(satisfy_count_rec(inner, &mut memo, root, j) * prefix)
}

fn skip_product_big(inner: &ManagerInner, from_level: Level, to_level: Level) -> BigUint {
    let mut acc = BigUint::one();
    for l in from_level..to_level {
        acc *= BigUint::from(inner.domain(inner.index_at_level(l)));
    }
    acc
}

fn satisfy_count_big_rec(
    inner: &ManagerInner,
    memo: &mut FxHashMap<NodeId, BigUint>,
    node: NodeId,
    j: i32,
) -> BigUint {
    if let Some(v) = inner.pool().get(node).value() {
        return if v == j { BigUint::one() } else { BigUint::zero() };
    }
    if let Some(cached) = memo.get(&node) {
        return cached.clone();
    }
    let index = inner.var_index_of(node).unwrap();
    let node_level = inner.level_of_index(index);
    let degree = inner.domain(index);
    let mut total = BigUint::zero();
    for k in 0..degree {
        let son = inner.son_of(node, k);
        let gap = skip_product_big(inner, node_level + 1, inner.level_of_node(son));
        total += satisfy_count_big_rec(inner, memo, son, j) * gap;
    }
    memo.insert(node, total.clone());
    total
}

pub(super) fn satisfy_count_big(inner: &ManagerInner, j: i32, root: NodeId) -> Result<BigUint> {
    let mut memo = FxHashMap::default();
    let prefix = skip_product_big(inner, 0, inner.level_of_node(root));
    Ok(satisfy_count_big_rec(inner, &mut memo, root, j) * prefix)
}

fn log_sum_exp2(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let m = a.max(b);
    m + (2f64.powf(a - m) + 2f64.powf(b - m)).log2()
}

fn satisfy_count_ln_rec(inner: &ManagerInner, memo: &mut FxHashMap<NodeId, f64>, node: NodeId) -> f64 {
    if let Some(v) = inner.pool().get(node).value() {
        return if v == 1 { 0.0 } else { f64::NEG_INFINITY };
    }
    if let Some(&cached) = memo.get(&node) {
        return cached;
    }
    let index = inner.var_index_of(node).unwrap();
    let node_level = inner.level_of_index(index);
    let low = inner.son_of(node, 0);
    let high = inner.son_of(node, 1);
    let gap_low = (inner.level_of_node(low) - node_level - 1) as f64;
    let gap_high = (inner.level_of_node(high) - node_level - 1) as f64;
    let lc_low = satisfy_count_ln_rec(inner, memo, low) + gap_low;
    let lc_high = satisfy_count_ln_rec(inner, memo, high) + gap_high;
    let result = log_sum_exp2(lc_low, lc_high);
    memo.insert(node, result);
    result
}

pub(super) fn satisfy_count_ln(inner: &ManagerInner, root: NodeId) -> Result<f64> {
    let mut memo = FxHashMap::default();
    let prefix = inner.level_of_node(root) as f64;
    Ok(satisfy_count_ln_rec(inner, &mut memo, root) + prefix)
}

fn satisfy_one_dfs(inner: &ManagerInner, node: NodeId, j: i32, assignment: &mut [u32]) -> bool {
    if let Some(v) = inner.pool().get(node).value() {
        return v == j;
    }
    let index = inner.var_index_of(node).unwrap();
    for k in 0..inner.domain(index) {
        assignment[index as usize] = k;
        if satisfy_one_dfs(inner, inner.son_of(node, k), j, assignment) {
            return true;
        }
    }
    false
}

pub(super) fn satisfy_one<V: SatisfyCollector>(inner: &ManagerInner, j: i32, root: NodeId) -> Result<Option<V>> {
    let mut assignment = vec![0u32; inner.var_count() as usize];
    if satisfy_one_dfs(inner, root, j, &mut assignment) {
        Ok(Some(V::from_assignment(assignment)))
    } else {
        Ok(None)
    }
}

/// `prefix` holds one value per level already decided, in level order;
/// `remap_by_index` turns that into a variable-index-ordered assignment.
fn remap_by_index(inner: &ManagerInner, level_ordered: &[u32]) -> Vec<u32> {
    let mut out = vec![0u32; inner.var_count() as usize];
    for (level, &value) in level_ordered.iter().enumerate() {
        out[inner.index_at_level(level as Level) as usize] = value;
    }
    out
}

fn satisfy_all_rec(
    inner: &ManagerInner,
    level: Level,
    node: NodeId,
    j: i32,
    prefix: &mut Vec<u32>,
    out: &mut Vec<Vec<u32>>,
) {
    if level == inner.leaf_level() {
        if inner.pool().get(node).value() == Some(j) {
            out.push(remap_by_index(inner, prefix));
        }
        return;
    }
    let index = inner.index_at_level(level);
    let node_level = inner.level_of_node(node);
    for k in 0..inner.domain(index) {
        prefix.push(k);
        let next_node = if node_level == level { inner.son_of(node, k) } else { node };
        satisfy_all_rec(inner, level + 1, next_node, j, prefix, out);
        prefix.pop();
    }
}

pub(super) fn satisfy_all<V: SatisfyCollector>(inner: &ManagerInner, j: i32, root: NodeId) -> Result<Vec<V>> {
    let mut raw = Vec::new();
    satisfy_all_rec(inner, 0, root, j, &mut Vec::new(), &mut raw);
    Ok(raw.into_iter().map(V::from_assignment).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::{DomainKind, Manager, ManagerConfig};
    use crate::ops::And;

    #[test]
    fn satisfy_all_matches_satisfy_count() {
        let m = Manager::new(ManagerConfig::new(2, DomainKind::Binary)).unwrap();
        let x0 = m.variable(0).unwrap();
        let x1 = m.variable(1).unwrap();
        let f = m.apply::<And>(&x0, &x1).unwrap();
        let all: Vec<Vec<u32>> = m.satisfy_all(1, &f).unwrap();
        assert_eq!(all.len(), m.satisfy_count(1, &f).unwrap() as usize);
        assert_eq!(all, vec![vec![1, 1]]);
    }

    #[test]
    fn cofactor_fixes_a_variable() {
        let m = Manager::new(ManagerConfig::new(2, DomainKind::Binary)).unwrap();
        let x0 = m.variable(0).unwrap();
        let x1 = m.variable(1).unwrap();
        let f = m.apply::<And>(&x0, &x1).unwrap();
        let cofac = m.cofactor(&f, 0, 1).unwrap();
        assert_eq!(cofac, x1);
    }
}
