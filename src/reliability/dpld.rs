//! Direct Partial Logic Derivatives (DPLDs): diagrams whose 1-set
//! characterises assignments where a specified change to one variable
//! induces a specified change in the function, plus their "extended"
//! (Undefined-decorated) form used by MCV/MPV.

use crate::error::{Error, Result};
use crate::mem::fxhash::FxHashMap;
use crate::node::{Level, NodeId, VarIndex, UNDEFINED};

use super::ManagerInner;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeDirection {
    Increase,
    Decrease,
}

/// The predicate Δ(f_before, f_after) a DPLD tests for.
#[derive(Clone, Copy, Debug)]
pub enum DpldKind {
    Basic { from: i32, to: i32 },
    Type1 { s: i32, dir: ChangeDirection },
    Type2 { dir: ChangeDirection },
    Type3 { s: i32, dir: ChangeDirection },
}

impl DpldKind {
    fn holds(&self, lhs: i32, rhs: i32) -> bool {
        match *self {
            DpldKind::Basic { from, to } => lhs == from && rhs == to,
            DpldKind::Type1 { s, dir } => match dir {
                ChangeDirection::Increase => lhs == s && rhs > s,
                ChangeDirection::Decrease => lhs == s && rhs < s,
            },
            DpldKind::Type2 { dir } => match dir {
                ChangeDirection::Increase => lhs < rhs,
                ChangeDirection::Decrease => lhs > rhs,
            },
            DpldKind::Type3 { s, dir } => match dir {
                ChangeDirection::Increase => lhs < s && rhs >= s,
                ChangeDirection::Decrease => lhs >= s && rhs < s,
            },
        }
    }
}

/// Two-pointer recursive descent: `lhs` and `rhs` start equal (both the
/// diagram under test); at the change variable's level `lhs` advances via
/// its `from` son and `rhs` via its `to` son, elsewhere both descend in
/// lockstep exactly like `apply`'s top-variable recursion.
fn dpld_rec(
    inner: &mut ManagerInner,
    memo: &mut FxHashMap<(NodeId, NodeId), NodeId>,
    change_level: Level,
    from: u32,
    to: u32,
    kind: &DpldKind,
    lhs: NodeId,
    rhs: NodeId,
) -> Result<NodeId> {
    if let Some(&cached) = memo.get(&(lhs, rhs)) {
        return Ok(cached);
    }
    let lhs_level = inner.level_of_node(lhs);
    let rhs_level = inner.level_of_node(rhs);
    let leaf = inner.leaf_level();

    let result = if lhs_level == leaf && rhs_level == leaf {
        let a = inner.pool().get(lhs).value().unwrap();
        let b = inner.pool().get(rhs).value().unwrap();
        inner.make_terminal(kind.holds(a, b) as i32)?
    } else {
        let top_level = lhs_level.min(rhs_level);
        if top_level == change_level {
            let lhs_next = if lhs_level == top_level { inner.son_of(lhs, from) } else { lhs };
            let rhs_next = if rhs_level == top_level { inner.son_of(rhs, to) } else { rhs };
            dpld_rec(inner, memo, change_level, from, to, kind, lhs_next, rhs_next)?
        } else {
            let top_index = inner.index_at_level(top_level);
            let degree = inner.domain(top_index);
            let mut sons = Vec::with_capacity(degree as usize);
            for k in 0..degree {
                let lhs_k = if lhs_level == top_level { inner.son_of(lhs, k) } else { lhs };
                let rhs_k = if rhs_level == top_level { inner.son_of(rhs, k) } else { rhs };
                sons.push(dpld_rec(inner, memo, change_level, from, to, kind, lhs_k, rhs_k)?);
            }
            inner.make_internal_node(top_index, &sons)?
        }
    };
    inner.protect(result);
    memo.insert((lhs, rhs), result);
    Ok(result)
}

pub(crate) fn dpld(
    inner: &mut ManagerInner,
    change_index: VarIndex,
    from: u32,
    to: u32,
    kind: &DpldKind,
    root: NodeId,
) -> Result<NodeId> {
    if change_index >= inner.var_count() {
        return Err(Error::invalid(format!("variable index {change_index} out of range")));
    }
    let degree = inner.domain(change_index);
    if from >= degree || to >= degree {
        return Err(Error::invalid(format!(
            "transition {from}->{to} is out of domain for variable {change_index}"
        )));
    }
    let change_level = inner.level_of_index(change_index);
    let mut memo = FxHashMap::default();
    dpld_rec(inner, &mut memo, change_level, from, to, kind, root, root)
}

/// Decorates a DPLD so every position where the change variable does not
/// take `from` reads `Undefined`; positions at or below the change level
/// that the DPLD never branched on (I1 having skipped the variable
/// entirely) get a synthetic one-level layer inserted instead of being
/// left ambiguous.
fn dpld_e_rec(
    inner: &mut ManagerInner,
    memo: &mut FxHashMap<NodeId, NodeId>,
    change_level: Level,
    change_index: VarIndex,
    from: u32,
    node: NodeId,
) -> Result<NodeId> {
    if let Some(&cached) = memo.get(&node) {
        return Ok(cached);
    }
    let level = inner.level_of_node(node);
    let degree = inner.domain(change_index);

    let result = if level > change_level {
        let mut sons = Vec::with_capacity(degree as usize);
        for k in 0..degree {
            sons.push(if k == from {
                node
            } else {
                let undef = inner.make_terminal(UNDEFINED)?;
                inner.protect(undef);
                undef
            });
        }
        inner.make_internal_node(change_index, &sons)?
    } else if level == change_level {
        // `node` is already at the change level: I3 guarantees every one
        // of its sons sits strictly below it, so the `from` slot takes
        // the son directly rather than recursing back into this function
        // (which would otherwise synthesize a second node at the same
        // level right underneath this one).
        let mut sons = Vec::with_capacity(degree as usize);
        for k in 0..degree {
            sons.push(if k == from {
                inner.son_of(node, k)
            } else {
                let undef = inner.make_terminal(UNDEFINED)?;
                inner.protect(undef);
                undef
            });
        }
        inner.make_internal_node(change_index, &sons)?
    } else {
        let index = inner.var_index_of(node).unwrap();
        let width = inner.domain(index);
        let mut sons = Vec::with_capacity(width as usize);
        for k in 0..width {
            sons.push(dpld_e_rec(inner, memo, change_level, change_index, from, inner.son_of(node, k))?);
        }
        inner.make_internal_node(index, &sons)?
    };
    inner.protect(result);
    memo.insert(node, result);
    Ok(result)
}

pub(crate) fn to_dpld_e(
    inner: &mut ManagerInner,
    change_index: VarIndex,
    from: u32,
    dpld_root: NodeId,
) -> Result<NodeId> {
    let change_level = inner.level_of_index(change_index);
    let mut memo = FxHashMap::default();
    dpld_e_rec(inner, &mut memo, change_level, change_index, from, dpld_root)
}

/// Monotone Normal Form: for each internal node, a 0-terminal son is
/// replaced by the next higher sibling that is a 1-terminal, if any.
pub(crate) fn monotone_normal_form(
    inner: &mut ManagerInner,
    memo: &mut FxHashMap<NodeId, NodeId>,
    node: NodeId,
) -> Result<NodeId> {
    if inner.pool().get(node).is_terminal() {
        return Ok(node);
    }
    if let Some(&cached) = memo.get(&node) {
        return Ok(cached);
    }
    let index = inner.var_index_of(node).unwrap();
    let degree = inner.domain(index);
    let mut sons = Vec::with_capacity(degree as usize);
    for k in 0..degree {
        sons.push(monotone_normal_form(inner, memo, inner.son_of(node, k))?);
    }
    for k in 0..degree as usize {
        if inner.pool().get(sons[k]).value() == Some(0) {
            if let Some(replacement) = sons[(k + 1)..].iter().find(|&&s| inner.pool().get(s).value() == Some(1)) {
                sons[k] = *replacement;
            }
        }
    }
    let result = inner.make_internal_node(index, &sons)?;
    inner.protect(result);
    memo.insert(node, result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::{DomainKind, Manager, ManagerConfig};
    use crate::ops::And;

    #[test]
    fn basic_dpld_fires_on_critical_component() {
        let m = Manager::new(ManagerConfig::new(2, DomainKind::Binary)).unwrap();
        let x0 = m.variable(0).unwrap();
        let x1 = m.variable(1).unwrap();
        let f = m.apply::<And>(&x0, &x1).unwrap();
        let inner_rc = m.inner_handle();
        let node = {
            let mut inner = inner_rc.borrow_mut();
            dpld(
                &mut inner,
                0,
                0,
                1,
                &DpldKind::Type2 { dir: ChangeDirection::Increase },
                f.node(),
            )
            .unwrap()
        };
        // f = x0 & x1: raising x0 from 0 to 1 changes f's value only when x1=1.
        assert_eq!(m.evaluate(&crate::diagram::Diagram::new(inner_rc.clone(), node), &[0, 1]).unwrap(), 1);
        assert_eq!(m.evaluate(&crate::diagram::Diagram::new(inner_rc, node), &[0, 0]).unwrap(), 0);
    }
}
