//! A thin expression-tree adapter: walks any caller-supplied recursive
//! value and reduces it via the manager's node-building primitives. The
//! combining operation varies per tree node, so unlike `apply<Op>` this
//! cannot route through the manager's persistent operation cache (an
//! operation id table only makes sense for a fixed, stable set of ops) —
//! reduction instead carries its own per-call, non-persistent caches.

use crate::error::Result;
use crate::manager::{Manager, ManagerInner};
use crate::mem::fxhash::FxHashMap;
use crate::node::{NodeId, VarIndex, NONDETERMINED};

/// Anything shaped like a binary expression tree: a variable reference, a
/// constant, or an operation over two subtrees evaluated pointwise by
/// `evaluate`.
pub trait ExpressionNode {
    fn is_variable(&self) -> bool;
    fn is_constant(&self) -> bool;
    fn is_operation(&self) -> bool;
    fn get_index(&self) -> VarIndex;
    fn get_value(&self) -> i32;
    fn get_left(&self) -> &Self;
    fn get_right(&self) -> &Self;
    fn evaluate(&self, lhs: i32, rhs: i32) -> i32;
}

/// Every return path protects its result the same way `apply_rec` does: a
/// sibling recursive call lower in the same `reduce_rec` tree can allocate
/// and trigger a GC sweep while this result is still reachable only from a
/// local `sons`/call-stack variable, not yet from any root.
fn dynamic_apply(
    inner: &mut ManagerInner,
    cache: &mut FxHashMap<(NodeId, NodeId), NodeId>,
    lhs: NodeId,
    rhs: NodeId,
    combine: &impl Fn(i32, i32) -> i32,
) -> Result<NodeId> {
    if let Some(&cached) = cache.get(&(lhs, rhs)) {
        return Ok(cached);
    }
    let lv = inner.value_or_nondet(lhs);
    let rv = inner.value_or_nondet(rhs);
    let result = if lv != NONDETERMINED && rv != NONDETERMINED {
        inner.make_terminal(combine(lv, rv))?
    } else {
        let lhs_level = inner.level_of_node(lhs);
        let rhs_level = inner.level_of_node(rhs);
        let top_level = lhs_level.min(rhs_level);
        let top_index = inner.index_at_level(top_level);
        let degree = inner.domain(top_index);
        let mut sons = Vec::with_capacity(degree as usize);
        for k in 0..degree {
            let lhs_k = if lhs_level == top_level { inner.son_of(lhs, k) } else { lhs };
            let rhs_k = if rhs_level == top_level { inner.son_of(rhs, k) } else { rhs };
            sons.push(dynamic_apply(inner, cache, lhs_k, rhs_k, combine)?);
        }
        inner.make_internal_node(top_index, &sons)?
    };
    inner.protect(result);
    cache.insert((lhs, rhs), result);
    Ok(result)
}

fn variable_node(inner: &mut ManagerInner, index: VarIndex) -> Result<NodeId> {
    let degree = inner.domain(index);
    let mut sons = Vec::with_capacity(degree as usize);
    for v in 0..degree as i32 {
        let son = inner.make_terminal(v)?;
        inner.protect(son);
        sons.push(son);
    }
    let result = inner.make_internal_node(index, &sons)?;
    inner.protect(result);
    Ok(result)
}

fn reduce_rec<E: ExpressionNode>(
    inner: &mut ManagerInner,
    memo: &mut FxHashMap<usize, NodeId>,
    node: &E,
) -> Result<NodeId> {
    let key = node as *const E as usize;
    if let Some(&cached) = memo.get(&key) {
        return Ok(cached);
    }
    let result = if node.is_variable() {
        variable_node(inner, node.get_index())?
    } else if node.is_constant() {
        let result = inner.make_terminal(node.get_value())?;
        inner.protect(result);
        result
    } else {
        debug_assert!(node.is_operation());
        let lhs = reduce_rec(inner, memo, node.get_left())?;
        let rhs = reduce_rec(inner, memo, node.get_right())?;
        let mut local_cache = FxHashMap::default();
        dynamic_apply(inner, &mut local_cache, lhs, rhs, &|a, b| node.evaluate(a, b))?
    };
    memo.insert(key, result);
    Ok(result)
}

/// Reduces an expression tree into a diagram in `m`, using a cache keyed
/// by tree-node identity that lives only for the duration of this call.
pub fn from_expression<E: ExpressionNode>(m: &Manager, root: &E) -> Result<crate::diagram::Diagram> {
    let inner_rc = m.inner_handle();
    let mut inner = inner_rc.borrow_mut();
    let mark = inner.protected_mark();
    let mut memo = FxHashMap::default();
    let outcome = reduce_rec(&mut inner, &mut memo, root);
    if outcome.is_err() {
        inner.release_protected(mark);
    }
    let node = outcome?;
    drop(inner);
    let result = crate::diagram::Diagram::new(inner_rc.clone(), node);
    inner_rc.borrow_mut().release_protected(mark);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::{DomainKind, ManagerConfig};

    enum Expr {
        Var(VarIndex),
        Const(i32),
        And(Box<Expr>, Box<Expr>),
    }

    impl ExpressionNode for Expr {
        fn is_variable(&self) -> bool {
            matches!(self, Expr::Var(_))
        }
        fn is_constant(&self) -> bool {
            matches!(self, Expr::Const(_))
        }
        fn is_operation(&self) -> bool {
            matches!(self, Expr::And(..))
        }
        fn get_index(&self) -> VarIndex {
            match self {
                Expr::Var(i) => *i,
                _ => unreachable!(),
            }
        }
        fn get_value(&self) -> i32 {
            match self {
                Expr::Const(v) => *v,
                _ => unreachable!(),
            }
        }
        fn get_left(&self) -> &Self {
            match self {
                Expr::And(l, _) => l,
                _ => unreachable!(),
            }
        }
        fn get_right(&self) -> &Self {
            match self {
                Expr::And(_, r) => r,
                _ => unreachable!(),
            }
        }
        fn evaluate(&self, lhs: i32, rhs: i32) -> i32 {
            (lhs != 0 && rhs != 0) as i32
        }
    }

    #[test]
    fn reduces_and_expression_tree() {
        let m = Manager::new(ManagerConfig::new(2, DomainKind::Binary)).unwrap();
        let tree = Expr::And(Box::new(Expr::Var(0)), Box::new(Expr::Var(1)));
        let f = from_expression(&m, &tree).unwrap();
        assert_eq!(m.evaluate(&f, &[1, 1]).unwrap(), 1);
        assert_eq!(m.evaluate(&f, &[1, 0]).unwrap(), 0);
    }
}
