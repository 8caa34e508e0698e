//! The apply engine (C6): the generic recursive combinator every binary
//! operator on diagrams is built from.

use crate::error::Result;
use crate::node::{NodeId, NONDETERMINED};
use crate::ops::BinOp;

use super::ManagerInner;

/// Every return path pushes its result onto `inner`'s protected-node
/// stack before handing it back: a sibling recursive call further down
/// this same top-level `apply` may allocate, run out of room, and trigger
/// a GC sweep, and at that point this result is reachable only from the
/// `sons` vector of whichever stack frame is still assembling it — not
/// yet from any root. The top-level caller releases the whole stack back
/// to its starting mark once the final result is rooted.
pub(super) fn apply_rec<Op: BinOp>(inner: &mut ManagerInner, lhs: NodeId, rhs: NodeId) -> Result<NodeId> {
    if let Some(absorbing) = Op::ABSORBING {
        if inner.is_terminal_value(lhs, absorbing) || inner.is_terminal_value(rhs, absorbing) {
            let result = inner.make_terminal(absorbing)?;
            inner.protect(result);
            return Ok(result);
        }
    }

    if let Some(hit) = inner.op_cache_mut().find(Op::ID, lhs, rhs) {
        inner.protect(hit);
        return Ok(hit);
    }

    let lv = inner.value_or_nondet(lhs);
    let rv = inner.value_or_nondet(rhs);
    let op_val = if lv == NONDETERMINED || rv == NONDETERMINED {
        NONDETERMINED
    } else {
        Op::apply(lv, rv)
    };

    let result = if op_val != NONDETERMINED {
        inner.make_terminal(op_val)?
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
            sons.push(apply_rec::<Op>(inner, lhs_k, rhs_k)?);
        }
        inner.make_internal_node(top_index, &sons)?
    };

    inner.protect(result);
    inner.op_cache_mut().put(Op::ID, lhs, rhs, result);
    Ok(result)
}
