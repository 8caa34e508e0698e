//! The GC coordinator (C9): a mark-sweep pass over the node graph.
//!
//! Sons are non-owning references (see the diagram handle's drop
//! semantics), so liveness isn't a per-node ref-count — it's reachability
//! from whatever nodes a live [`crate::diagram::Diagram`] currently roots.
//! Ref-counts only ever mark the roots; everything else is found by
//! walking from them.

use log::debug;

use crate::error::Result;
use crate::node::NodeId;

use super::ManagerInner;

fn mark_reachable(inner: &ManagerInner, root: NodeId) {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let slot = inner.pool().get(id);
        if slot.mark.get() {
            continue;
        }
        slot.mark.set(true);
        if let Some(sons) = slot.sons() {
            for k in 0..sons.len() {
                stack.push(sons.get(k));
            }
        }
    }
}

/// Runs one full mark-sweep and returns the number of nodes reclaimed.
///
/// Roots are every node with `refcount > 0` *plus* every node currently
/// on the protected-node stack (§`ManagerInner::protect`): a recursive
/// construction like `apply`/`dpld`/a reorder swap builds intermediate
/// nodes that aren't rooted until the whole call returns, and this GC can
/// itself run mid-construction (triggered by `alloc_with_retry`) — without
/// the protected stack, those in-flight nodes would look unreachable and
/// get swept out from under the call that's still holding their `NodeId`.
pub(super) fn run(inner: &mut ManagerInner) -> Result<usize> {
    let live_ids: Vec<NodeId> = inner.pool().iter_live().collect();
    let roots: Vec<NodeId> = live_ids
        .iter()
        .copied()
        .filter(|&id| inner.pool().get(id).refcount > 0)
        .chain(inner.protected_ids().iter().copied())
        .collect();
    for &root in &roots {
        mark_reachable(inner, root);
    }

    let dead: Vec<NodeId> = live_ids.iter().copied().filter(|&id| !inner.pool().get(id).mark.get()).collect();

    for &id in &dead {
        let slot = inner.pool().get(id);
        if let Some(index) = slot.var_index() {
            let sons = slot.sons().unwrap().as_slice().to_vec();
            inner.tables[index as usize].erase(&sons);
        } else if let Some(value) = slot.value() {
            inner.terminals.remove(&value);
        }
        inner.pool_mut().free(id);
    }

    for &id in &live_ids {
        if !dead.contains(&id) {
            inner.pool().get(id).mark.set(false);
        }
    }

    let reclaimed = dead.len();
    let pool = &inner.pool;
    inner.op_cache.remove_unused(|n| pool.get(n).data.is_some());
    debug!("gc: reclaimed {reclaimed} of {} tracked nodes", live_ids.len());
    Ok(reclaimed)
}
