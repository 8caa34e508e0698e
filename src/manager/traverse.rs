//! Traversal primitives (C7): pre/post/level-order walks over a diagram's
//! node graph, sharing the node's mark bit to avoid revisiting shared
//! subgraphs. Each walk restores the mark bit on the way out so that the
//! graph is clean for whoever traverses it next.

use crate::node::{NodeId, VarIndex};

use super::ManagerInner;

fn restore_marks(inner: &ManagerInner, visited: &[NodeId]) {
    for &id in visited {
        inner.pool().get(id).mark.set(false);
    }
}

pub(super) fn pre_order(inner: &ManagerInner, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let slot = inner.pool().get(id);
        if slot.mark.get() {
            continue;
        }
        slot.mark.set(true);
        out.push(id);
        if let Some(sons) = slot.sons() {
            for k in (0..sons.len()).rev() {
                stack.push(sons.get(k));
            }
        }
    }
    restore_marks(inner, &out);
    out
}

fn post_order_rec(inner: &ManagerInner, id: NodeId, out: &mut Vec<NodeId>) {
    let slot = inner.pool().get(id);
    if slot.mark.get() {
        return;
    }
    slot.mark.set(true);
    if let Some(sons) = slot.sons() {
        for k in 0..sons.len() {
            post_order_rec(inner, sons.get(k), out);
        }
    }
    out.push(id);
}

pub(super) fn post_order(inner: &ManagerInner, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    post_order_rec(inner, root, &mut out);
    restore_marks(inner, &out);
    out
}

/// Nodes reachable from `root`, sorted by their intrinsic level (0 =
/// topmost variable, leaf level = terminal) rather than discovery order.
pub(super) fn level_order(inner: &ManagerInner, root: NodeId) -> Vec<NodeId> {
    let mut nodes = pre_order(inner, root);
    nodes.sort_by_key(|&id| inner.level_of_node(id));
    nodes
}

pub(super) fn dependency_set(inner: &ManagerInner, root: NodeId) -> Vec<VarIndex> {
    let mut vars: Vec<VarIndex> = pre_order(inner, root)
        .into_iter()
        .filter_map(|id| inner.var_index_of(id))
        .collect();
    vars.sort_unstable();
    vars.dedup();
    vars
}
