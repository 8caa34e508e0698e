//! The reordering engine (C10): adjacent-level variable swaps and a
//! sifting heuristic built from them.
//!
//! A swapped node keeps its id: its slot is overwritten in place with the
//! recomposed content, so nodes that reference it by `NodeId` see the new
//! function without any parent rewrite. The one case that needs an actual
//! rewrite is a node whose two new cofactors turn out equal (it would
//! collapse under I1) — if nothing still roots it directly we retarget
//! every remaining reference to the surviving son and free its slot; if a
//! live diagram handle roots it directly, its id can't disappear out from
//! under that handle, so it's kept as a momentarily non-reduced node (the
//! documented reason `force_reorder`'s canonicity guarantee lasts only
//! until the next `reduce` call).

use crate::error::Result;
use crate::mem::fxhash::FxHashMap;
use crate::mem::small_sons::SmallSons;
use crate::node::{Level, NodeData, NodeId, VarIndex};

use super::ManagerInner;

fn apply_substitutions(inner: &mut ManagerInner, subs: &mut FxHashMap<NodeId, NodeId>) {
    loop {
        let mut changed = false;
        let ids: Vec<NodeId> = inner.pool().iter_live().collect();
        for id in ids {
            if subs.contains_key(&id) {
                continue;
            }
            let resolved = {
                let slot = inner.pool().get(id);
                match slot.var_index() {
                    Some(var) => Some((var, slot.sons().unwrap().as_slice().to_vec())),
                    None => None,
                }
            };
            let Some((var, old_sons)) = resolved else { continue };
            let new_sons: Vec<NodeId> = old_sons.iter().map(|s| *subs.get(s).unwrap_or(s)).collect();
            if new_sons == old_sons {
                continue;
            }
            inner.tables[var as usize].erase(&old_sons);
            if new_sons.iter().all(|&s| s == new_sons[0]) && inner.pool().get(id).refcount == 0 {
                subs.insert(id, new_sons[0]);
            } else {
                inner.pool_mut().get_mut(id).data = Some(NodeData::Internal {
                    index: var,
                    sons: SmallSons::from_slice(&new_sons),
                });
                inner.tables[var as usize].insert(&new_sons, id);
            }
            changed = true;
        }
        if !changed {
            break;
        }
    }
    for &old_id in subs.keys() {
        if inner.pool().get(old_id).data.is_some() {
            inner.pool_mut().free(old_id);
        }
    }
}

fn swap_adjacent(inner: &mut ManagerInner, level: Level) -> Result<()> {
    let i = inner.index_at_level(level);
    let j = inner.index_at_level(level + 1);
    let di = inner.domain(i);
    let dj = inner.domain(j);

    let i_nodes: Vec<NodeId> = inner.pool().iter_live().filter(|&id| inner.var_index_of(id) == Some(i)).collect();
    let mut subs: FxHashMap<NodeId, NodeId> = FxHashMap::default();

    // Each recomputed column is a fresh node with refcount 0 until it's wired
    // into its owning `n`'s slot (or chosen as a substitution target below);
    // either `make_internal_node` for a sibling column, or `apply_substitutions`
    // further down, can trigger a GC that would otherwise see it as
    // unreachable, so every column stays protected for the whole pass.
    let mark = inner.protected_mark();

    let outcome: Result<()> = (|| {
        for n in &i_nodes {
            let n = *n;
            let a: Vec<NodeId> = inner.pool().get(n).sons().unwrap().as_slice().to_vec();
            inner.tables[i as usize].erase(&a);

            let mut new_j_sons = Vec::with_capacity(dj as usize);
            for m in 0..dj {
                let column: Vec<NodeId> = (0..di)
                    .map(|k| {
                        let ak = a[k as usize];
                        if inner.var_index_of(ak) == Some(j) {
                            inner.son_of(ak, m)
                        } else {
                            ak
                        }
                    })
                    .collect();
                let col_node = inner.make_internal_node(j, &column)?;
                inner.protect(col_node);
                new_j_sons.push(col_node);
            }

            if new_j_sons.iter().all(|&s| s == new_j_sons[0]) && inner.pool().get(n).refcount == 0 {
                subs.insert(n, new_j_sons[0]);
            } else {
                inner.pool_mut().get_mut(n).data = Some(NodeData::Internal {
                    index: i,
                    sons: SmallSons::from_slice(&new_j_sons),
                });
                inner.tables[i as usize].insert(&new_j_sons, n);
            }
        }
        Ok(())
    })();

    if outcome.is_ok() && !subs.is_empty() {
        apply_substitutions(inner, &mut subs);
    }
    inner.release_protected(mark);
    outcome?;

    inner.order.swap(level as usize, (level + 1) as usize);
    inner.level_of[i as usize] = level + 1;
    inner.level_of[j as usize] = level;
    // A reorder invalidates every cached (op, lhs, rhs) triple: lhs/rhs
    // may now denote nodes whose level relationship has changed. Flushed
    // unconditionally, per the hard guarantee in the design notes.
    inner.op_cache_mut().clear();
    Ok(())
}

fn sift_one_variable(inner: &mut ManagerInner, index: VarIndex) -> Result<()> {
    let last_level = inner.var_count() - 1;
    let mut level = inner.level_of_index(index);
    let mut best_level = level;
    let mut best_count = inner.node_count_total();

    while level > 0 {
        swap_adjacent(inner, level - 1)?;
        level -= 1;
        let count = inner.node_count_total();
        if count < best_count {
            best_count = count;
            best_level = level;
        }
    }
    while level < last_level {
        swap_adjacent(inner, level)?;
        level += 1;
        let count = inner.node_count_total();
        if count < best_count {
            best_count = count;
            best_level = level;
        }
    }
    while level > best_level {
        swap_adjacent(inner, level - 1)?;
        level -= 1;
    }
    while level < best_level {
        swap_adjacent(inner, level)?;
        level += 1;
    }
    Ok(())
}

/// Runs one sifting pass: every variable, highest unique-table occupancy
/// first, is swept through every level and parked at whichever position
/// minimised the manager's total node count.
pub(super) fn sift(inner: &mut ManagerInner) -> Result<()> {
    let var_count = inner.var_count();
    if var_count < 2 {
        return Ok(());
    }
    let mut priority: Vec<VarIndex> = (0..var_count).collect();
    priority.sort_by_key(|&v| std::cmp::Reverse(inner.tables[v as usize].len()));
    for v in priority {
        sift_one_variable(inner, v)?;
    }
    Ok(())
}
