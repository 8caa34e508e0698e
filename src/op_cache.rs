//! The operation cache (C4): a fixed-capacity, direct-mapped memo table
//! from `(op_id, lhs, rhs)` to a result node. Collisions overwrite the
//! existing entry outright — there is no chaining, by design, so a hit
//! is always exactly one probe.

use crate::mem::fxhash::mix3;
use crate::mem::prime::next_prime;
use crate::node::NodeId;

#[derive(Clone, Copy, PartialEq, Eq)]
struct Key {
    op_id: u8,
    lhs: NodeId,
    rhs: NodeId,
}

struct Slot {
    key: Key,
    result: NodeId,
}

pub(crate) struct OpCache {
    slots: Vec<Option<Slot>>,
    hits: u64,
    misses: u64,
}

fn key_hash(key: Key) -> u64 {
    mix3(key.op_id as u64, key.lhs.index() as u64, key.rhs.index() as u64)
}

impl OpCache {
    pub fn new(capacity_hint: usize) -> Self {
        let cap = next_prime(capacity_hint.max(61) as u64) as usize;
        OpCache {
            slots: (0..cap).map(|_| None).collect(),
            hits: 0,
            misses: 0,
        }
    }

    fn slot_index(&self, hash: u64) -> usize {
        (hash % self.slots.len() as u64) as usize
    }

    pub fn find(&mut self, op_id: u8, lhs: NodeId, rhs: NodeId) -> Option<NodeId> {
        let key = Key { op_id, lhs, rhs };
        let idx = self.slot_index(key_hash(key));
        match &self.slots[idx] {
            Some(slot) if slot.key == key => {
                self.hits += 1;
                Some(slot.result)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, op_id: u8, lhs: NodeId, rhs: NodeId, result: NodeId) {
        let key = Key { op_id, lhs, rhs };
        let idx = self.slot_index(key_hash(key));
        self.slots[idx] = Some(Slot { key, result });
    }

    /// Resizes the cache to track unique-table growth (`capacity =
    /// round_to_next_prime(cache_ratio * live_nodes)`); existing entries
    /// are dropped rather than rehashed, since the cache is a pure memo
    /// and a miss just recomputes.
    pub fn resize(&mut self, new_capacity_hint: usize) {
        let cap = next_prime(new_capacity_hint.max(61) as u64) as usize;
        if cap != self.slots.len() {
            self.slots = (0..cap).map(|_| None).collect();
        }
    }

    /// Drops every entry whose key or result node is no longer live,
    /// per `is_live`. Called after a GC sweep so the cache never points
    /// at a freed slot.
    pub fn remove_unused(&mut self, is_live: impl Fn(NodeId) -> bool) {
        for slot in &mut self.slots {
            let drop_it = match slot {
                Some(s) => !is_live(s.key.lhs) || !is_live(s.key.rhs) || !is_live(s.result),
                None => false,
            };
            if drop_it {
                *slot = None;
            }
        }
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_find_hits() {
        let mut c = OpCache::new(128);
        let a = NodeId::new(1);
        let b = NodeId::new(2);
        let r = NodeId::new(3);
        assert_eq!(c.find(0, a, b), None);
        c.put(0, a, b, r);
        assert_eq!(c.find(0, a, b), Some(r));
        assert_eq!(c.find(1, a, b), None, "op_id is part of the key");
    }

    #[test]
    fn clear_drops_everything() {
        let mut c = OpCache::new(128);
        c.put(0, NodeId::new(1), NodeId::new(2), NodeId::new(3));
        c.clear();
        assert_eq!(c.find(0, NodeId::new(1), NodeId::new(2)), None);
    }

    #[test]
    fn remove_unused_drops_dead_entries_only() {
        let mut c = OpCache::new(128);
        c.put(0, NodeId::new(1), NodeId::new(2), NodeId::new(3));
        c.put(0, NodeId::new(4), NodeId::new(5), NodeId::new(6));
        c.remove_unused(|n| n != NodeId::new(3));
        assert_eq!(c.find(0, NodeId::new(1), NodeId::new(2)), None);
        assert_eq!(c.find(0, NodeId::new(4), NodeId::new(5)), Some(NodeId::new(6)));
    }
}
