//! The unique table (C2): one per-variable hash table enforcing I2 (no
//! two live internal nodes with the same variable share a son tuple).
//!
//! Open addressing with linear probing; capacity follows a doubling
//! schedule of primes and a rehash triggers once the load factor passes
//! 3/4, same shape as the manager's operation cache (C4) but chained
//! through separate per-variable instances rather than one shared table.

use log::debug;

use crate::mem::fxhash::FxHasher;
use crate::mem::prime::next_prime;
use crate::node::{NodeId, VarIndex};
use std::hash::Hasher;

struct Entry {
    hash: u64,
    sons: Box<[NodeId]>,
    node: NodeId,
}

pub(crate) struct UniqueTable {
    #[allow(dead_code)]
    index: VarIndex,
    buckets: Vec<Option<Entry>>,
    len: usize,
}

const INITIAL_CAPACITY: u64 = 307;

fn hash_sons(index: VarIndex, sons: &[NodeId]) -> u64 {
    let mut h = FxHasher::default();
    h.write_u32(index);
    for s in sons {
        h.write_u32(s.index() as u32);
    }
    h.finish()
}

impl UniqueTable {
    pub fn new(index: VarIndex) -> Self {
        UniqueTable {
            index,
            buckets: (0..INITIAL_CAPACITY).map(|_| None).collect(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn load_factor_exceeded(&self) -> bool {
        self.len * 4 > self.buckets.len() * 3
    }

    fn probe(&self, hash: u64, sons: &[NodeId]) -> usize {
        let cap = self.buckets.len() as u64;
        let mut slot = (hash % cap) as usize;
        loop {
            match &self.buckets[slot] {
                None => return slot,
                Some(e) if e.hash == hash && e.sons.as_ref() == sons => return slot,
                _ => slot = (slot + 1) % self.buckets.len(),
            }
        }
    }

    pub fn find(&self, sons: &[NodeId]) -> Option<NodeId> {
        let hash = hash_sons(self.index, sons);
        let slot = self.probe(hash, sons);
        self.buckets[slot].as_ref().map(|e| e.node)
    }

    pub fn insert(&mut self, sons: &[NodeId], node: NodeId) {
        if self.load_factor_exceeded() {
            self.rehash();
        }
        let hash = hash_sons(self.index, sons);
        let slot = self.probe(hash, sons);
        if self.buckets[slot].is_none() {
            self.len += 1;
        }
        self.buckets[slot] = Some(Entry {
            hash,
            sons: sons.to_vec().into_boxed_slice(),
            node,
        });
    }

    /// Removes the entry whose sons tuple is `sons` (the caller already
    /// knows this from the node it is evicting).
    pub fn erase(&mut self, sons: &[NodeId]) -> bool {
        let hash = hash_sons(self.index, sons);
        let mut slot = self.probe(hash, sons);
        if self.buckets[slot].is_none() {
            return false;
        }
        self.buckets[slot] = None;
        self.len -= 1;
        // Linear-probing deletion: close the gap by reinserting every
        // entry in the cluster that follows, or later lookups that
        // probed past the now-empty slot would wrongly report a miss.
        loop {
            slot = (slot + 1) % self.buckets.len();
            let Some(entry) = self.buckets[slot].take() else {
                break;
            };
            let target = (entry.hash % self.buckets.len() as u64) as usize;
            let mut reinsert_at = target;
            while self.buckets[reinsert_at].is_some() {
                reinsert_at = (reinsert_at + 1) % self.buckets.len();
            }
            self.buckets[reinsert_at] = Some(entry);
        }
        true
    }

    fn rehash(&mut self) {
        let new_cap = next_prime(self.buckets.len() as u64 * 2);
        debug!(
            "unique table rehash: {} -> {} buckets ({} live entries)",
            self.buckets.len(),
            new_cap,
            self.len
        );
        let old = std::mem::replace(&mut self.buckets, (0..new_cap).map(|_| None).collect());
        for entry in old.into_iter().flatten() {
            let mut slot = (entry.hash % new_cap) as usize;
            while self.buckets[slot].is_some() {
                slot = (slot + 1) % self.buckets.len();
            }
            self.buckets[slot] = Some(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(i: u32) -> NodeId {
        NodeId::new(i)
    }

    #[test]
    fn insert_find_erase_roundtrip() {
        let mut t = UniqueTable::new(0);
        t.insert(&[n(1), n(2)], n(100));
        assert_eq!(t.find(&[n(1), n(2)]), Some(n(100)));
        assert_eq!(t.find(&[n(2), n(1)]), None);
        assert!(t.erase(&[n(1), n(2)]));
        assert_eq!(t.find(&[n(1), n(2)]), None);
    }

    #[test]
    fn rehash_preserves_all_entries() {
        let mut t = UniqueTable::new(0);
        for i in 0..1000u32 {
            t.insert(&[n(i), n(i + 1)], n(i + 10_000));
        }
        assert_eq!(t.len(), 1000);
        for i in 0..1000u32 {
            assert_eq!(t.find(&[n(i), n(i + 1)]), Some(n(i + 10_000)));
        }
    }

    #[test]
    fn erase_keeps_cluster_reachable() {
        let mut t = UniqueTable::new(0);
        // force a small, easily-colliding table by reusing the same
        // first word so entries cluster in one probe sequence
        for i in 0..20u32 {
            t.insert(&[n(0), n(i)], n(i));
        }
        assert!(t.erase(&[n(0), n(5)]));
        for i in 0..20u32 {
            if i == 5 {
                continue;
            }
            assert_eq!(t.find(&[n(0), n(i)]), Some(n(i)), "lost entry {i} after erase");
        }
    }
}
