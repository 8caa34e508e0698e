//! The node pool (C1): slab-allocates fixed-layout node slots and reuses
//! freed ones through a free list threaded via `NodeSlot::free_next`.
//!
//! A primary slab is reserved up front; once it is exhausted, overflow
//! slabs are appended one at a time up to a configured budget. The pool
//! never shrinks back to the OS for the life of the manager — reclaimed
//! slots go back on the free list, not back to the allocator.

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::node::{NodeData, NodeId, NodeSlot};

pub(crate) struct Pool {
    slots: Vec<NodeSlot>,
    free_head: NodeId,
    free_count: usize,
    primary_size: usize,
    overflow_size: usize,
    /// `None` means unlimited overflow; `Some(n)` caps the number of
    /// overflow slabs that may be appended beyond the primary one.
    max_overflow_slabs: Option<usize>,
    overflow_slabs_used: usize,
}

impl Pool {
    pub fn new(primary_size: usize, overflow_size: usize, max_overflow_slabs: Option<usize>) -> Self {
        let mut slots = Vec::with_capacity(primary_size);
        Self::extend_with_free_slots(&mut slots, primary_size);
        let free_head = if primary_size == 0 {
            NodeId::NULL
        } else {
            NodeId::new(0)
        };
        Pool {
            slots,
            free_head,
            free_count: primary_size,
            primary_size,
            overflow_size: overflow_size.max(1),
            max_overflow_slabs,
            overflow_slabs_used: 0,
        }
    }

    fn extend_with_free_slots(slots: &mut Vec<NodeSlot>, count: usize) {
        let base = slots.len() as u32;
        for i in 0..count {
            let next = if i + 1 < count {
                NodeId::new(base + i as u32 + 1)
            } else {
                NodeId::NULL
            };
            slots.push(NodeSlot::free(next));
        }
    }

    fn grow_overflow(&mut self) -> Result<()> {
        if let Some(max) = self.max_overflow_slabs {
            if self.overflow_slabs_used >= max {
                return Err(Error::OutOfNodes);
            }
        }
        debug!(
            "node pool exhausted ({} slots live); allocating overflow slab #{} of {} slots",
            self.slots.len() - self.free_count,
            self.overflow_slabs_used + 1,
            self.overflow_size
        );
        let base = self.slots.len() as u32;
        self.slots.reserve(self.overflow_size);
        Self::extend_with_free_slots(&mut self.slots, self.overflow_size);
        self.free_head = NodeId::new(base);
        self.free_count += self.overflow_size;
        self.overflow_slabs_used += 1;
        Ok(())
    }

    /// Pops a free slot, installs `data`, and returns its id. Ref-count
    /// starts at zero; the caller is responsible for bumping it once the
    /// node is actually referenced.
    pub fn alloc(&mut self, data: NodeData) -> Result<NodeId> {
        if self.free_head.is_null() {
            self.grow_overflow()?;
        }
        let id = self.free_head;
        let idx = id.index();
        self.free_head = self.slots[idx].free_next;
        self.free_count -= 1;
        let slot = &mut self.slots[idx];
        slot.data = Some(data);
        slot.refcount = 0;
        slot.mark.set(false);
        slot.in_table = false;
        trace!("alloc node {idx}");
        Ok(id)
    }

    /// Returns a slot to the free list. The caller must have already
    /// removed the node from its unique table and dropped references to
    /// its sons (cascading that release is the allocator's caller's job,
    /// not the pool's).
    pub fn free(&mut self, id: NodeId) {
        let idx = id.index();
        debug_assert!(self.slots[idx].data.is_some(), "double free of node {idx}");
        self.slots[idx].data = None;
        self.slots[idx].free_next = self.free_head;
        self.free_head = id;
        self.free_count += 1;
        trace!("free node {idx}");
    }

    #[inline(always)]
    pub fn get(&self, id: NodeId) -> &NodeSlot {
        &self.slots[id.index()]
    }

    #[inline(always)]
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeSlot {
        &mut self.slots[id.index()]
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free_count
    }

    pub fn free_count(&self) -> usize {
        self.free_count
    }

    pub fn primary_size(&self) -> usize {
        self.primary_size
    }

    pub fn iter_live(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.data.is_some())
            .map(|(i, _)| NodeId::new(i as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_and_free_reuses_slots() {
        let mut pool = Pool::new(2, 2, Some(0));
        let a = pool.alloc(NodeData::Terminal { value: 0 }).unwrap();
        let b = pool.alloc(NodeData::Terminal { value: 1 }).unwrap();
        assert!(pool.alloc(NodeData::Terminal { value: 2 }).is_err());
        pool.free(a);
        let c = pool.alloc(NodeData::Terminal { value: 3 }).unwrap();
        assert_eq!(c, a);
        pool.free(b);
        pool.free(c);
        assert_eq!(pool.live_count(), 0);
    }

    #[test]
    fn overflow_slab_grows_capacity() {
        let mut pool = Pool::new(1, 4, Some(1));
        let _a = pool.alloc(NodeData::Terminal { value: 0 }).unwrap();
        let _b = pool.alloc(NodeData::Terminal { value: 1 }).unwrap();
        assert!(pool.capacity() >= 5);
        for _ in 0..3 {
            pool.alloc(NodeData::Terminal { value: 2 }).unwrap();
        }
        assert!(pool.alloc(NodeData::Terminal { value: 9 }).is_err());
    }
}
