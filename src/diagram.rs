//! The diagram handle (C5): an owning reference to a root node.
//!
//! Cloning bumps the node's root ref-count; dropping releases it. Nodes
//! reachable only as descendants of a root are not ref-counted directly —
//! they are kept alive by reachability and reclaimed by the GC coordinator's
//! mark-sweep pass (see `manager::gc`), not by a cascading decrement here.

use std::cell::RefCell;
use std::rc::Rc;

use crate::manager::ManagerInner;
use crate::node::NodeId;

pub struct Diagram {
    pub(crate) inner: Rc<RefCell<ManagerInner>>,
    pub(crate) node: NodeId,
}

impl Diagram {
    pub(crate) fn new(inner: Rc<RefCell<ManagerInner>>, node: NodeId) -> Self {
        inner.borrow_mut().bump_root(node);
        Diagram { inner, node }
    }

    pub(crate) fn node(&self) -> NodeId {
        self.node
    }

    /// True when `self` and `other` are handles into the same manager.
    pub fn same_manager(&self, other: &Diagram) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Clone for Diagram {
    fn clone(&self) -> Self {
        self.inner.borrow_mut().bump_root(self.node);
        Diagram {
            inner: self.inner.clone(),
            node: self.node,
        }
    }
}

impl Drop for Diagram {
    fn drop(&mut self) {
        self.inner.borrow_mut().release_root(self.node);
    }
}

/// Two diagrams are equal iff they are the same root node of the same
/// manager — pointer identity, the payoff of hash-consing (I1-I4).
impl PartialEq for Diagram {
    fn eq(&self, other: &Self) -> bool {
        self.same_manager(other) && self.node == other.node
    }
}
impl Eq for Diagram {}

impl std::fmt::Debug for Diagram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Diagram(node={:?})", self.node)
    }
}
