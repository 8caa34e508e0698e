//! Small-buffer-optimised storage for a node's son list.
//!
//! Most variables in practice have a small domain (2 for Boolean
//! components, rarely more than a handful of states for multi-valued
//! ones), so the common case stores sons inline and only a node whose
//! variable has a large domain spills to the heap. This mirrors the
//! inline-array idiom used for small fixed-size collections elsewhere in
//! this codebase, generalised to a variable, runtime-known length.

use crate::node::NodeId;

const INLINE_CAP: usize = 8;

#[derive(Clone, Debug)]
pub(crate) enum SmallSons {
    Inline { buf: [NodeId; INLINE_CAP], len: u8 },
    Heap(Box<[NodeId]>),
}

impl SmallSons {
    pub fn from_slice(sons: &[NodeId]) -> Self {
        if sons.len() <= INLINE_CAP {
            let mut buf = [NodeId::NULL; INLINE_CAP];
            buf[..sons.len()].copy_from_slice(sons);
            SmallSons::Inline {
                buf,
                len: sons.len() as u8,
            }
        } else {
            SmallSons::Heap(sons.to_vec().into_boxed_slice())
        }
    }

    pub fn from_fn(degree: usize, mut f: impl FnMut(usize) -> NodeId) -> Self {
        if degree <= INLINE_CAP {
            let mut buf = [NodeId::NULL; INLINE_CAP];
            for (k, slot) in buf.iter_mut().take(degree).enumerate() {
                *slot = f(k);
            }
            SmallSons::Inline {
                buf,
                len: degree as u8,
            }
        } else {
            SmallSons::Heap((0..degree).map(f).collect())
        }
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[NodeId] {
        match self {
            SmallSons::Inline { buf, len } => &buf[..*len as usize],
            SmallSons::Heap(v) => v,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline(always)]
    pub fn get(&self, k: usize) -> NodeId {
        self.as_slice()[k]
    }

    /// True once every son points at the same node (I1: the internal
    /// node would be redundant and must collapse to that son).
    pub fn all_same(&self) -> bool {
        let s = self.as_slice();
        debug_assert!(!s.is_empty());
        s.iter().all(|&n| n == s[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_roundtrip() {
        let s = SmallSons::from_slice(&[NodeId::new(1), NodeId::new(2), NodeId::new(3)]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.get(1), NodeId::new(2));
    }

    #[test]
    fn heap_fallback_beyond_inline_cap() {
        let sons: Vec<NodeId> = (0..(INLINE_CAP as u32 + 3)).map(NodeId::new).collect();
        let s = SmallSons::from_slice(&sons);
        assert!(matches!(s, SmallSons::Heap(_)));
        assert_eq!(s.len(), sons.len());
        assert_eq!(s.as_slice(), sons.as_slice());
    }

    #[test]
    fn all_same_detection() {
        let uniform = SmallSons::from_slice(&[NodeId::new(7); 4]);
        assert!(uniform.all_same());
        let mixed = SmallSons::from_slice(&[NodeId::new(7), NodeId::new(8)]);
        assert!(!mixed.all_same());
    }
}
