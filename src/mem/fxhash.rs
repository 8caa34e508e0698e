//! A small rotate-xor-multiply hasher for node identities and cache keys.
//!
//! Node identities are dense `u32` slab indices, not pointers, so a
//! cryptographic hash buys nothing here; we want something that mixes a
//! handful of words fast and spreads well enough for open addressing.

use std::hash::{BuildHasherDefault, Hasher};

const ROTATE: u32 = 5;
const PRIME64: u64 = 0x517cc1b727220a95;

#[inline(always)]
fn mix(state: u64, word: u64) -> u64 {
    (state.rotate_left(ROTATE) ^ word).wrapping_mul(PRIME64)
}

#[derive(Default)]
pub struct FxHasher(u64);

pub type FxBuildHasher = BuildHasherDefault<FxHasher>;
pub type FxHashMap<K, V> = std::collections::HashMap<K, V, FxBuildHasher>;

impl Hasher for FxHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, mut bytes: &[u8]) {
        let mut state = self.0;
        while bytes.len() >= 8 {
            let word = u64::from_ne_bytes(bytes[..8].try_into().unwrap());
            state = mix(state, word);
            bytes = &bytes[8..];
        }
        if !bytes.is_empty() {
            let mut buf = [0u8; 8];
            buf[..bytes.len()].copy_from_slice(bytes);
            state = mix(state, u64::from_ne_bytes(buf));
        }
        self.0 = state;
    }

    fn write_u32(&mut self, i: u32) {
        self.0 = mix(self.0, i as u64);
    }

    fn write_u64(&mut self, i: u64) {
        self.0 = mix(self.0, i);
    }

    fn write_usize(&mut self, i: usize) {
        self.0 = mix(self.0, i as u64);
    }

    fn write_u8(&mut self, i: u8) {
        self.0 = mix(self.0, i as u64);
    }
}

/// Mixes a small fixed set of words without going through the `Hasher`
/// trait machinery; used by the direct-mapped operation cache where the
/// key shape (`op_id`, `lhs`, `rhs`) is always three words.
#[inline(always)]
pub fn mix3(a: u64, b: u64, c: u64) -> u64 {
    mix(mix(mix(0, a), b), c)
}
