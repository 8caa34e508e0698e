//! Regression coverage for the protected-node-stack GC safety mechanism:
//! a manager configured with a pool too small to finish a big `apply`
//! call without an internal garbage collection must still produce a
//! correct diagram, because every node that `apply_rec` has already
//! built but not yet wired into its parent is shielded from the sweep
//! that an `alloc_with_retry` failure triggers mid-recursion.

use rdd::ops::{And, Or, Xor};
use rdd::{DomainKind, Manager, ManagerConfig};

fn parity(bits: &[u32]) -> i32 {
    (bits.iter().sum::<u32>() % 2) as i32
}

#[test]
fn gc_triggered_mid_apply_still_evaluates_correctly() {
    // 8 variables, a pool barely larger than what building them alone
    // costs, and overflow disabled outright: the big cross-combining
    // `apply` below has no way to finish without at least one internal
    // `gc::run`, and most likely several, triggered from deep inside its
    // own recursion while earlier sibling sons are still sitting unwired
    // in an ancestor stack frame.
    let m = Manager::new(
        ManagerConfig::new(8, DomainKind::Binary)
            .primary_pool_size(16)
            .overflow_pool_size(1)
            .max_overflow_slabs(0),
    )
    .unwrap();
    let vars = m.variables(0..8).unwrap();

    // Build and drop a few throwaway combinations so the pool holds real,
    // reclaimable garbage by the time the big call below needs more room
    // than is left — otherwise a GC triggered with nothing dead to sweep
    // would just fail the retry and this test would never reach the
    // scenario under test.
    {
        let _junk_a = m.apply::<And>(&vars[0], &vars[3]).unwrap();
        let _junk_b = m.apply::<Or>(&vars[1], &vars[5]).unwrap();
        let _junk_c = m.apply::<Xor>(&vars[2], &vars[6]).unwrap();
    }

    let p = m.tree_fold::<Xor>(&vars[0..4]).unwrap();
    let q = m.tree_fold::<Xor>(&vars[4..8]).unwrap();

    // A single apply call combining two independently-built, non-trivial
    // diagrams: no absorbing element to short-circuit it, so it has to
    // build a genuinely new node for most of the reachable (lhs, rhs)
    // pairs in one recursive descent.
    let f = m.apply::<Xor>(&p, &q).unwrap();

    for mask in 0..256u32 {
        let bits: Vec<u32> = (0..8).map(|k| (mask >> k) & 1).collect();
        assert_eq!(m.evaluate(&f, &bits).unwrap(), parity(&bits), "mismatch at mask {mask}");
    }

    // A further forced GC, now that `f` is the only thing still rooted
    // beyond the variables, must not disturb it either.
    m.force_gc().unwrap();
    for mask in 0..256u32 {
        let bits: Vec<u32> = (0..8).map(|k| (mask >> k) & 1).collect();
        assert_eq!(m.evaluate(&f, &bits).unwrap(), parity(&bits), "mismatch after forced gc at mask {mask}");
    }
}
