//! Universal invariants that must hold for every manager regardless of
//! which concrete scenario produced the diagrams: apply correctness
//! across the operation set, satisfy-count/satisfy-all agreement, and
//! GC soundness.

use rdd::ops::{And, BinOp, Eq as OpEq, Ge, Gt, Implies, Le, Lt, Max, Min, Nand, Neq, Nor, Or, Xnor, Xor};
use rdd::{DomainKind, Manager, ManagerConfig};

fn check_apply_matches<Op: BinOp>(m: &Manager, a: &rdd::Diagram, b: &rdd::Diagram) {
    let f = m.apply::<Op>(a, b).unwrap();
    for x in 0..2u32 {
        for y in 0..2u32 {
            let got = m.evaluate(&f, &[x, y]).unwrap();
            let want = Op::apply(x as i32, y as i32);
            assert_eq!(got, want, "mismatch for x={x}, y={y}");
        }
    }
}

#[test]
fn apply_matches_op_table_for_every_binary_op() {
    let m = Manager::new(ManagerConfig::new(2, DomainKind::Binary)).unwrap();
    let a = m.variable(0).unwrap();
    let b = m.variable(1).unwrap();

    check_apply_matches::<And>(&m, &a, &b);
    check_apply_matches::<Or>(&m, &a, &b);
    check_apply_matches::<Xor>(&m, &a, &b);
    check_apply_matches::<Xnor>(&m, &a, &b);
    check_apply_matches::<Nand>(&m, &a, &b);
    check_apply_matches::<Nor>(&m, &a, &b);
    check_apply_matches::<Implies>(&m, &a, &b);
    check_apply_matches::<OpEq>(&m, &a, &b);
    check_apply_matches::<Neq>(&m, &a, &b);
    check_apply_matches::<Lt>(&m, &a, &b);
    check_apply_matches::<Le>(&m, &a, &b);
    check_apply_matches::<Gt>(&m, &a, &b);
    check_apply_matches::<Ge>(&m, &a, &b);
    check_apply_matches::<Min>(&m, &a, &b);
    check_apply_matches::<Max>(&m, &a, &b);
}

#[test]
fn satisfy_count_partitions_the_whole_domain() {
    let m = Manager::new(ManagerConfig::new(4, DomainKind::Binary)).unwrap();
    let vars: Vec<_> = (0..4).map(|i| m.variable(i).unwrap()).collect();
    let a = m.apply::<And>(&vars[0], &vars[1]).unwrap();
    let b = m.apply::<And>(&vars[2], &vars[3]).unwrap();
    let f = m.apply::<Or>(&a, &b).unwrap();

    let ones = m.satisfy_count(1, &f).unwrap();
    let zeros = m.satisfy_count(0, &f).unwrap();
    assert_eq!(ones + zeros, 16);

    let all_ones: Vec<Vec<u32>> = m.satisfy_all(1, &f).unwrap();
    assert_eq!(all_ones.len() as u64, ones);
    for assignment in &all_ones {
        let evaluated = m.evaluate(&f, assignment).unwrap();
        assert_eq!(evaluated, 1);
    }
}

#[test]
fn gc_preserves_every_live_roots_function() {
    let m = Manager::new(ManagerConfig::new(4, DomainKind::Binary).primary_pool_size(64)).unwrap();
    let vars: Vec<_> = (0..4).map(|i| m.variable(i).unwrap()).collect();
    let a = m.apply::<And>(&vars[0], &vars[1]).unwrap();
    let b = m.apply::<Or>(&vars[2], &vars[3]).unwrap();
    let f = m.apply::<And>(&a, &b).unwrap();

    let before: Vec<i32> = (0..16)
        .map(|mask| {
            let bits: Vec<u32> = (0..4).map(|k| (mask >> k) & 1).collect();
            m.evaluate(&f, &bits).unwrap()
        })
        .collect();

    m.force_gc().unwrap();

    let after: Vec<i32> = (0..16)
        .map(|mask| {
            let bits: Vec<u32> = (0..4).map(|k| (mask >> k) & 1).collect();
            m.evaluate(&f, &bits).unwrap()
        })
        .collect();
    assert_eq!(before, after);
}
