//! Randomised apply/reorder consistency checks: build diagrams from
//! random sequences of binary operations, cross-check every evaluation
//! against a directly-computed oracle truth table, and confirm sifting
//! never changes the function it was run on.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rdd::ops::{And, Eq as OpEq, Implies, Nand, Nor, Or, Xnor, Xor};
use rdd::{DomainKind, Diagram, Manager, ManagerConfig};

const VAR_COUNT: u32 = 5;
const OP_COUNT: u8 = 8;

fn apply_by_code(m: &Manager, code: u8, a: &Diagram, b: &Diagram) -> Diagram {
    match code {
        0 => m.apply::<And>(a, b).unwrap(),
        1 => m.apply::<Or>(a, b).unwrap(),
        2 => m.apply::<Xor>(a, b).unwrap(),
        3 => m.apply::<Xnor>(a, b).unwrap(),
        4 => m.apply::<Nand>(a, b).unwrap(),
        5 => m.apply::<Nor>(a, b).unwrap(),
        6 => m.apply::<Implies>(a, b).unwrap(),
        _ => m.apply::<OpEq>(a, b).unwrap(),
    }
}

fn eval_by_code(code: u8, l: i32, r: i32) -> i32 {
    match code {
        0 => (l != 0 && r != 0) as i32,
        1 => (l != 0 || r != 0) as i32,
        2 => ((l != 0) != (r != 0)) as i32,
        3 => ((l != 0) == (r != 0)) as i32,
        4 => !(l != 0 && r != 0) as i32,
        5 => !(l != 0 || r != 0) as i32,
        6 => (l == 0 || r != 0) as i32,
        _ => (l == r) as i32,
    }
}

/// Builds a random diagram over `VAR_COUNT` variables together with its
/// oracle truth table (indexed by bitmask), by repeatedly combining two
/// previously-built terms with a random operation.
fn random_diagram(m: &Manager, rng: &mut StdRng, steps: usize) -> (Diagram, Vec<i32>) {
    let masks = 1u32 << VAR_COUNT;
    let mut terms: Vec<Diagram> = (0..VAR_COUNT).map(|i| m.variable(i).unwrap()).collect();
    let mut oracles: Vec<Vec<i32>> = (0..VAR_COUNT)
        .map(|i| (0..masks).map(|mask| ((mask >> i) & 1) as i32).collect())
        .collect();

    for _ in 0..steps {
        let a = rng.gen_range(0..terms.len());
        let b = rng.gen_range(0..terms.len());
        let code = rng.gen_range(0..OP_COUNT);
        let combined = apply_by_code(m, code, &terms[a], &terms[b]);
        let oracle: Vec<i32> = (0..masks).map(|mask| eval_by_code(code, oracles[a][mask as usize], oracles[b][mask as usize])).collect();
        terms.push(combined);
        oracles.push(oracle);
    }

    (terms.pop().unwrap(), oracles.pop().unwrap())
}

fn assert_matches_oracle(m: &Manager, d: &Diagram, oracle: &[i32], label: &str) {
    for mask in 0..(1u32 << VAR_COUNT) {
        let bits: Vec<u32> = (0..VAR_COUNT).map(|k| (mask >> k) & 1).collect();
        let got = m.evaluate(d, &bits).unwrap();
        assert_eq!(got, oracle[mask as usize], "{label}: mismatch at mask {mask}");
    }
}

#[test]
fn random_diagrams_match_oracle_before_and_after_reorder() {
    for seed in 0..24u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let m = Manager::new(ManagerConfig::new(VAR_COUNT, DomainKind::Binary)).unwrap();
        let (f, oracle) = random_diagram(&m, &mut rng, 12);

        assert_matches_oracle(&m, &f, &oracle, &format!("seed {seed} before reorder"));
        m.force_reorder().unwrap();
        assert_matches_oracle(&m, &f, &oracle, &format!("seed {seed} after reorder"));
        m.force_gc().unwrap();
        assert_matches_oracle(&m, &f, &oracle, &format!("seed {seed} after gc"));
    }
}

#[test]
fn left_fold_and_tree_fold_agree_on_random_sequences() {
    for seed in 0..24u64 {
        let mut rng = StdRng::seed_from_u64(seed + 1000);
        let m = Manager::new(ManagerConfig::new(VAR_COUNT, DomainKind::Binary)).unwrap();
        let mut order: Vec<u32> = (0..VAR_COUNT).collect();
        for i in (1..order.len()).rev() {
            let j = rng.gen_range(0..=i);
            order.swap(i, j);
        }
        let vs: Vec<Diagram> = order.iter().map(|&i| m.variable(i).unwrap()).collect();

        let left = m.left_fold::<And>(&vs).unwrap();
        let tree = m.tree_fold::<And>(&vs).unwrap();
        assert_eq!(left, tree, "seed {seed}: left_fold and tree_fold diverged");
    }
}
