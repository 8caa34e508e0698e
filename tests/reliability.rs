//! The five-variable binary-state-system reference scenario: structure
//! function f = (x0∧x1)∨(x2∧x3)∨x4, component reliabilities
//! P = (.9,.8,.7,.9,.9).

use rdd::ops::{And, Or};
use rdd::{ChangeDirection, DomainKind, DpldKind, Manager, ManagerConfig, ProbabilityModel};

fn build(m: &Manager) -> rdd::Diagram {
    let vars: Vec<_> = (0..5).map(|i| m.variable(i).unwrap()).collect();
    let a = m.apply::<And>(&vars[0], &vars[1]).unwrap();
    let b = m.apply::<And>(&vars[2], &vars[3]).unwrap();
    let ab = m.apply::<Or>(&a, &b).unwrap();
    m.apply::<Or>(&ab, &vars[4]).unwrap()
}

const EPS: f64 = 1e-6;

#[test]
fn availability_and_unavailability() {
    let m = Manager::new(ManagerConfig::new(5, DomainKind::Binary)).unwrap();
    let f = build(&m);
    let model = ProbabilityModel::Binary(vec![0.9, 0.8, 0.7, 0.9, 0.9]);

    let a = m.availability(&model, &f, 1).unwrap();
    let u = m.unavailability(&model, &f, 1).unwrap();
    assert!((a - 0.98964).abs() < 1e-5, "availability was {a}");
    assert!((u - 0.01036).abs() < 1e-5, "unavailability was {u}");
    assert!((a + u - 1.0).abs() < EPS);
}

#[test]
fn structural_importance_matches_reference() {
    let m = Manager::new(ManagerConfig::new(5, DomainKind::Binary)).unwrap();
    let f = build(&m);
    let expected = [0.1875, 0.1875, 0.1875, 0.1875, 0.5625];
    for (i, &want) in expected.iter().enumerate() {
        let derivative = m.dpld(i as u32, 0, 1, DpldKind::Type2 { dir: ChangeDirection::Increase }, &f).unwrap();
        let got = m.structural_importance(i as u32, &derivative).unwrap();
        assert!((got - want).abs() < EPS, "variable {i}: got {got}, want {want}");
    }
}

#[test]
fn birnbaum_importance_matches_reference() {
    let m = Manager::new(ManagerConfig::new(5, DomainKind::Binary)).unwrap();
    let f = build(&m);
    let model = ProbabilityModel::Binary(vec![0.9, 0.8, 0.7, 0.9, 0.9]);
    let expected = [0.0296, 0.0333, 0.0252, 0.0196, 0.1036];
    for (i, &want) in expected.iter().enumerate() {
        let derivative = m.dpld(i as u32, 0, 1, DpldKind::Type2 { dir: ChangeDirection::Increase }, &f).unwrap();
        let got = m.birnbaum_importance(&model, &derivative).unwrap();
        assert!((got - want).abs() < 1e-4, "variable {i}: got {got}, want {want}");
    }
}

#[test]
fn minimal_cut_vectors_match_reference() {
    let m = Manager::new(ManagerConfig::new(5, DomainKind::Binary)).unwrap();
    let f = build(&m);
    let mut mcvs: Vec<Vec<u32>> = m.mcvs(&f).unwrap();
    mcvs.sort();

    let mut expected = vec![
        vec![0, 1, 0, 1, 0],
        vec![0, 0, 1, 1, 0],
        vec![0, 1, 0, 0, 1],
        vec![0, 0, 1, 0, 1],
    ];
    expected.sort();
    assert_eq!(mcvs, expected);
}

#[test]
fn dpld_soundness_on_a_single_variable() {
    let m = Manager::new(ManagerConfig::new(5, DomainKind::Binary)).unwrap();
    let f = build(&m);
    let derivative = m.dpld(0, 0, 1, DpldKind::Type2 { dir: ChangeDirection::Increase }, &f).unwrap();
    for x1 in 0..2u32 {
        for x2 in 0..2u32 {
            for x3 in 0..2u32 {
                for x4 in 0..2u32 {
                    let low = m.evaluate(&f, &[0, x1, x2, x3, x4]).unwrap();
                    let high = m.evaluate(&f, &[1, x1, x2, x3, x4]).unwrap();
                    let changes = (low != high) as i32;
                    let got = m.evaluate(&derivative, &[0, x1, x2, x3, x4]).unwrap();
                    assert_eq!(got, changes);
                }
            }
        }
    }
}
