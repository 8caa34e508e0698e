//! Minimal Cut/Path Vectors: pi-conjunction of every component's extended
//! DPLD, enumerated with `satisfy_all`.

use crate::diagram::Diagram;
use crate::error::{Error, Result};
use crate::manager::{Manager, SatisfyCollector};
use crate::ops::PiConj;

use super::dpld::{dpld, to_dpld_e, ChangeDirection, DpldKind};

fn minimal_vectors<V: SatisfyCollector>(m: &Manager, d: &Diagram, dir: ChangeDirection) -> Result<Vec<V>> {
    let var_count = m.var_count();
    let inner_rc = m.inner_handle();
    let mut extended = Vec::new();
    for i in 0..var_count {
        let di = m.domain(i);
        for s in 0..di {
            let to = match dir {
                ChangeDirection::Increase => s + 1,
                ChangeDirection::Decrease => {
                    if s == 0 {
                        continue;
                    }
                    s - 1
                }
            };
            if to >= di {
                continue;
            }
            let mut inner = inner_rc.borrow_mut();
            let mark = inner.protected_mark();
            let outcome = dpld(&mut inner, i, s, to, &DpldKind::Type2 { dir }, d.node())
                .and_then(|raw| to_dpld_e(&mut inner, i, s, raw));
            if outcome.is_err() {
                inner.release_protected(mark);
            }
            let node = outcome?;
            drop(inner);
            extended.push(Diagram::new(inner_rc.clone(), node));
            inner_rc.borrow_mut().release_protected(mark);
        }
    }
    if extended.is_empty() {
        return Err(Error::invalid("no component transitions available to build minimal vectors from"));
    }
    let conj = m.tree_fold::<PiConj>(&extended)?;
    m.satisfy_all::<V>(1, &conj)
}

pub(crate) fn mcvs<V: SatisfyCollector>(m: &Manager, d: &Diagram) -> Result<Vec<V>> {
    minimal_vectors(m, d, ChangeDirection::Increase)
}

pub(crate) fn mpvs<V: SatisfyCollector>(m: &Manager, d: &Diagram) -> Result<Vec<V>> {
    minimal_vectors(m, d, ChangeDirection::Decrease)
}
