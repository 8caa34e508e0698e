//! A thin textual PLA (`.pla`) loader. Parses the handful of directives
//! the core cares about and exposes `from_pla`, a construction helper
//! that ORs the ANDs of literals for the rows where an output bit is 1 —
//! nothing here touches the manager's internals beyond its public apply
//! contract.

use crate::diagram::Diagram;
use crate::error::{Error, Result};
use crate::manager::Manager;
use crate::node::VarIndex;
use crate::ops::{And, Or};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubeValue {
    Zero,
    One,
    DontCare,
}

/// A parsed PLA payload: directive-derived metadata plus the cube rows.
#[derive(Clone, Debug, Default)]
pub struct PlaFile {
    pub variable_count: usize,
    pub function_count: usize,
    pub line_count: usize,
    pub input_labels: Vec<String>,
    pub output_labels: Vec<String>,
    pub lines: Vec<(Vec<CubeValue>, Vec<bool>)>,
}

fn parse_cube(token: &str) -> Result<Vec<CubeValue>> {
    token
        .chars()
        .map(|c| match c {
            '0' => Ok(CubeValue::Zero),
            '1' => Ok(CubeValue::One),
            '-' | '~' | 'x' | 'X' => Ok(CubeValue::DontCare),
            other => Err(Error::invalid(format!("unrecognised cube symbol '{other}'"))),
        })
        .collect()
}

fn parse_outputs(token: &str) -> Result<Vec<bool>> {
    token
        .chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            '-' | '~' => Ok(false),
            other => Err(Error::invalid(format!("unrecognised output symbol '{other}'"))),
        })
        .collect()
}

/// Parses a PLA payload. Unsupported directives (`.p`, `.type`, `.phase`,
/// comments) are ignored; `.e`/`.end` terminates parsing early.
pub fn parse(input: &str) -> Result<PlaFile> {
    let mut pla = PlaFile::default();
    for raw_line in input.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix(".i ") {
            pla.variable_count = rest.trim().parse().map_err(|_| Error::invalid("bad .i directive"))?;
        } else if let Some(rest) = line.strip_prefix(".o ") {
            pla.function_count = rest.trim().parse().map_err(|_| Error::invalid("bad .o directive"))?;
        } else if let Some(rest) = line.strip_prefix(".ilb ") {
            pla.input_labels = rest.split_whitespace().map(str::to_string).collect();
        } else if let Some(rest) = line.strip_prefix(".ob ") {
            pla.output_labels = rest.split_whitespace().map(str::to_string).collect();
        } else if line.starts_with('.') {
            if line == ".e" || line == ".end" {
                break;
            }
            // .p, .type, .phase, and anything else: not needed by the core.
            continue;
        } else {
            let mut tokens = line.split_whitespace();
            let cube_token = tokens.next().ok_or_else(|| Error::invalid("empty cube row"))?;
            let output_token = tokens
                .next()
                .ok_or_else(|| Error::invalid("PLA row is missing its output field"))?;
            pla.lines.push((parse_cube(cube_token)?, parse_outputs(output_token)?));
            pla.line_count += 1;
        }
    }
    Ok(pla)
}

/// Builds the BDD for one output column: the OR, over every row whose
/// bit at `output_index` is set, of the AND of that row's literals
/// (skipping don't-care positions entirely, which already leaves the
/// variable unconstrained).
pub fn from_pla(m: &Manager, pla: &PlaFile, output_index: usize) -> Result<Diagram> {
    if output_index >= pla.function_count {
        return Err(Error::invalid(format!(
            "output index {output_index} out of range for {} functions",
            pla.function_count
        )));
    }
    let mut terms = Vec::new();
    for (cube, outputs) in &pla.lines {
        if !outputs.get(output_index).copied().unwrap_or(false) {
            continue;
        }
        let mut literals = Vec::new();
        for (i, value) in cube.iter().enumerate() {
            let index = i as VarIndex;
            match value {
                CubeValue::One => literals.push(m.variable(index)?),
                CubeValue::Zero => literals.push(m.variable_not(index)?),
                CubeValue::DontCare => {}
            }
        }
        terms.push(if literals.is_empty() {
            m.constant(1)?
        } else {
            m.tree_fold::<And>(&literals)?
        });
    }
    if terms.is_empty() {
        m.constant(0)
    } else {
        m.tree_fold::<Or>(&terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::{DomainKind, ManagerConfig};

    #[test]
    fn two_variable_and_from_pla() {
        let text = ".i 2\n.o 1\n.ilb x0 x1\n.ob f\n11 1\n00 0\n01 0\n10 0\n.e\n";
        let pla = parse(text).unwrap();
        assert_eq!(pla.variable_count, 2);
        assert_eq!(pla.lines.len(), 4);

        let m = Manager::new(ManagerConfig::new(2, DomainKind::Binary)).unwrap();
        let f = from_pla(&m, &pla, 0).unwrap();
        assert_eq!(m.evaluate(&f, &[1, 1]).unwrap(), 1);
        assert_eq!(m.evaluate(&f, &[1, 0]).unwrap(), 0);
        assert_eq!(m.evaluate(&f, &[0, 0]).unwrap(), 0);
    }

    #[test]
    fn dont_care_leaves_variable_unconstrained() {
        let text = ".i 2\n.o 1\n1- 1\n.e\n";
        let pla = parse(text).unwrap();
        let m = Manager::new(ManagerConfig::new(2, DomainKind::Binary)).unwrap();
        let f = from_pla(&m, &pla, 0).unwrap();
        assert_eq!(m.evaluate(&f, &[1, 0]).unwrap(), 1);
        assert_eq!(m.evaluate(&f, &[1, 1]).unwrap(), 1);
        assert_eq!(m.evaluate(&f, &[0, 0]).unwrap(), 0);
    }
}
