// Copyright (c) 2026 RDD Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version. This program is
// distributed WITHOUT ANY WARRANTY; see the GNU Affero General Public
// License for more details.

//! Reduced ordered decision diagrams: a hash-consed BDD/MDD manager with
//! a generic apply engine, variable reordering, traversal and set
//! enumeration algorithms, and a reliability-analysis layer built on top
//! of the same core.
//!
//! A [`Manager`] owns every diagram it builds. Diagrams are cheap,
//! `Clone`-able handles; the manager reclaims unreachable nodes on
//! `force_gc` (or implicitly, when node allocation runs out and a
//! collection buys back room) rather than on every handle drop.
//!
//! ```
//! use rdd::{DomainKind, Manager, ManagerConfig};
//! use rdd::ops::And;
//!
//! let m = Manager::new(ManagerConfig::new(2, DomainKind::Binary)).unwrap();
//! let x0 = m.variable(0).unwrap();
//! let x1 = m.variable(1).unwrap();
//! let f = m.apply::<And>(&x0, &x1).unwrap();
//! assert_eq!(m.evaluate(&f, &[1, 1]).unwrap(), 1);
//! assert_eq!(m.evaluate(&f, &[1, 0]).unwrap(), 0);
//! ```

mod diagram;
mod error;
mod manager;
mod mem;
mod node;
mod op_cache;
mod reliability;
mod unique_table;

pub mod io;
pub mod ops;

pub use diagram::Diagram;
pub use error::{Error, Result};
pub use manager::{DomainKind, Manager, ManagerConfig, SatisfyCollector};
pub use node::{Level, VarIndex, NONDETERMINED, UNDEFINED};
pub use reliability::{ChangeDirection, DpldKind, ProbabilityModel, ProbabilityResult};
