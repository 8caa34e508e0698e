//! External collaborators: thin, opt-in adapters over the manager's
//! public contract. Neither submodule reaches into manager internals
//! beyond what `Manager`/`ManagerInner` already expose to the rest of
//! the crate — a PLA/expression loader is not part of the core line.

pub mod expr;
pub mod pla;
