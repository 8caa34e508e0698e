//! Error taxonomy for the manager: pool exhaustion, bad arguments, and
//! precondition violations that are really programmer errors.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The node pool's primary slab and every permitted overflow slab are
    /// exhausted; no more nodes can be allocated.
    OutOfNodes,
    /// A caller-supplied argument is out of range: a variable index beyond
    /// `var_count`, a value outside a variable's domain, an empty sequence
    /// passed to a fold, or a truth vector whose length does not match the
    /// domain product.
    InvalidArgument(String),
    /// A caller asked for something the manager's current state cannot
    /// provide: a terminal value on an internal node, a probability before
    /// `calculate_probabilities`, or similar. These indicate a bug in the
    /// caller, not a transient failure.
    PrecondViolation(String),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn precond(msg: impl Into<String>) -> Self {
        Self::PrecondViolation(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfNodes => write!(f, "node pool exhausted: no primary or overflow slab capacity left"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::PrecondViolation(msg) => write!(f, "precondition violated: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
