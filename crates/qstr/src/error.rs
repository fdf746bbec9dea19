//! Error taxonomy for the engine.
//!
//! Every variant here is fatal for the call that raised it. A failed
//! consistency check is not an error: it is reported to the search as a
//! nogood (see `propagator`).

use thiserror::Error;

use crate::search::Literal;
use crate::term::ObjectId;

/// Fatal engine errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A term references an operand with no registry entry and no prior derivation.
    #[error("operand `{id}` has no registry entity and no derived shape")]
    UnresolvedOperand { id: ObjectId },

    /// The fixpoint made no progress over a full pass.
    #[error("cyclic dependency between spatial terms producing {pending:?}")]
    CyclicDependency { pending: Vec<ObjectId> },

    /// The nested check search stopped before producing a verdict.
    #[error("nested check search on thread {thread} was interrupted")]
    NestedSearchInterrupted { thread: usize },

    /// A program part directive other than `base`, `guess` or `check`.
    #[error("unexpected program structure: {0}")]
    UnexpectedProgramStructure(String),

    /// A spatial theory atom whose shape does not fit its operator.
    #[error("malformed theory atom (literal {literal}): {reason}")]
    MalformedTheoryAtom { literal: Literal, reason: String },

    /// A search callback arrived before `init`.
    #[error("propagator used before initialization")]
    NotInitialized,

    /// Thread id outside the range announced at init.
    #[error("thread {thread} is outside the {threads} threads announced at init")]
    UnknownThread { thread: usize, threads: usize },

    /// Writing an exported shape set failed.
    #[error("exporting `{name}` failed: {source}")]
    Export {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
