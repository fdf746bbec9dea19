//! Incremental spatial consistency for guess/check search.
//!
//! A Boolean search decides spatial propositions ("r is the union of p and
//! q", "x overlaps y"); this crate materializes the shapes those decisions
//! imply, derives qualitative relations between them, and checks the result
//! against a separately grounded check program. Inconsistency goes back to
//! the search as a nogood over the decision trail.
//!
//! Layout
//! - `term`, `index`: spatial terms and the literal ↔ term index.
//! - `eval`: fixpoint evaluation into the shape/relation store.
//! - `checker`, `propagator`: nested check search and the callback driver.
//! - `geometry`, `registry`: shapes, the clipping kernel, raw entities.
//! - `search`, `program`: the boundary to the external search.
//!
//! API Policy
//! - This crate is project-internal. There is no stable public API.

pub mod cfg;
pub mod checker;
pub mod error;
pub mod eval;
pub mod geometry;
pub mod index;
pub mod program;
pub mod propagator;
pub mod registry;
pub mod search;
pub mod term;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{EngineError, Result};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::cfg::{EngineCfg, PropagateCheck, TopologyCfg};
    pub use crate::eval::{EvalStats, Qstr, SpatialStore};
    pub use crate::geometry::{
        GeoKernel, GeometryKernel, NullSink, Relation, Shape, ShapeSink, SvgSink,
    };
    pub use crate::propagator::{CheckVerdict, Phase, SpatialPropagator};
    pub use crate::registry::{EntityRegistry, MemoryRegistry, RawBoundary};
    pub use crate::search::{CheckSolver, CheckSolverFactory, Literal};
    pub use crate::term::{Location, ObjectId, SpatialTerm};
    pub use crate::{EngineError, Result};
}
