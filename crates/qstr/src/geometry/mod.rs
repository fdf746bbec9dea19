//! Geometry capability consumed by the evaluator.
//!
//! Purpose
//! - Wrap polygon clipping and offsetting behind `GeometryKernel` so the
//!   evaluator only sees whole-shape operations.
//! - Carry the `void` (empty region) value and its absorption rules in one
//!   place (`shape`), independent of the kernel in use.
//!
//! Layout
//! - `shape`: `Shape` plus the void-aware n-ary operations.
//! - `kernel`: `GeometryKernel` and the default `GeoKernel` (geo boolean ops + buffer).
//! - `relation`: qualitative relation between two resolved shapes.
//! - `export`: side-effect-only shape export (SVG).

mod export;
mod kernel;
mod relation;
mod shape;

pub use export::{NullSink, ShapeSink, SvgSink};
pub use kernel::{GeoKernel, GeometryKernel};
pub use relation::{classify, Relation};
pub use shape::{buffer, difference, intersect_all, union_all, Shape};
