//! Qualitative relation between two resolved shapes.
//!
//! Labels follow a coarse RCC-style split computed from boolean results:
//! overlap area, the two one-sided remainders, and boundary contact.

use std::fmt;

use geo::Intersects;
use serde::Serialize;

use super::kernel::GeometryKernel;
use super::shape::Shape;
use crate::cfg::TopologyCfg;

/// Derived topological relation of an ordered pair `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// No common point.
    Disjoint,
    /// Boundaries meet, interiors do not.
    Touches,
    Equal,
    /// `x` lies inside `y`.
    PartOf,
    /// `y` lies inside `x`.
    Contains,
    Overlaps,
}

impl Relation {
    /// Name used in relation atoms, e.g. `topology(part_of,x,y)`.
    pub fn label(self) -> &'static str {
        match self {
            Relation::Disjoint => "disjoint",
            Relation::Touches => "touches",
            Relation::Equal => "equal",
            Relation::PartOf => "part_of",
            Relation::Contains => "contains",
            Relation::Overlaps => "overlaps",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify `(a, b)`. Two voids are equal; void against a region is disjoint.
pub fn classify<K: GeometryKernel + ?Sized>(
    kernel: &K,
    a: &Shape,
    b: &Shape,
    cfg: TopologyCfg,
) -> Relation {
    let (x, y) = match (a.as_region(), b.as_region()) {
        (None, None) => return Relation::Equal,
        (Some(x), Some(y)) => (x, y),
        _ => return Relation::Disjoint,
    };
    let eps = cfg.area_eps * a.area().max(b.area());
    let overlap = Shape::from_multi(kernel.intersection(x, y)).area();
    if overlap <= eps {
        return if x.intersects(y) {
            Relation::Touches
        } else {
            Relation::Disjoint
        };
    }
    let a_rest = Shape::from_multi(kernel.difference(x, y)).area();
    let b_rest = Shape::from_multi(kernel.difference(y, x)).area();
    match (a_rest <= eps, b_rest <= eps) {
        (true, true) => Relation::Equal,
        (true, false) => Relation::PartOf,
        (false, true) => Relation::Contains,
        (false, false) => Relation::Overlaps,
    }
}
