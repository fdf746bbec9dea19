//! Shapes and the void-aware shape algebra.
//!
//! Absorption rules
//! - union: voids are dropped; nothing left means void.
//! - intersect: any void operand (or no operand) means void; the fold stops
//!   as soon as the accumulator becomes void.
//! - diff: `void - x = void`, `x - void = x`.
//! - buffer: `void` stays `void`.
//!
//! Kernel results with no area are normalized to `void`.

use geo::Area;
use geo_types::MultiPolygon;

use super::kernel::GeometryKernel;

/// Concrete region or the distinguished empty region.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Void,
    Region(MultiPolygon<f64>),
}

impl Shape {
    /// Normalize a kernel result: no polygons or zero area is `Void`.
    pub fn from_multi(mp: MultiPolygon<f64>) -> Self {
        if mp.0.is_empty() || mp.unsigned_area() <= 0.0 {
            Shape::Void
        } else {
            Shape::Region(mp)
        }
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, Shape::Void)
    }

    #[inline]
    pub fn as_region(&self) -> Option<&MultiPolygon<f64>> {
        match self {
            Shape::Region(mp) => Some(mp),
            Shape::Void => None,
        }
    }

    /// Unsigned area (0 for void).
    pub fn area(&self) -> f64 {
        self.as_region().map_or(0.0, |mp| mp.unsigned_area())
    }
}

/// Left fold with geometric union over the non-void operands.
pub fn union_all<K: GeometryKernel + ?Sized>(kernel: &K, shapes: &[&Shape]) -> Shape {
    let mut acc: Option<MultiPolygon<f64>> = None;
    for mp in shapes.iter().filter_map(|s| s.as_region()) {
        acc = Some(match acc {
            None => mp.clone(),
            Some(a) => kernel.union(&a, mp),
        });
    }
    acc.map_or(Shape::Void, Shape::from_multi)
}

/// Left fold with geometric intersection; void as soon as any operand is void.
pub fn intersect_all<K: GeometryKernel + ?Sized>(kernel: &K, shapes: &[&Shape]) -> Shape {
    let mut regions = Vec::with_capacity(shapes.len());
    for s in shapes {
        match s.as_region() {
            Some(mp) => regions.push(mp),
            None => return Shape::Void,
        }
    }
    let Some((first, rest)) = regions.split_first() else {
        return Shape::Void;
    };
    let mut acc = Shape::Region((*first).clone());
    for mp in rest {
        acc = match &acc {
            Shape::Region(a) => Shape::from_multi(kernel.intersection(a, mp)),
            Shape::Void => break,
        };
    }
    acc
}

/// `a - b` with void absorption.
pub fn difference<K: GeometryKernel + ?Sized>(kernel: &K, a: &Shape, b: &Shape) -> Shape {
    match (a, b) {
        (Shape::Void, _) => Shape::Void,
        (Shape::Region(_), Shape::Void) => a.clone(),
        (Shape::Region(x), Shape::Region(y)) => Shape::from_multi(kernel.difference(x, y)),
    }
}

/// Grow the outer boundary and shrink holes by `distance`.
pub fn buffer<K: GeometryKernel + ?Sized>(kernel: &K, a: &Shape, distance: f64) -> Shape {
    match a {
        Shape::Void => Shape::Void,
        Shape::Region(x) => Shape::from_multi(kernel.buffer(x, distance)),
    }
}
