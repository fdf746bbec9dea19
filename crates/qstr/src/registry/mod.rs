//! Spatial entity registry: raw boundaries of named geometric entities.
//!
//! A raw boundary is a list of outer rings plus a list of hole rings, points
//! as `Vector2<f64>`. Conversion to a shape unions the outer rings and
//! subtracts the union of the holes, so ring orientation and overlap between
//! rings do not matter.

pub mod rand;

use std::collections::HashMap;

use geo::algorithm::orient::{Direction, Orient};
use geo_types::{LineString, MultiPolygon, Polygon};
use nalgebra::Vector2;
use serde::Deserialize;

use crate::geometry::{difference, union_all, GeometryKernel, Shape};
use crate::term::ObjectId;

/// Closed ring; the closing point may be omitted.
pub type Ring = Vec<Vector2<f64>>;

/// Outer boundaries and holes of one entity.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "RawBoundaryDef")]
pub struct RawBoundary {
    pub outer: Vec<Ring>,
    pub holes: Vec<Ring>,
}

#[derive(Deserialize)]
struct RawBoundaryDef {
    outer: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    holes: Vec<Vec<[f64; 2]>>,
}

impl From<RawBoundaryDef> for RawBoundary {
    fn from(def: RawBoundaryDef) -> Self {
        let ring = |r: Vec<[f64; 2]>| r.into_iter().map(|[x, y]| Vector2::new(x, y)).collect();
        Self {
            outer: def.outer.into_iter().map(ring).collect(),
            holes: def.holes.into_iter().map(ring).collect(),
        }
    }
}

impl RawBoundary {
    pub fn polygon(outer: Ring) -> Self {
        Self {
            outer: vec![outer],
            holes: Vec::new(),
        }
    }

    pub fn with_hole(mut self, hole: Ring) -> Self {
        self.holes.push(hole);
        self
    }

    pub fn to_shape<K: GeometryKernel + ?Sized>(&self, kernel: &K) -> Shape {
        let outer: Vec<Shape> = self.outer.iter().filter_map(ring_shape).collect();
        let holes: Vec<Shape> = self.holes.iter().filter_map(ring_shape).collect();
        let exterior = union_all(kernel, &outer.iter().collect::<Vec<_>>());
        let cut = union_all(kernel, &holes.iter().collect::<Vec<_>>());
        difference(kernel, &exterior, &cut)
    }
}

fn ring_shape(ring: &Ring) -> Option<Shape> {
    if ring.len() < 3 {
        return None;
    }
    let ls = LineString::from(ring.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>());
    let poly = Polygon::new(ls, vec![]).orient(Direction::Default);
    Some(Shape::from_multi(MultiPolygon::new(vec![poly])))
}

/// Source of raw entity boundaries.
pub trait EntityRegistry: Send + Sync {
    fn lookup(&self, id: &ObjectId) -> Option<RawBoundary>;
}

/// In-memory registry, deserializable as `{ "id": { "outer": [...], "holes": [...] } }`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct MemoryRegistry {
    entities: HashMap<ObjectId, RawBoundary>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I: Into<ObjectId>>(&mut self, id: I, boundary: RawBoundary) {
        self.entities.insert(id.into(), boundary);
    }

    pub fn with<I: Into<ObjectId>>(mut self, id: I, boundary: RawBoundary) -> Self {
        self.insert(id, boundary);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl EntityRegistry for MemoryRegistry {
    fn lookup(&self, id: &ObjectId) -> Option<RawBoundary> {
        self.entities.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoKernel;

    fn ring(pts: &[(f64, f64)]) -> Ring {
        pts.iter().map(|&(x, y)| Vector2::new(x, y)).collect()
    }

    #[test]
    fn holes_are_subtracted_regardless_of_orientation() {
        // clockwise outer ring
        let b = RawBoundary::polygon(ring(&[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]))
            .with_hole(ring(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)]));
        let s = b.to_shape(&GeoKernel);
        assert!((s.area() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_boundary_is_void() {
        let b = RawBoundary::polygon(ring(&[(0.0, 0.0), (1.0, 1.0)]));
        assert!(b.to_shape(&GeoKernel).is_void());
        assert!(RawBoundary::default().to_shape(&GeoKernel).is_void());
    }

    #[test]
    fn registry_from_json() {
        let reg: MemoryRegistry = serde_json::from_str(
            r#"{
                "p": {"outer": [[[0,0],[1,0],[0,1]]]},
                "q": {"outer": [[[0,0],[4,0],[4,4],[0,4]]], "holes": [[[1,1],[2,1],[2,2],[1,2]]]}
            }"#,
        )
        .unwrap();
        assert_eq!(reg.len(), 2);
        let q = reg.lookup(&"q".into()).unwrap();
        assert_eq!(q.holes.len(), 1);
        assert!(reg.lookup(&"missing".into()).is_none());
    }
}
