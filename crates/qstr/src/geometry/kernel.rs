//! Polygon clipping and offsetting backend.

use geo::{BooleanOps, Buffer};
use geo_types::MultiPolygon;

/// Boolean operations and offsetting on non-empty multipolygons.
///
/// Implementations never see `void`; absorption is handled by the callers in
/// `shape`. Results may be empty and are normalized there.
pub trait GeometryKernel: Send + Sync {
    fn union(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64>;
    fn intersection(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64>;
    fn difference(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64>;
    /// Outward offset: exteriors grow by `distance`, holes shrink by it.
    fn buffer(&self, a: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64>;
}

/// Default kernel backed by `geo`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeoKernel;

impl GeometryKernel for GeoKernel {
    fn union(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        BooleanOps::union(a, b)
    }

    fn intersection(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        BooleanOps::intersection(a, b)
    }

    fn difference(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        BooleanOps::difference(a, b)
    }

    fn buffer(&self, a: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
        if distance == 0.0 {
            return a.clone();
        }
        Buffer::buffer(a, distance)
    }
}
