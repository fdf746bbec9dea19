//! Process-wide memo of materialized shapes and derived relations.
//!
//! Two levels of indirection keep derivations idempotent:
//! - `assigns`: object id → geometry key (what an identifier denotes),
//! - `geoms`: geometry key → shape (computed at most once per key).
//!
//! A geometry key is the quoted entity id for registry entities (`"p"`) and a
//! canonical string over operand geometry keys for derived shapes, e.g.
//! `union("p","q")`. Quoting keeps an entity named like a derivation apart
//! from that derivation. Two results derived from the same operand set share
//! one geometry. Entries are never removed or overwritten.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::geometry::{Relation, Shape};
use crate::term::ObjectId;

/// Canonical key of a materialized geometry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeomKey(pub String);

impl GeomKey {
    /// Key of a registry entity: the id as an escaped string literal.
    pub fn entity(id: &ObjectId) -> Self {
        GeomKey(format!("{:?}", id.as_str()))
    }
}

impl fmt::Display for GeomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Assignment map, geometry memo and relation map.
#[derive(Debug, Default)]
pub struct SpatialStore {
    pub(super) assigns: HashMap<ObjectId, GeomKey>,
    pub(super) geoms: HashMap<GeomKey, Shape>,
    pub(super) relations: BTreeMap<(ObjectId, ObjectId), Relation>,
    pub(super) exported: HashSet<String>,
}

impl SpatialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shape assigned to `id`, if resolved.
    pub fn shape(&self, id: &ObjectId) -> Option<&Shape> {
        self.assigns.get(id).and_then(|k| self.geoms.get(k))
    }

    pub fn geometry_key(&self, id: &ObjectId) -> Option<&GeomKey> {
        self.assigns.get(id)
    }

    #[inline]
    pub fn is_resolved(&self, id: &ObjectId) -> bool {
        self.assigns.contains_key(id)
    }

    /// All resolved identifiers with their shapes, sorted by identifier.
    pub fn assignments(&self) -> Vec<(&ObjectId, &Shape)> {
        let mut out: Vec<_> = self
            .assigns
            .iter()
            .filter_map(|(id, k)| self.geoms.get(k).map(|s| (id, s)))
            .collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    pub fn relation(&self, x: &ObjectId, y: &ObjectId) -> Option<Relation> {
        self.relations.get(&(x.clone(), y.clone())).copied()
    }

    #[inline]
    pub fn relations(&self) -> &BTreeMap<(ObjectId, ObjectId), Relation> {
        &self.relations
    }

    /// Number of resolved identifiers.
    #[inline]
    pub fn len(&self) -> usize {
        self.assigns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.assigns.is_empty()
    }

    /// Number of distinct materialized geometries.
    #[inline]
    pub fn num_geometries(&self) -> usize {
        self.geoms.len()
    }
}
