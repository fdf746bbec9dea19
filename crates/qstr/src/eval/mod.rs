//! QSTR: fixpoint evaluation of true head terms into shapes and relations.
//!
//! Purpose
//! - Turn the spatial terms made true by the search into concrete shapes in
//!   the `SpatialStore`, and record relations between resolved identifiers.
//!
//! Scheduling
//! - A batch of terms is processed in passes. A term is blocked while one of
//!   its inputs is the result of another term still pending in the batch;
//!   every pass resolves all unblocked terms. A pass that resolves nothing
//!   means the remaining terms depend on each other (`CyclicDependency`).
//! - Terms whose result is already assigned are skipped, so repeated calls
//!   with overlapping batches are cheap and never change a stored shape.
//!
//! Code cross-refs: `geometry::{union_all, intersect_all, difference, buffer, classify}`,
//! `registry::EntityRegistry`, `store::SpatialStore`.

mod store;

use std::collections::HashSet;

use crate::cfg::TopologyCfg;
use crate::error::{EngineError, Result};
use crate::geometry::{
    buffer, classify, difference, intersect_all, union_all, GeometryKernel, Shape, ShapeSink,
};
use crate::registry::EntityRegistry;
use crate::term::{ObjectId, SpatialTerm};

pub use store::{GeomKey, SpatialStore};

static VOID: Shape = Shape::Void;

/// Counters of one `evaluate` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvalStats {
    pub passes: usize,
    /// Results assigned by this call.
    pub resolved: usize,
    /// Terms skipped because their result was already assigned.
    pub memo_hits: usize,
    /// Geometries reused from another result with the same derivation.
    pub shared: usize,
    pub exported: usize,
}

/// Evaluator over a borrowed store.
pub struct Qstr<'a> {
    store: &'a mut SpatialStore,
    registry: &'a dyn EntityRegistry,
    kernel: &'a dyn GeometryKernel,
    sink: &'a dyn ShapeSink,
    topology: TopologyCfg,
}

impl<'a> Qstr<'a> {
    pub fn new(
        store: &'a mut SpatialStore,
        registry: &'a dyn EntityRegistry,
        kernel: &'a dyn GeometryKernel,
        sink: &'a dyn ShapeSink,
        topology: TopologyCfg,
    ) -> Self {
        Self {
            store,
            registry,
            kernel,
            sink,
            topology,
        }
    }

    /// Resolve every non-relation term of `heads`.
    pub fn evaluate(&mut self, heads: &[SpatialTerm]) -> Result<EvalStats> {
        let mut stats = EvalStats::default();
        let mut pending: Vec<&SpatialTerm> = heads.iter().filter(|t| !t.is_relation()).collect();
        while !pending.is_empty() {
            stats.passes += 1;
            let produced: HashSet<&ObjectId> =
                pending.iter().copied().filter_map(|t| t.result()).collect();
            let (ready, blocked): (Vec<&SpatialTerm>, Vec<&SpatialTerm>) = pending
                .into_iter()
                .partition(|t| !t.inputs().iter().any(|id| produced.contains(id)));
            if ready.is_empty() {
                let mut ids: Vec<ObjectId> =
                    blocked.iter().filter_map(|t| t.result().cloned()).collect();
                ids.sort();
                ids.dedup();
                return Err(EngineError::CyclicDependency { pending: ids });
            }
            for term in ready {
                self.apply(term, &mut stats)?;
            }
            pending = blocked;
        }
        Ok(stats)
    }

    /// Classify every pair whose two operands are resolvable. Returns the number of new entries.
    pub fn relate<'t, I>(&mut self, pairs: I) -> Result<usize>
    where
        I: IntoIterator<Item = (&'t ObjectId, &'t ObjectId)>,
    {
        let mut added = 0;
        for (x, y) in pairs {
            let key = (x.clone(), y.clone());
            if self.store.relations.contains_key(&key)
                || !self.is_resolvable(x)
                || !self.is_resolvable(y)
            {
                continue;
            }
            let kx = self.resolve(x)?;
            let ky = self.resolve(y)?;
            let rel = classify(
                self.kernel,
                self.geometry(&kx),
                self.geometry(&ky),
                self.topology,
            );
            tracing::trace!(%x, %y, relation = %rel, "relation");
            self.store.relations.insert(key, rel);
            added += 1;
        }
        Ok(added)
    }

    fn apply(&mut self, term: &SpatialTerm, stats: &mut EvalStats) -> Result<()> {
        if let SpatialTerm::Draw { operands, .. } = term {
            if self.draw(operands)? {
                stats.exported += 1;
            }
            return Ok(());
        }
        let Some(result) = term.result() else {
            return Ok(());
        };
        if self.store.assigns.contains_key(result) {
            stats.memo_hits += 1;
            return Ok(());
        }
        let (key, operands) = self.derivation(term)?;
        if self.store.geoms.contains_key(&key) {
            stats.shared += 1;
        } else {
            let shape = self.compute(term, &operands);
            tracing::trace!(%result, key = %key, area = shape.area(), "materialized");
            self.store.geoms.insert(key.clone(), shape);
        }
        self.store.assigns.insert(result.clone(), key);
        stats.resolved += 1;
        Ok(())
    }

    /// Geometry key of the term's result and the resolved operand keys.
    fn derivation(&mut self, term: &SpatialTerm) -> Result<(GeomKey, Vec<GeomKey>)> {
        let mut operands = term
            .inputs()
            .into_iter()
            .map(|id| self.resolve(id))
            .collect::<Result<Vec<_>>>()?;
        let key = match term {
            SpatialTerm::Union { .. } | SpatialTerm::Intersect { .. } => {
                operands.sort();
                format!("{}({})", term.operator(), join_keys(&operands))
            }
            SpatialTerm::Buffer { distance, .. } => {
                format!("buffer({},{})", join_keys(&operands), distance)
            }
            _ => format!("{}({})", term.operator(), join_keys(&operands)),
        };
        Ok((GeomKey(key), operands))
    }

    fn compute(&self, term: &SpatialTerm, operands: &[GeomKey]) -> Shape {
        let shapes: Vec<&Shape> = operands.iter().map(|k| self.geometry(k)).collect();
        match (term, shapes.as_slice()) {
            (SpatialTerm::Union { .. }, _) => union_all(self.kernel, &shapes),
            (SpatialTerm::Intersect { .. }, _) => intersect_all(self.kernel, &shapes),
            (SpatialTerm::Diff { .. }, [a, b]) => difference(self.kernel, a, b),
            (SpatialTerm::Buffer { distance, .. }, [a]) => buffer(self.kernel, a, *distance),
            _ => Shape::Void,
        }
    }

    /// Export the non-void operands once per operand set. Returns true if exported now.
    fn draw(&mut self, operands: &[ObjectId]) -> Result<bool> {
        let keys = operands
            .iter()
            .map(|id| self.resolve(id))
            .collect::<Result<Vec<_>>>()?;
        let name = draw_name(operands);
        if self.store.exported.contains(&name) {
            return Ok(false);
        }
        let regions: Vec<_> = keys
            .iter()
            .filter_map(|k| self.geometry(k).as_region())
            .collect();
        if regions.is_empty() {
            return Ok(false);
        }
        self.sink.export(&name, &regions)?;
        self.store.exported.insert(name);
        Ok(true)
    }

    fn is_resolvable(&self, id: &ObjectId) -> bool {
        self.store.assigns.contains_key(id) || self.registry.lookup(id).is_some()
    }

    /// Geometry key of `id`, materializing registry entities on first use.
    fn resolve(&mut self, id: &ObjectId) -> Result<GeomKey> {
        if let Some(k) = self.store.assigns.get(id) {
            return Ok(k.clone());
        }
        let raw = self
            .registry
            .lookup(id)
            .ok_or_else(|| EngineError::UnresolvedOperand { id: id.clone() })?;
        let key = GeomKey::entity(id);
        let kernel = self.kernel;
        self.store
            .geoms
            .entry(key.clone())
            .or_insert_with(|| raw.to_shape(kernel));
        self.store.assigns.insert(id.clone(), key.clone());
        Ok(key)
    }

    fn geometry(&self, key: &GeomKey) -> &Shape {
        // every key handed out by `resolve` or `apply` has a geometry entry
        self.store.geoms.get(key).unwrap_or(&VOID)
    }
}

/// Sorted ids joined by `+`; `%` and `+` inside an id are escaped.
fn draw_name(operands: &[ObjectId]) -> String {
    let mut ids: Vec<String> = operands
        .iter()
        .map(|id| id.as_str().replace('%', "%25").replace('+', "%2B"))
        .collect();
    ids.sort_unstable();
    ids.join("+")
}

fn join_keys(keys: &[GeomKey]) -> String {
    keys.iter()
        .map(|k| k.0.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
