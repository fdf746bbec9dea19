//! Scene files: entities, terms and relation pairs evaluated in one batch.
//!
//! ```json
//! {
//!   "entities": { "p": { "outer": [[[0,0],[1,0],[0,1]]] } },
//!   "terms": [ { "op": "union", "operands": ["p", "q"], "result": "r" } ],
//!   "relations": [["p", "r"]],
//!   "cfg": { "topology": { "area_eps": 1e-9 } }
//! }
//! ```
//!
//! `topology` terms in `terms` add their operand pair to `relations`.

use anyhow::{Context, Result};
use qstr::cfg::EngineCfg;
use qstr::eval::{Qstr, SpatialStore};
use qstr::geometry::{GeoKernel, Relation, ShapeSink};
use qstr::registry::MemoryRegistry;
use qstr::term::{ObjectId, SpatialTerm};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub entities: MemoryRegistry,
    pub terms: Vec<SpatialTerm>,
    pub relations: Vec<(ObjectId, ObjectId)>,
    pub cfg: EngineCfg,
}

#[derive(Debug, Serialize)]
pub struct ObjectReport {
    pub id: String,
    pub geometry: String,
    pub area: f64,
    pub void: bool,
}

#[derive(Debug, Serialize)]
pub struct RelationReport {
    pub x: String,
    pub y: String,
    pub relation: Relation,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub engine_version: &'static str,
    pub passes: usize,
    pub exported: usize,
    pub objects: Vec<ObjectReport>,
    pub relations: Vec<RelationReport>,
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn evaluate(&self, sink: &dyn ShapeSink) -> Result<Report> {
        let mut store = SpatialStore::new();
        let mut engine = Qstr::new(
            &mut store,
            &self.entities,
            &GeoKernel,
            sink,
            self.cfg.topology,
        );
        let stats = engine
            .evaluate(&self.terms)
            .context("evaluating scene terms")?;
        let topology = self.terms.iter().filter_map(|t| match t {
            SpatialTerm::Topology { x, y, .. } => Some((x, y)),
            _ => None,
        });
        let pairs = self.relations.iter().map(|(x, y)| (x, y)).chain(topology);
        engine.relate(pairs).context("classifying relations")?;

        let objects = store
            .assignments()
            .into_iter()
            .map(|(id, shape)| ObjectReport {
                id: id.to_string(),
                geometry: store
                    .geometry_key(id)
                    .map(|k| k.to_string())
                    .unwrap_or_default(),
                area: shape.area(),
                void: shape.is_void(),
            })
            .collect();
        let relations = store
            .relations()
            .iter()
            .map(|((x, y), rel)| RelationReport {
                x: x.to_string(),
                y: y.to_string(),
                relation: *rel,
            })
            .collect();
        Ok(Report {
            engine_version: qstr::VERSION,
            passes: stats.passes,
            exported: stats.exported,
            objects,
            relations,
        })
    }
}
