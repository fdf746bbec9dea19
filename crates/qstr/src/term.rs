//! Spatial terms: the closed set of operators the engine understands.
//!
//! A term names its operands and result by object identifier; nothing here is
//! geometric yet. Each term has a canonical key (`union(p,q)=r`) that is
//! independent of operand discovery order. Keys identify the same derivation
//! seen in head and body position.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::search::{TheoryAtom, TheoryValue};

/// Position of a theory atom in its rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    #[default]
    Head,
    Body,
}

impl Location {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "head" => Some(Location::Head),
            "body" => Some(Location::Body),
            _ => None,
        }
    }
}

/// Key into the semantic namespace: a registry entity or a derived result.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl ObjectId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        ObjectId(s.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        ObjectId(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Spatial-algebra term.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SpatialTerm {
    Topology {
        #[serde(default)]
        location: Location,
        x: ObjectId,
        y: ObjectId,
    },
    Union {
        #[serde(default)]
        location: Location,
        operands: Vec<ObjectId>,
        result: ObjectId,
    },
    Intersect {
        #[serde(default)]
        location: Location,
        operands: Vec<ObjectId>,
        result: ObjectId,
    },
    Diff {
        #[serde(default)]
        location: Location,
        left: ObjectId,
        right: ObjectId,
        result: ObjectId,
    },
    Buffer {
        #[serde(default)]
        location: Location,
        operand: ObjectId,
        distance: f64,
        result: ObjectId,
    },
    Draw {
        #[serde(default)]
        location: Location,
        operands: Vec<ObjectId>,
    },
}

impl SpatialTerm {
    pub fn union(location: Location, mut operands: Vec<ObjectId>, result: ObjectId) -> Self {
        operands.sort();
        SpatialTerm::Union {
            location,
            operands,
            result,
        }
    }

    pub fn intersect(location: Location, mut operands: Vec<ObjectId>, result: ObjectId) -> Self {
        operands.sort();
        SpatialTerm::Intersect {
            location,
            operands,
            result,
        }
    }

    pub fn draw(location: Location, mut operands: Vec<ObjectId>) -> Self {
        operands.sort();
        SpatialTerm::Draw { location, operands }
    }

    pub fn operator(&self) -> &'static str {
        match self {
            SpatialTerm::Topology { .. } => "topology",
            SpatialTerm::Union { .. } => "union",
            SpatialTerm::Intersect { .. } => "intersect",
            SpatialTerm::Diff { .. } => "diff",
            SpatialTerm::Buffer { .. } => "buffer",
            SpatialTerm::Draw { .. } => "draw",
        }
    }

    pub fn location(&self) -> Location {
        match self {
            SpatialTerm::Topology { location, .. }
            | SpatialTerm::Union { location, .. }
            | SpatialTerm::Intersect { location, .. }
            | SpatialTerm::Diff { location, .. }
            | SpatialTerm::Buffer { location, .. }
            | SpatialTerm::Draw { location, .. } => *location,
        }
    }

    #[inline]
    pub fn is_relation(&self) -> bool {
        matches!(self, SpatialTerm::Topology { .. })
    }

    /// Identifier produced by the term (none for `topology` and `draw`).
    pub fn result(&self) -> Option<&ObjectId> {
        match self {
            SpatialTerm::Union { result, .. }
            | SpatialTerm::Intersect { result, .. }
            | SpatialTerm::Diff { result, .. }
            | SpatialTerm::Buffer { result, .. } => Some(result),
            SpatialTerm::Topology { .. } | SpatialTerm::Draw { .. } => None,
        }
    }

    /// Object identifiers the term reads.
    pub fn inputs(&self) -> Vec<&ObjectId> {
        match self {
            SpatialTerm::Topology { x, y, .. } => vec![x, y],
            SpatialTerm::Union { operands, .. }
            | SpatialTerm::Intersect { operands, .. }
            | SpatialTerm::Draw { operands, .. } => operands.iter().collect(),
            SpatialTerm::Diff { left, right, .. } => vec![left, right],
            SpatialTerm::Buffer { operand, .. } => vec![operand],
        }
    }

    /// Canonical encoding of operator and operands, e.g. `union(p,q)`.
    ///
    /// Operand lists of commutative operators are sorted; `diff` keeps order.
    pub fn canonical_inputs(&self) -> String {
        match self {
            SpatialTerm::Union { operands, .. }
            | SpatialTerm::Intersect { operands, .. }
            | SpatialTerm::Draw { operands, .. } => {
                let mut ids: Vec<&str> = operands.iter().map(ObjectId::as_str).collect();
                ids.sort_unstable();
                format!("{}({})", self.operator(), ids.join(","))
            }
            SpatialTerm::Topology { x, y, .. } => format!("topology({x},{y})"),
            SpatialTerm::Diff { left, right, .. } => format!("diff({left},{right})"),
            SpatialTerm::Buffer {
                operand, distance, ..
            } => format!("buffer({operand},{distance})"),
        }
    }

    /// Location-independent key: canonical inputs plus `=result` when present.
    pub fn key(&self) -> String {
        match self.result() {
            Some(r) => format!("{}={}", self.canonical_inputs(), r),
            None => self.canonical_inputs(),
        }
    }

    /// Classify a grounded theory atom. Returns `Ok(None)` for operators of other theories.
    pub fn from_theory_atom(atom: &TheoryAtom) -> Result<Option<SpatialTerm>> {
        let malformed = |reason: String| EngineError::MalformedTheoryAtom {
            literal: atom.literal,
            reason,
        };
        let op = atom.operator.as_str();
        if !matches!(
            op,
            "topology" | "union" | "intersect" | "diff" | "buffer" | "draw"
        ) {
            return Ok(None);
        }
        let location = Location::parse(&atom.location)
            .ok_or_else(|| malformed(format!("`{op}` has location tag `{}`", atom.location)))?;
        let result = || -> Result<ObjectId> {
            match &atom.guard {
                Some((_, rhs)) => Ok(object_id(rhs)),
                None => Err(malformed(format!("`{op}` needs a `= result` guard"))),
            }
        };
        let element_ids = || -> Result<Vec<ObjectId>> {
            atom.elements
                .iter()
                .map(|e| {
                    e.terms
                        .first()
                        .map(object_id)
                        .ok_or_else(|| malformed(format!("`{op}` has an empty element")))
                })
                .collect()
        };
        let first_terms: &[TheoryValue] = atom
            .elements
            .first()
            .map(|e| e.terms.as_slice())
            .unwrap_or(&[]);

        let term = match op {
            "topology" => {
                let (x, y) = match first_terms {
                    [x, y, ..] => (object_id(x), object_id(y)),
                    _ => return Err(malformed("`topology` needs two operands".into())),
                };
                SpatialTerm::Topology { location, x, y }
            }
            "union" => SpatialTerm::union(location, element_ids()?, result()?),
            "intersect" => SpatialTerm::intersect(location, element_ids()?, result()?),
            "diff" => {
                let (left, right) = match first_terms {
                    [TheoryValue::Function { args, .. }] if args.len() == 2 => {
                        (object_id(&args[0]), object_id(&args[1]))
                    }
                    [l, r, ..] => (object_id(l), object_id(r)),
                    _ => return Err(malformed("`diff` needs `x - y` or two operands".into())),
                };
                SpatialTerm::Diff {
                    location,
                    left,
                    right,
                    result: result()?,
                }
            }
            "buffer" => {
                let (operand, distance) = match first_terms {
                    [id, TheoryValue::Number(d), ..] => (object_id(id), *d),
                    _ => return Err(malformed("`buffer` needs an operand and a distance".into())),
                };
                SpatialTerm::Buffer {
                    location,
                    operand,
                    distance,
                    result: result()?,
                }
            }
            _ => SpatialTerm::draw(location, element_ids()?),
        };
        Ok(Some(term))
    }
}

impl fmt::Display for SpatialTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc = match self.location() {
            Location::Head => "head",
            Location::Body => "body",
        };
        write!(f, "{}@{}", self.key(), loc)
    }
}

fn object_id(v: &TheoryValue) -> ObjectId {
    ObjectId(v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::TheoryElement;
    use proptest::prelude::*;

    fn sym(s: &str) -> TheoryValue {
        TheoryValue::Symbol(s.to_string())
    }

    fn atom(op: &str, loc: &str, elements: Vec<Vec<TheoryValue>>, guard: Option<&str>) -> TheoryAtom {
        TheoryAtom {
            literal: 7,
            operator: op.to_string(),
            location: loc.to_string(),
            elements: elements
                .into_iter()
                .map(|terms| TheoryElement { terms })
                .collect(),
            guard: guard.map(|g| ("=".to_string(), sym(g))),
        }
    }

    #[test]
    fn classifies_all_operators() {
        let u = atom("union", "head", vec![vec![sym("q")], vec![sym("p")]], Some("r"));
        let t = SpatialTerm::from_theory_atom(&u).unwrap().unwrap();
        assert_eq!(t.key(), "union(p,q)=r");
        assert_eq!(t.location(), Location::Head);

        let d = atom(
            "diff",
            "body",
            vec![vec![TheoryValue::Function {
                name: "-".into(),
                args: vec![sym("b"), sym("a")],
            }]],
            Some("r"),
        );
        let t = SpatialTerm::from_theory_atom(&d).unwrap().unwrap();
        assert_eq!(t.key(), "diff(b,a)=r");
        assert_eq!(t.location(), Location::Body);

        let b = atom(
            "buffer",
            "head",
            vec![vec![sym("p"), TheoryValue::Number(2.0)]],
            Some("r"),
        );
        let t = SpatialTerm::from_theory_atom(&b).unwrap().unwrap();
        assert_eq!(t.key(), "buffer(p,2)=r");

        let topo = atom("topology", "body", vec![vec![sym("x"), sym("y")]], None);
        let t = SpatialTerm::from_theory_atom(&topo).unwrap().unwrap();
        assert!(t.is_relation());
        assert_eq!(t.key(), "topology(x,y)");

        let draw = atom("draw", "head", vec![vec![sym("b")], vec![sym("a")]], None);
        let t = SpatialTerm::from_theory_atom(&draw).unwrap().unwrap();
        assert_eq!(t.key(), "draw(a,b)");
        assert!(t.result().is_none());
    }

    #[test]
    fn foreign_operators_are_skipped() {
        let a = atom("sum", "head", vec![], None);
        assert!(SpatialTerm::from_theory_atom(&a).unwrap().is_none());
    }

    #[test]
    fn malformed_atoms_are_rejected() {
        let no_guard = atom("union", "head", vec![vec![sym("p")]], None);
        assert!(matches!(
            SpatialTerm::from_theory_atom(&no_guard),
            Err(EngineError::MalformedTheoryAtom { literal: 7, .. })
        ));
        let bad_loc = atom("draw", "tail", vec![vec![sym("p")]], None);
        assert!(SpatialTerm::from_theory_atom(&bad_loc).is_err());
        let bad_dist = atom("buffer", "head", vec![vec![sym("p"), sym("far")]], Some("r"));
        assert!(SpatialTerm::from_theory_atom(&bad_dist).is_err());
    }

    #[test]
    fn deserializes_with_default_location() {
        let t: SpatialTerm =
            serde_json::from_str(r#"{"op": "union", "operands": ["q", "p"], "result": "r"}"#)
                .unwrap();
        assert_eq!(t.location(), Location::Head);
        assert_eq!(t.key(), "union(p,q)=r");
    }

    proptest! {
        #[test]
        fn canonical_key_ignores_operand_order(
            ids in prop::collection::vec("[a-z][a-z0-9_]{0,6}", 1..6),
            seed in any::<u64>(),
        ) {
            let ops: Vec<ObjectId> = ids.iter().map(|s| ObjectId::from(s.as_str())).collect();
            let mut shuffled = ops.clone();
            // deterministic rotation + reversal as a permutation
            let k = (seed as usize) % shuffled.len();
            shuffled.rotate_left(k);
            if seed % 2 == 0 {
                shuffled.reverse();
            }
            let a = SpatialTerm::Union {
                location: Location::Head,
                operands: ops,
                result: "r".into(),
            };
            let b = SpatialTerm::Union {
                location: Location::Body,
                operands: shuffled,
                result: "r".into(),
            };
            prop_assert_eq!(a.key(), b.key());
        }
    }
}
