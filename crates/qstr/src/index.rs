//! Term index: literals ↔ spatial terms, and head ↔ body equivalences.
//!
//! Built once while initializing and read-only afterwards. Every spatial term
//! is recorded under its program literal and under its solver literal, since
//! propagation sees solver literals and models see program literals.
//!
//! A canonical key (`SpatialTerm::key`) seen both in head and body position
//! links the first head literal with the first body literal observed for it;
//! `link_head_body` turns every link into the two clauses of `head ↔ body`.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::search::Literal;
use crate::term::{Location, ObjectId, SpatialTerm};

/// Which literal space a lookup uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiteralSpace {
    Solver,
    Program,
}

#[derive(Debug, Default)]
pub struct TermIndex {
    by_solver: HashMap<Literal, Vec<SpatialTerm>>,
    by_program: HashMap<Literal, Vec<SpatialTerm>>,
    head_keys: HashMap<String, Literal>,
    body_keys: HashMap<String, Literal>,
    head_to_body: BTreeMap<Literal, Literal>,
    body_to_head: BTreeMap<Literal, Literal>,
    solver_literals: Vec<Literal>,
    program_literals: Vec<Literal>,
    seen_solver: HashSet<Literal>,
    seen_program: HashSet<Literal>,
    relation_pairs: BTreeSet<(ObjectId, ObjectId)>,
}

impl TermIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a watched atom's literals (first occurrence keeps the order).
    pub fn track_literals(&mut self, program: Literal, solver: Literal) {
        if self.seen_program.insert(program) {
            self.program_literals.push(program);
        }
        if self.seen_solver.insert(solver) {
            self.solver_literals.push(solver);
        }
    }

    pub fn insert(&mut self, program: Literal, solver: Literal, term: SpatialTerm) {
        self.track_literals(program, solver);
        let keys = match term.location() {
            Location::Head => &mut self.head_keys,
            Location::Body => &mut self.body_keys,
        };
        keys.entry(term.key()).or_insert(solver);
        if let SpatialTerm::Topology { x, y, .. } = &term {
            self.relation_pairs.insert((x.clone(), y.clone()));
        }
        tracing::trace!(program, solver, term = %term, "indexed");
        self.by_program.entry(program).or_default().push(term.clone());
        self.by_solver.entry(solver).or_default().push(term);
    }

    /// Link keys seen in both positions and return the equivalence clauses.
    ///
    /// Each linked pair `(h, b)` yields `[-b, h]` and `[b, -h]`, ordered by body literal.
    /// A term whose head and body occurrence share one literal needs no clause.
    pub fn link_head_body(&mut self) -> Vec<[Literal; 2]> {
        for (key, &h) in &self.head_keys {
            let Some(&b) = self.body_keys.get(key) else {
                continue;
            };
            if h == b {
                continue;
            }
            self.head_to_body.entry(h).or_insert(b);
            self.body_to_head.entry(b).or_insert(h);
        }
        self.body_to_head
            .iter()
            .flat_map(|(&b, &h)| [[-b, h], [b, -h]])
            .collect()
    }

    /// Terms at head position reachable from `true_lits`, split into
    /// (constructive terms, relation terms). Duplicates are dropped.
    pub fn head_terms<I>(
        &self,
        true_lits: I,
        space: LiteralSpace,
    ) -> (Vec<SpatialTerm>, Vec<SpatialTerm>)
    where
        I: IntoIterator<Item = Literal>,
    {
        let map = match space {
            LiteralSpace::Solver => &self.by_solver,
            LiteralSpace::Program => &self.by_program,
        };
        let mut seen = HashSet::new();
        let mut heads = Vec::new();
        let mut relations = Vec::new();
        for lit in true_lits {
            let Some(terms) = map.get(&lit) else {
                continue;
            };
            for t in terms {
                if t.location() != Location::Head || !seen.insert(t.key()) {
                    continue;
                }
                if t.is_relation() {
                    relations.push(t.clone());
                } else {
                    heads.push(t.clone());
                }
            }
        }
        (heads, relations)
    }

    pub fn terms(&self, lit: Literal, space: LiteralSpace) -> &[SpatialTerm] {
        let map = match space {
            LiteralSpace::Solver => &self.by_solver,
            LiteralSpace::Program => &self.by_program,
        };
        map.get(&lit).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Watched solver literals in discovery order.
    #[inline]
    pub fn solver_literals(&self) -> &[Literal] {
        &self.solver_literals
    }

    /// Program literals in discovery order.
    #[inline]
    pub fn program_literals(&self) -> &[Literal] {
        &self.program_literals
    }

    /// Operand pairs of every `topology` term, in any position.
    pub fn relation_pairs(&self) -> impl Iterator<Item = (&ObjectId, &ObjectId)> + '_ {
        self.relation_pairs.iter().map(|(x, y)| (x, y))
    }

    #[inline]
    pub fn head_to_body(&self) -> &BTreeMap<Literal, Literal> {
        &self.head_to_body
    }

    #[inline]
    pub fn body_to_head(&self) -> &BTreeMap<Literal, Literal> {
        &self.body_to_head
    }

    /// Number of indexed terms.
    pub fn len(&self) -> usize {
        self.by_solver.values().map(Vec::len).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_solver.is_empty()
    }
}
