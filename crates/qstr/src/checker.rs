//! Per-thread consistency checker over a nested check search.
//!
//! Each registered pair ties an undecided outer (decision) literal to the
//! semantic literal of the same atom in the nested search. A check call turns
//! the current outer assignment into assumptions:
//! - semantic literal forced by the caller → assume it,
//! - decision literal assigned → mirror its value,
//! - unassigned → leave the semantic literal open,
//!
//! and asks the nested search for satisfiability under exactly that set.
//! Interruption is an error, never a verdict.

use std::collections::{BTreeMap, HashMap};

use crate::error::{EngineError, Result};
use crate::geometry::Relation;
use crate::search::{Assignment, CheckSolver, Literal, SolveOutcome, Symbol};
use crate::term::ObjectId;

/// `(label, x, y)` of a relation atom `name(label, x, y)`, whatever its predicate name.
type RelationKey = (String, ObjectId, ObjectId);

fn relation_key(rel: Relation, x: &ObjectId, y: &ObjectId) -> RelationKey {
    (rel.label().to_string(), x.clone(), y.clone())
}

pub struct Checker<S: CheckSolver> {
    thread: usize,
    solver: S,
    /// (decision literal, semantic literal)
    pairs: Vec<(Literal, Literal)>,
    relation_atoms: HashMap<RelationKey, Literal>,
}

impl<S: CheckSolver> Checker<S> {
    pub fn new(thread: usize, solver: S) -> Self {
        Self {
            thread,
            solver,
            pairs: Vec::new(),
            relation_atoms: HashMap::new(),
        }
    }

    #[inline]
    pub fn thread(&self) -> usize {
        self.thread
    }

    /// Nested solver for adding atoms and rules while initializing.
    #[inline]
    pub fn backend(&mut self) -> &mut S {
        &mut self.solver
    }

    pub fn add(&mut self, decision: Literal, semantic: Literal) {
        self.pairs.push((decision, semantic));
    }

    #[inline]
    pub fn pairs(&self) -> &[(Literal, Literal)] {
        &self.pairs
    }

    /// Remember the semantic literal of a relation atom `name(label, x, y)`; the first
    /// registration of a `(label, x, y)` wins. Returns false for any other arity.
    pub fn register_relation(&mut self, symbol: &Symbol, semantic: Literal) -> bool {
        let [label, x, y] = symbol.args.as_slice() else {
            return false;
        };
        self.relation_atoms
            .entry((label.clone(), ObjectId::from(x.as_str()), ObjectId::from(y.as_str())))
            .or_insert(semantic);
        true
    }

    pub fn relation_literal(&self, rel: Relation, x: &ObjectId, y: &ObjectId) -> Option<Literal> {
        self.relation_atoms.get(&relation_key(rel, x, y)).copied()
    }

    pub fn ground(&mut self, program: &[S::Statement]) {
        tracing::debug!(
            thread = self.thread,
            statements = program.len(),
            "grounding check program"
        );
        self.solver.ground(program);
    }

    /// Assumption set for the current outer assignment.
    pub fn assumptions<A: Assignment + ?Sized>(
        &self,
        assignment: &A,
        forced: &[Literal],
    ) -> Vec<Literal> {
        let mut out = Vec::with_capacity(self.pairs.len());
        for &(decision, semantic) in &self.pairs {
            let truth = assignment.value(decision);
            if forced.contains(&semantic) {
                tracing::trace!(decision, semantic, ?truth, "assuming");
                out.push(semantic);
            } else {
                match truth {
                    Some(true) => {
                        let level = assignment.level(decision);
                        tracing::trace!(decision, semantic, level, "assigning");
                        out.push(semantic);
                    }
                    Some(false) => out.push(-semantic),
                    None => {}
                }
            }
        }
        out
    }

    /// Solve the check program under the mirrored assignment plus `forced`.
    pub fn check<A: Assignment + ?Sized>(
        &mut self,
        assignment: &A,
        forced: &[Literal],
    ) -> Result<bool> {
        let assumptions = self.assumptions(assignment, forced);
        match self.solver.solve(&assumptions) {
            SolveOutcome::Satisfiable => Ok(true),
            SolveOutcome::Unsatisfiable => Ok(false),
            SolveOutcome::Interrupted => Err(EngineError::NestedSearchInterrupted {
                thread: self.thread,
            }),
        }
    }

    /// Semantic literals of the relation atoms matching derived relations.
    ///
    /// Derived relations without a registered atom cannot be assumed and are skipped.
    pub fn relation_assumptions(
        &self,
        relations: &BTreeMap<(ObjectId, ObjectId), Relation>,
    ) -> Vec<Literal> {
        let mut out = Vec::new();
        for ((x, y), rel) in relations {
            match self.relation_literal(*rel, x, y) {
                Some(lit) => {
                    tracing::trace!(thread = self.thread, %rel, %x, %y, lit, "relation assumption");
                    out.push(lit);
                }
                None => {
                    tracing::warn!(
                        thread = self.thread,
                        %rel,
                        %x,
                        %y,
                        "derived relation has no registered atom"
                    );
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Outer(HashMap<Literal, bool>);

    impl Assignment for Outer {
        fn value(&self, lit: Literal) -> Option<bool> {
            self.0.get(&lit.abs()).map(|&v| if lit > 0 { v } else { !v })
        }
        fn level(&self, _lit: Literal) -> u32 {
            0
        }
        fn decision_level(&self) -> u32 {
            0
        }
        fn decision(&self, _level: u32) -> Literal {
            0
        }
        fn is_total(&self) -> bool {
            false
        }
    }

    /// Nested solver that answers from a fixed outcome and records assumptions.
    #[derive(Default)]
    struct Scripted {
        next: i32,
        outcome: Option<SolveOutcome>,
        seen: Vec<Vec<Literal>>,
    }

    impl CheckSolver for Scripted {
        type Statement = ();

        fn add_atom(&mut self, _symbol: &Symbol) -> Literal {
            self.next += 1;
            self.next
        }
        fn add_fact(&mut self, _lit: Literal) {}
        fn add_choice(&mut self, _lit: Literal) {}
        fn ground(&mut self, _program: &[()]) {}
        fn solve(&mut self, assumptions: &[Literal]) -> SolveOutcome {
            self.seen.push(assumptions.to_vec());
            self.outcome.unwrap_or(SolveOutcome::Satisfiable)
        }
    }

    #[test]
    fn assumptions_mirror_outer_values_and_forced() {
        let mut c = Checker::new(0, Scripted::default());
        c.add(5, 1);
        c.add(6, 2);
        c.add(7, 3);
        c.add(8, 4);
        let outer = Outer(HashMap::from([(5, true), (6, false), (8, false)]));
        // 7 unassigned, 8 false but forced
        assert_eq!(c.assumptions(&outer, &[4]), vec![1, -2, 4]);
        assert!(c.check(&outer, &[]).unwrap());
        assert_eq!(c.backend().seen, vec![vec![1, -2, -4]]);
    }

    #[test]
    fn interrupted_search_is_an_error() {
        let solver = Scripted {
            outcome: Some(SolveOutcome::Interrupted),
            ..Scripted::default()
        };
        let mut c = Checker::new(3, solver);
        let err = c.check(&Outer(HashMap::new()), &[]).unwrap_err();
        assert!(matches!(err, EngineError::NestedSearchInterrupted { thread: 3 }));

        c.backend().outcome = Some(SolveOutcome::Unsatisfiable);
        assert!(!c.check(&Outer(HashMap::new()), &[]).unwrap());
    }

    #[test]
    fn only_registered_relations_become_assumptions() {
        let mut c = Checker::new(0, Scripted::default());
        let rel = |label: &str, x: &str, y: &str| {
            Symbol::new("topology", vec![label.into(), x.into(), y.into()])
        };
        assert!(c.register_relation(&rel("overlaps", "x", "y"), 11));
        assert!(c.register_relation(&rel("overlaps", "x", "y"), 12));
        assert!(c.register_relation(&rel("part_of", "x", "y"), 13));
        assert!(!c.register_relation(&Symbol::new("topology", vec!["x".into()]), 14));
        let (x, y, z) = (ObjectId::from("x"), ObjectId::from("y"), ObjectId::from("z"));
        let mut rels = BTreeMap::new();
        rels.insert((x.clone(), y.clone()), Relation::Overlaps);
        rels.insert((x.clone(), z.clone()), Relation::Disjoint);
        assert_eq!(c.relation_assumptions(&rels), vec![11]);
        assert_eq!(c.relation_literal(Relation::PartOf, &x, &y), Some(13));
    }

    #[test]
    fn relation_atoms_match_by_arguments_not_predicate() {
        let mut c = Checker::new(0, Scripted::default());
        let atom = Symbol::new("rel", vec!["overlaps".into(), "x".into(), "y".into()]);
        assert!(c.register_relation(&atom, 7));
        let mut rels = BTreeMap::new();
        rels.insert((ObjectId::from("x"), ObjectId::from("y")), Relation::Overlaps);
        assert_eq!(c.relation_assumptions(&rels), vec![7]);
    }
}
