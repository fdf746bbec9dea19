//! Propagation controller: the search-facing side of the engine.
//!
//! Lifecycle per solve
//! - `init` (once): watch every plain atom, pair undecided atoms with semantic
//!   literals in each thread's nested check search, index every spatial theory
//!   atom, add the head ↔ body equivalence clauses, ground the check program.
//! - `propagate`: materialize shapes for the true head terms. In `Partial`
//!   mode the full check runs as well.
//! - `check` (total assignment): nested check without forced assumptions,
//!   then re-evaluation, relation derivation and a second nested check with
//!   the matching relation literals forced. Either failure reports the whole
//!   decision trail as a nogood.
//! - `undo`: phase bookkeeping only. Shapes and relations are a process-wide
//!   memo keyed canonically, so nothing is rolled back.
//! - `on_model`: materialize shapes over the model's program literals.
//!
//! Concurrency
//! - The index is read-only after `init`. Each search thread owns one slot
//!   (checker + phase) behind its own lock; the shared store sits behind a
//!   single lock and is always taken after the slot lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cfg::{EngineCfg, PropagateCheck};
use crate::checker::Checker;
use crate::error::{EngineError, Result};
use crate::eval::{Qstr, SpatialStore};
use crate::geometry::{GeoKernel, GeometryKernel, NullSink, Relation, Shape, ShapeSink};
use crate::index::{LiteralSpace, TermIndex};
use crate::registry::EntityRegistry;
use crate::search::{
    Assignment, CheckSolver, CheckSolverFactory, Literal, Model, PropagateControl, PropagateInit,
};
use crate::term::{ObjectId, SpatialTerm};

/// Per-thread controller state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Watching,
    Propagating,
    TotalCheck,
    Satisfiable,
    ConflictReported,
}

/// Outcome of a consistency check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckVerdict {
    Consistent,
    /// Nogood submitted to the search: the decision of every level, level 1 first.
    Conflict(Vec<Literal>),
}

impl CheckVerdict {
    #[inline]
    pub fn is_consistent(&self) -> bool {
        matches!(self, CheckVerdict::Consistent)
    }
}

/// Decisions of levels `1..=decision_level`, in level order.
pub fn decision_trail<A: Assignment + ?Sized>(assignment: &A) -> Vec<Literal> {
    (1..=assignment.decision_level())
        .map(|level| assignment.decision(level))
        .collect()
}

struct ThreadSlot<S: CheckSolver> {
    checker: Checker<S>,
    phase: Phase,
}

type CheckProgram<F> = Vec<<<F as CheckSolverFactory>::Solver as CheckSolver>::Statement>;

/// Spatial consistency propagator over a guess/check program pair.
pub struct SpatialPropagator<F: CheckSolverFactory> {
    factory: F,
    check_program: CheckProgram<F>,
    registry: Arc<dyn EntityRegistry>,
    kernel: Arc<dyn GeometryKernel>,
    sink: Arc<dyn ShapeSink>,
    cfg: EngineCfg,
    index: TermIndex,
    initialized: bool,
    slots: Vec<Mutex<ThreadSlot<F::Solver>>>,
    store: Mutex<SpatialStore>,
}

impl<F: CheckSolverFactory> SpatialPropagator<F> {
    pub fn new(
        factory: F,
        check_program: CheckProgram<F>,
        registry: Arc<dyn EntityRegistry>,
    ) -> Self {
        Self {
            factory,
            check_program,
            registry,
            kernel: Arc::new(GeoKernel),
            sink: Arc::new(NullSink),
            cfg: EngineCfg::default(),
            index: TermIndex::new(),
            initialized: false,
            slots: Vec::new(),
            store: Mutex::new(SpatialStore::new()),
        }
    }

    pub fn with_cfg(mut self, cfg: EngineCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn with_kernel(mut self, kernel: Arc<dyn GeometryKernel>) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ShapeSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Build the index, the per-thread checkers and the equivalence clauses.
    pub fn init<I: PropagateInit>(&mut self, init: &mut I) -> Result<()> {
        let threads = init.number_of_threads();
        let symbolic = init.symbolic_atoms();
        let theory = init.theory_atoms();
        let mut index = TermIndex::new();

        for atom in &symbolic {
            let lit = init.solver_literal(atom.literal);
            init.add_watch(lit);
            index.track_literals(atom.literal, lit);
        }
        for atom in &theory {
            let lit = init.solver_literal(atom.literal);
            match SpatialTerm::from_theory_atom(atom)? {
                Some(term) => index.insert(atom.literal, lit, term),
                None => index.track_literals(atom.literal, lit),
            }
        }

        let mut slots = Vec::with_capacity(threads);
        for thread in 0..threads {
            let mut checker = Checker::new(thread, self.factory.create(thread));
            for atom in &symbolic {
                let lit = init.solver_literal(atom.literal);
                let truth = init.assignment().value(lit);
                if truth == Some(false) {
                    continue;
                }
                let semantic = checker.backend().add_atom(&atom.symbol);
                tracing::trace!(
                    thread,
                    program = atom.literal,
                    solver = lit,
                    semantic,
                    symbol = %atom.symbol,
                    "paired"
                );
                if truth == Some(true) {
                    checker.backend().add_fact(semantic);
                } else {
                    checker.backend().add_choice(semantic);
                    checker.add(lit, semantic);
                }
                if self.cfg.is_relation_name(&atom.symbol.name)
                    && !checker.register_relation(&atom.symbol, semantic)
                {
                    tracing::debug!(
                        thread,
                        symbol = %atom.symbol,
                        "relation atom without (label, x, y) arguments"
                    );
                }
            }
            checker.ground(&self.check_program);
            slots.push(Mutex::new(ThreadSlot {
                checker,
                phase: Phase::Watching,
            }));
        }

        let clauses = index.link_head_body();
        for clause in &clauses {
            tracing::trace!(?clause, "head/body equivalence");
            if !init.add_clause(clause) {
                tracing::info!(?clause, "inconsistent while adding equivalences");
                break;
            }
        }

        tracing::info!(
            threads,
            symbolic = symbolic.len(),
            terms = index.len(),
            equivalences = clauses.len() / 2,
            "propagator initialized"
        );
        self.index = index;
        self.slots = slots;
        self.initialized = true;
        Ok(())
    }

    /// Literal-change callback.
    pub fn propagate<C: PropagateControl>(
        &self,
        ctl: &mut C,
        changes: &[Literal],
    ) -> Result<CheckVerdict> {
        let thread = ctl.thread_id();
        let mut slot = self.slot(thread)?.lock();
        slot.phase = Phase::Propagating;
        tracing::debug!(thread, changes = changes.len(), "propagate");
        let verdict = match self.cfg.propagate_check {
            PropagateCheck::Simple => {
                let lits = self.true_solver_literals(ctl.assignment());
                self.spatial_propagate(lits, LiteralSpace::Solver)?;
                CheckVerdict::Consistent
            }
            PropagateCheck::Partial => self.full_check(ctl, &mut slot.checker)?,
        };
        slot.phase = if verdict.is_consistent() {
            Phase::Watching
        } else {
            Phase::ConflictReported
        };
        Ok(verdict)
    }

    /// Backtracking callback.
    pub fn undo<A: Assignment + ?Sized>(
        &self,
        thread: usize,
        _assignment: &A,
        changes: &[Literal],
    ) -> Result<()> {
        let mut slot = self.slot(thread)?.lock();
        tracing::debug!(thread, changes = changes.len(), "undo");
        slot.phase = Phase::Watching;
        Ok(())
    }

    /// Total-assignment callback.
    pub fn check<C: PropagateControl>(&self, ctl: &mut C) -> Result<CheckVerdict> {
        let thread = ctl.thread_id();
        let mut slot = self.slot(thread)?.lock();
        slot.phase = Phase::TotalCheck;
        let assignment = ctl.assignment();
        tracing::debug!(
            thread,
            level = assignment.decision_level(),
            total = assignment.is_total(),
            "check"
        );
        let verdict = self.full_check(ctl, &mut slot.checker)?;
        slot.phase = match verdict {
            CheckVerdict::Consistent => Phase::Satisfiable,
            CheckVerdict::Conflict(_) => Phase::ConflictReported,
        };
        Ok(verdict)
    }

    /// Model callback: materialize shapes of every true head term of the model.
    pub fn on_model<M: Model>(&self, model: &M) -> Result<()> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        let lits: Vec<Literal> = self
            .index
            .program_literals()
            .iter()
            .copied()
            .filter(|&l| model.is_true(l))
            .collect();
        tracing::debug!(thread = model.thread_id(), true_literals = lits.len(), "model");
        self.spatial_propagate(lits, LiteralSpace::Program)
    }

    fn full_check<C: PropagateControl>(
        &self,
        ctl: &mut C,
        checker: &mut Checker<F::Solver>,
    ) -> Result<CheckVerdict> {
        let thread = checker.thread();
        if !checker.check(ctl.assignment(), &[])? {
            tracing::info!(thread, "check program unsatisfiable under the decisions");
            return Ok(report_conflict(ctl));
        }
        let lits = self.true_solver_literals(ctl.assignment());
        self.spatial_propagate(lits, LiteralSpace::Solver)?;
        let forced = {
            let store = self.store.lock();
            checker.relation_assumptions(store.relations())
        };
        if !checker.check(ctl.assignment(), &forced)? {
            tracing::info!(
                thread,
                forced = forced.len(),
                "derived relations are inconsistent"
            );
            return Ok(report_conflict(ctl));
        }
        tracing::info!(thread, "satisfiable");
        Ok(CheckVerdict::Consistent)
    }

    /// Evaluate the head terms of `lits` and classify every resolvable relation pair.
    fn spatial_propagate<I>(&self, lits: I, space: LiteralSpace) -> Result<()>
    where
        I: IntoIterator<Item = Literal>,
    {
        let (heads, _) = self.index.head_terms(lits, space);
        let mut store = self.store.lock();
        let mut qstr = Qstr::new(
            &mut store,
            &*self.registry,
            &*self.kernel,
            &*self.sink,
            self.cfg.topology,
        );
        let stats = qstr.evaluate(&heads)?;
        let related = qstr.relate(self.index.relation_pairs())?;
        tracing::debug!(
            heads = heads.len(),
            passes = stats.passes,
            resolved = stats.resolved,
            memo_hits = stats.memo_hits,
            related,
            "spatial propagation"
        );
        Ok(())
    }

    fn true_solver_literals<A: Assignment + ?Sized>(&self, assignment: &A) -> Vec<Literal> {
        self.index
            .solver_literals()
            .iter()
            .copied()
            .filter(|&l| assignment.is_true(l))
            .collect()
    }

    fn slot(&self, thread: usize) -> Result<&Mutex<ThreadSlot<F::Solver>>> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        self.slots.get(thread).ok_or(EngineError::UnknownThread {
            thread,
            threads: self.slots.len(),
        })
    }

    /// Current phase of `thread`.
    pub fn phase(&self, thread: usize) -> Result<Phase> {
        Ok(self.slot(thread)?.lock().phase)
    }

    /// Semantic literals forced for `thread` by the relations derived so far.
    pub fn relation_assumptions(&self, thread: usize) -> Result<Vec<Literal>> {
        let slot = self.slot(thread)?.lock();
        let store = self.store.lock();
        Ok(slot.checker.relation_assumptions(store.relations()))
    }

    #[inline]
    pub fn index(&self) -> &TermIndex {
        &self.index
    }

    #[inline]
    pub fn cfg(&self) -> &EngineCfg {
        &self.cfg
    }

    /// Snapshot of every resolved identifier and its shape, sorted by identifier.
    pub fn shapes(&self) -> Vec<(ObjectId, Shape)> {
        let store = self.store.lock();
        store
            .assignments()
            .into_iter()
            .map(|(id, s)| (id.clone(), s.clone()))
            .collect()
    }

    pub fn shape(&self, id: &ObjectId) -> Option<Shape> {
        self.store.lock().shape(id).cloned()
    }

    /// Snapshot of the relation map.
    pub fn relations(&self) -> BTreeMap<(ObjectId, ObjectId), Relation> {
        self.store.lock().relations().clone()
    }
}

/// Submit the decision trail as a nogood.
///
/// At the root level the trail is empty and the empty nogood makes the search unsatisfiable.
fn report_conflict<C: PropagateControl>(ctl: &mut C) -> CheckVerdict {
    let trail = decision_trail(ctl.assignment());
    if trail.is_empty() {
        tracing::info!(thread = ctl.thread_id(), "inconsistent at root level");
    } else {
        tracing::trace!(thread = ctl.thread_id(), ?trail, "conflict");
    }
    if ctl.add_nogood(&trail) {
        ctl.propagate();
    }
    CheckVerdict::Conflict(trail)
}
