//! Boundary to the external Boolean search.
//!
//! The engine never searches itself. It is driven through the callbacks of a
//! propagator-style solver interface and talks back through watches, clauses
//! and nogoods. The nested check search is a second solver instance that only
//! answers "satisfiable under these assumptions?".
//!
//! Literal convention: nonzero `i32`, negative means the negated literal.

use std::fmt;

/// Solver or program literal (sign = polarity).
pub type Literal = i32;

/// Ground function term `name(arg, ...)`; nullary symbols print as `name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    pub name: String,
    pub args: Vec<String>,
}

impl Symbol {
    pub fn new<N: Into<String>>(name: N, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}({})", self.name, self.args.join(","))
        }
    }
}

/// Plain (non-theory) atom of the grounded guess program.
#[derive(Clone, Debug)]
pub struct SymbolicAtom {
    /// Program literal.
    pub literal: Literal,
    pub symbol: Symbol,
}

/// Value inside a theory atom element or guard.
#[derive(Clone, Debug, PartialEq)]
pub enum TheoryValue {
    Symbol(String),
    Number(f64),
    Function { name: String, args: Vec<TheoryValue> },
}

impl fmt::Display for TheoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TheoryValue::Symbol(s) => write!(f, "{s}"),
            TheoryValue::Number(n) => write!(f, "{n}"),
            TheoryValue::Function { name, args } => {
                write!(f, "{name}(")?;
                for (k, a) in args.iter().enumerate() {
                    if k > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// One `terms : condition` element of a theory atom (condition already resolved).
#[derive(Clone, Debug, PartialEq)]
pub struct TheoryElement {
    pub terms: Vec<TheoryValue>,
}

/// Grounded theory atom `&operator(location) { elements } guard`.
#[derive(Clone, Debug)]
pub struct TheoryAtom {
    /// Program literal.
    pub literal: Literal,
    pub operator: String,
    /// Location tag injected when rewriting (`head` or `body`).
    pub location: String,
    pub elements: Vec<TheoryElement>,
    /// Guard as `(operator, right-hand side)`, e.g. `("=", r)`.
    pub guard: Option<(String, TheoryValue)>,
}

/// Read access to the search's partial assignment.
pub trait Assignment {
    fn value(&self, lit: Literal) -> Option<bool>;
    fn level(&self, lit: Literal) -> u32;
    fn decision_level(&self) -> u32;
    /// Decision literal of `level` (`1..=decision_level()`).
    fn decision(&self, level: u32) -> Literal;
    fn is_total(&self) -> bool;

    #[inline]
    fn is_true(&self, lit: Literal) -> bool {
        self.value(lit) == Some(true)
    }
}

/// Initialization hooks of the outer search.
pub trait PropagateInit {
    type Assignment: Assignment;

    fn number_of_threads(&self) -> usize;
    fn symbolic_atoms(&self) -> Vec<SymbolicAtom>;
    fn theory_atoms(&self) -> Vec<TheoryAtom>;
    /// Map a program literal to its solver literal.
    fn solver_literal(&self, program_literal: Literal) -> Literal;
    fn add_watch(&mut self, lit: Literal);
    /// Add a permanent clause; returns false if the problem became inconsistent.
    fn add_clause(&mut self, clause: &[Literal]) -> bool;
    fn assignment(&self) -> &Self::Assignment;
}

/// Per-thread control handed to propagation and check callbacks.
pub trait PropagateControl {
    type Assignment: Assignment;

    fn thread_id(&self) -> usize;
    fn assignment(&self) -> &Self::Assignment;
    /// Submit a nogood; returns false if propagation must stop.
    fn add_nogood(&mut self, nogood: &[Literal]) -> bool;
    /// Propagate pending consequences; returns false on conflict.
    fn propagate(&mut self) -> bool;
}

/// Answer set handed to the model callback.
pub trait Model {
    fn thread_id(&self) -> usize;
    /// Truth of a program literal in the model.
    fn is_true(&self, program_literal: Literal) -> bool;
}

/// Verdict of a nested solve call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    Satisfiable,
    Unsatisfiable,
    Interrupted,
}

/// Nested incremental search over the separately grounded check program.
pub trait CheckSolver {
    /// Statement type of the check program.
    type Statement;

    /// Register an atom and return its literal.
    fn add_atom(&mut self, symbol: &Symbol) -> Literal;
    /// Rule `lit.`
    fn add_fact(&mut self, lit: Literal);
    /// Rule `{lit}.`
    fn add_choice(&mut self, lit: Literal);
    fn ground(&mut self, program: &[Self::Statement]);
    fn solve(&mut self, assumptions: &[Literal]) -> SolveOutcome;
}

/// Builds one nested solver per search thread.
pub trait CheckSolverFactory {
    type Solver: CheckSolver;

    fn create(&self, thread_id: usize) -> Self::Solver;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_and_value_rendering() {
        let s = Symbol::new("topology", vec!["overlaps".into(), "x".into(), "y".into()]);
        assert_eq!(s.to_string(), "topology(overlaps,x,y)");
        assert_eq!(Symbol::new("a", vec![]).to_string(), "a");
        let v = TheoryValue::Function {
            name: "site".into(),
            args: vec![TheoryValue::Number(3.0), TheoryValue::Symbol("b".into())],
        };
        assert_eq!(v.to_string(), "site(3,b)");
    }
}
