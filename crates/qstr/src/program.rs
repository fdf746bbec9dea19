//! Guess/check program partitioning.
//!
//! Input programs are split by `#program` directives: rules under `base` or
//! `guess` go to the outer search, rules under `check` are grounded into the
//! nested check search of every thread. Anything else aborts startup.

use crate::error::{EngineError, Result};

/// A statement of the (already parsed) input program.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement<R> {
    /// `#program name(params).`
    Program { name: String, params: Vec<String> },
    Rule(R),
}

/// Rules routed per part.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition<R> {
    pub guess: Vec<R>,
    pub check: Vec<R>,
}

impl<R> Default for Partition<R> {
    fn default() -> Self {
        Self {
            guess: Vec::new(),
            check: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Part {
    Guess,
    Check,
}

/// Route rules to the guess or check part. Rules before any directive are guess rules.
pub fn split_program<R, I>(statements: I) -> Result<Partition<R>>
where
    I: IntoIterator<Item = Statement<R>>,
{
    let mut out = Partition::default();
    let mut part = Part::Guess;
    for stm in statements {
        match stm {
            Statement::Program { name, params } => {
                if !params.is_empty() {
                    return Err(EngineError::UnexpectedProgramStructure(format!(
                        "program part `{name}` takes no parameters, got {params:?}"
                    )));
                }
                part = match name.as_str() {
                    "check" => Part::Check,
                    "base" | "guess" => Part::Guess,
                    _ => {
                        return Err(EngineError::UnexpectedProgramStructure(format!(
                            "unknown program part `{name}`"
                        )))
                    }
                };
            }
            Statement::Rule(r) => match part {
                Part::Guess => out.guess.push(r),
                Part::Check => out.check.push(r),
            },
        }
    }
    Ok(out)
}
