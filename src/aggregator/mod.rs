//! Named pluggable per-rule accumulators (spec §4.2), generalised from the
//! teacher's `parser::aggregators_helper::{AggregateRegistry, AggregateImpl,
//! Accumulator}` split: a compile-time registry of kind factories, each
//! producing a `Spec` once per experiment and a fresh `Instance` per rule.

pub mod calc;
pub mod count;
pub mod goals_passed_score;
pub mod mean;
pub mod precision;
pub mod sum;

use crate::expr::{EvalError, FuncTable, SyntaxError};
use crate::literal::Literal;
use crate::record::Record;
use indexmap::IndexMap;
use std::fmt;

/// Raised by `make_spec` when the kind is unknown or the arg expression
/// fails to parse. Fatal for the containing experiment.
#[derive(Debug)]
pub enum CompileError {
    UnknownKind(String),
    BadArg(SyntaxError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnknownKind(k) => write!(f, "unknown aggregator kind: {k}"),
            CompileError::BadArg(e) => write!(f, "bad aggregator argument: {e}"),
        }
    }
}
impl std::error::Error for CompileError {}

impl From<SyntaxError> for CompileError {
    fn from(e: SyntaxError) -> Self {
        CompileError::BadArg(e)
    }
}

/// Where a spec's `result` reads its finalisation inputs from: a plain
/// aggregator only needs its own state; `calc` additionally needs every
/// peer's already-computed result; `goalsPassedScore` additionally needs
/// the pass/fail outcome of every goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Plain,
    Calc,
    GoalsPassedScore,
}

/// A fresh mutable accumulator bound to a spec, consumed by the rule
/// assessor — one per rule.
pub trait AggregatorInstance: Send {
    /// Mutate state iff `rule_is_true` for this record. A propagated
    /// `EvalError` marks the containing rule bad for the remainder of the
    /// assessment.
    fn next_record(&mut self, record: &Record, rule_is_true: bool, funcs: &FuncTable) -> Result<(), EvalError>;

    /// Finalise this instance's result.
    ///
    /// `peers` holds every already-computed non-`calc` result (plus, once
    /// computed, every `calc` result) keyed by aggregator name; `goals`
    /// holds the pass/fail outcome of every goal, populated only when this
    /// instance's `category` is `GoalsPassedScore`.
    fn result(&self, peers: &IndexMap<String, Literal>, num_records: i64, goals: &[bool]) -> Literal;

    fn category(&self) -> Category {
        Category::Plain
    }
}

/// `(name, kind, arg_expr)`. A fresh `Instance` is produced from this spec
/// for each rule under assessment. `new_instance` is handed the
/// experiment's function table so `calc` instances can evaluate their
/// composition expression at finalisation time.
pub trait AggregatorSpec: Send + Sync {
    fn name(&self) -> &str;
    fn new_instance(&self, funcs: &FuncTable) -> Box<dyn AggregatorInstance>;
}

type Factory = fn(&str, &str) -> Result<Box<dyn AggregatorSpec>, CompileError>;

/// Compile-time table of kind-name -> factory (spec design note: "a
/// compile-time table ... rather than runtime registration, unless plugin
/// loading is a hard requirement").
pub fn make_spec(kind: &str, name: &str, arg: &str) -> Result<Box<dyn AggregatorSpec>, CompileError> {
    let factory: Factory = match kind {
        "count" => count::make,
        "sum" => sum::make,
        "mean" => mean::make,
        "precision" => precision::make,
        "calc" => calc::make,
        "goalsPassedScore" => goals_passed_score::make,
        other => return Err(CompileError::UnknownKind(other.to_string())),
    };
    factory(name, arg)
}
