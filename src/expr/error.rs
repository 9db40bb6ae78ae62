//! Expression-level error taxonomy (spec §7).

use std::fmt;

/// Raised when `Expression::parse` cannot build a tree from the source
/// text. Fatal for the containing spec (aggregator/goal construction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub position: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        SyntaxError { message: message.into(), position }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syntax error at {}: {}", self.position, self.message)
    }
}
impl std::error::Error for SyntaxError {}

/// Raised by `eval_bool` when the evaluated expression is not a boolean,
/// or carries one of the evaluation failures below. Rule-local: the
/// containing rule or aggregator instance is marked bad for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    VarNotExist(String),
    IncompatibleTypes { op: String },
    DivisionByZero,
    UnknownFunction(String),
    NotBoolean(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::VarNotExist(name) => write!(f, "variable does not exist: {name}"),
            EvalError::IncompatibleTypes { op } => write!(f, "incompatible types for {op}"),
            EvalError::DivisionByZero => write!(f, "division by zero"),
            EvalError::UnknownFunction(name) => write!(f, "unknown function: {name}"),
            EvalError::NotBoolean(rendered) => write!(f, "expression is not boolean: {rendered}"),
        }
    }
}
impl std::error::Error for EvalError {}
