//! The function table passed explicitly to `eval` (spec design note: "pass
//! explicitly as a parameter rather than via process-wide state; construct
//! once per experiment").

use crate::literal::{round_to, Literal};
use std::collections::HashMap;

pub type BuiltinFn = fn(&[Literal]) -> Literal;

#[derive(Clone)]
pub struct FuncTable {
    fns: HashMap<String, BuiltinFn>,
}

impl FuncTable {
    pub fn empty() -> Self {
        FuncTable { fns: HashMap::new() }
    }

    /// The standard table: `roundto`, `in`, `ni`.
    pub fn with_builtins() -> Self {
        let mut t = FuncTable::empty();
        t.register("roundto", roundto);
        t.register("in", in_fn);
        t.register("ni", ni_fn);
        t
    }

    pub fn register(&mut self, name: impl Into<String>, f: BuiltinFn) {
        self.fns.insert(name.into(), f);
    }

    pub fn call(&self, name: &str, args: &[Literal]) -> Option<Literal> {
        self.fns.get(name).map(|f| f(args))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fns.contains_key(name)
    }
}

impl Default for FuncTable {
    fn default() -> Self {
        FuncTable::with_builtins()
    }
}

fn roundto(args: &[Literal]) -> Literal {
    let [x, dp] = args else {
        return Literal::error("roundto expects 2 arguments");
    };
    if x.is_error() {
        return x.clone();
    }
    if dp.is_error() {
        return dp.clone();
    }
    let (Some(v), Some(dp)) = (x.as_float(), dp.as_int()) else {
        return Literal::error("roundto expects numeric arguments");
    };
    if dp < 0 {
        return Literal::error("roundto: dp must be non-negative");
    }
    format_rounded(v, dp as u32)
}

/// Round `v` half-away-from-zero to `dp` places and render with no
/// trailing zeros beyond `dp`.
pub fn format_rounded(v: f64, dp: u32) -> Literal {
    let rounded = round_to(v, dp);
    let mut s = format!("{:.*}", dp as usize, rounded);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    Literal::float_with_text(rounded, s)
}

fn in_fn(args: &[Literal]) -> Literal {
    membership(args, false)
}

fn ni_fn(args: &[Literal]) -> Literal {
    membership(args, true)
}

fn membership(args: &[Literal], negate: bool) -> Literal {
    let [value, rest @ ..] = args else {
        return Literal::error("in/ni expects a value and at least one comparator");
    };
    if value.is_error() {
        return value.clone();
    }
    for v in rest {
        if v.is_error() {
            return v.clone();
        }
    }
    let found = rest.iter().any(|v| v.to_display_string() == value.to_display_string());
    Literal::bool(if negate { !found } else { found })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundto_strips_trailing_zeros_beyond_dp() {
        let t = FuncTable::with_builtins();
        let r = t.call("roundto", &[Literal::float(7.89030), Literal::int(4)]).unwrap();
        assert_eq!(r.to_display_string(), "7.8903");
    }

    #[test]
    fn in_and_ni_use_string_form_equality() {
        let t = FuncTable::with_builtins();
        let r = t
            .call("in", &[Literal::int(3), Literal::string("3"), Literal::string("4")])
            .unwrap();
        assert_eq!(r.as_bool(), Some(true));

        let r2 = t
            .call("ni", &[Literal::int(3), Literal::string("3"), Literal::string("4")])
            .unwrap();
        assert_eq!(r2.as_bool(), Some(false));
    }

    #[test]
    fn unknown_function_returns_none() {
        let t = FuncTable::with_builtins();
        assert!(t.call("bogus", &[]).is_none());
    }
}
