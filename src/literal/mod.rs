//! Dynamically-typed numeric/string value used throughout the engine.
//!
//! `Literal` is the value type that flows through expressions, records,
//! field descriptions and aggregator state. It mirrors the shape of
//! `serde_json::Value` (the teacher's dynamic value type) but is
//! specialised to the five kinds the rule-induction engine needs, and it
//! keeps the original decimal text of a float around so values round-trip
//! through display exactly as they were read (`"7.890"` stays `"7.890"`).

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value of exactly one kind.
///
/// Equality and hashing are defined in terms of the rendered string form
/// (spec invariant: "equality is by rendered string form"), not the
/// underlying numeric representation, so `Int(7)` and `Float(7.0)` compare
/// equal to each other but not to `Float(7.00)` entered with trailing zeros
/// unless those zeros were stripped on construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    /// `original` preserves the exact text the float was parsed from so
    /// that display is lossless; it is not considered part of the value's
    /// numeric identity.
    Float { value: OrderedFloat<f64>, original: String },
    String(String),
    Bool(bool),
    /// An error value. Arithmetic and comparisons involving an `Error`
    /// literal always produce another `Error` literal (spec invariant
    /// (iv): "Error propagates through arithmetic").
    Error(String),
}

impl Literal {
    pub fn int(v: i64) -> Self {
        Literal::Int(v)
    }

    pub fn float(v: f64) -> Self {
        let original = render_float(v);
        Literal::Float { value: OrderedFloat(v), original }
    }

    /// Construct a float literal preserving caller-supplied original text
    /// (used by the expression parser and the describer, which both see
    /// the source text a number was written as).
    pub fn float_with_text(v: f64, original: impl Into<String>) -> Self {
        Literal::Float { value: OrderedFloat(v), original: original.into() }
    }

    pub fn string(v: impl Into<String>) -> Self {
        Literal::String(v.into())
    }

    pub fn bool(v: bool) -> Self {
        Literal::Bool(v)
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Literal::Error(msg.into())
    }

    /// Parse a literal from its source text the way a CSV field or an
    /// expression constant would be interpreted: integer first, then
    /// float, else a bare string.
    pub fn parse(text: &str) -> Literal {
        if let Ok(i) = text.parse::<i64>() {
            return Literal::Int(i);
        }
        if let Ok(f) = text.parse::<f64>() {
            return Literal::float_with_text(f, text);
        }
        Literal::String(text.to_string())
    }

    /// Integer view: available iff constructed from an integer literal, or
    /// a float with no fractional part (spec invariant (ii)).
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int(i) => Some(*i),
            Literal::Float { value, .. } if value.0.fract() == 0.0 && value.0.is_finite() => {
                Some(value.0 as i64)
            }
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Literal::Int(i) => Some(*i as f64),
            Literal::Float { value, .. } => Some(value.0),
            _ => None,
        }
    }

    pub fn as_string(&self) -> &str {
        match self {
            Literal::String(s) => s,
            Literal::Error(s) => s,
            _ => panic!("as_string called on non-string literal; use to_display_string"),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Literal::Error(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Literal::Int(_) | Literal::Float { .. })
    }

    /// The rendered string form used for display, equality and as the
    /// basis for membership comparisons (`in`/`ni`).
    pub fn to_display_string(&self) -> String {
        match self {
            Literal::Int(i) => i.to_string(),
            Literal::Float { original, .. } => original.clone(),
            Literal::String(s) => s.clone(),
            Literal::Bool(true) => "TRUE".to_string(),
            Literal::Bool(false) => "FALSE".to_string(),
            Literal::Error(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.to_display_string() == other.to_display_string()
    }
}
impl Eq for Literal {}

impl std::hash::Hash for Literal {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_display_string().hash(state);
    }
}

/// Render a float the way the engine wants it displayed: trailing zeros
/// stripped, no trailing decimal point (`7.890300` -> `"7.8903"`,
/// `7.0` -> `"7"`).
pub fn render_float(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let mut s = format!("{v:.12}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

/// Count digits after the decimal point, excluding trailing zeros, as used
/// by the describer to track a field's `maxDP`.
pub fn decimal_places(text: &str) -> usize {
    match text.find('.') {
        None => 0,
        Some(idx) => {
            let frac = &text[idx + 1..];
            let trimmed = frac.trim_end_matches('0');
            trimmed.len()
        }
    }
}

/// Numeric addition used by the `sum`/`mean` aggregators: `Int + Int`
/// stays `Int`, any other combination of numeric operands promotes to
/// `Float`. Non-numeric operands (or an existing `Error`) produce `Error`.
pub fn add_numeric(a: &Literal, b: &Literal) -> Literal {
    if a.is_error() {
        return a.clone();
    }
    if b.is_error() {
        return b.clone();
    }
    match (a, b) {
        (Literal::Int(x), Literal::Int(y)) => Literal::int(x + y),
        _ => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => Literal::float(x + y),
            _ => Literal::error("non-numeric value in sum"),
        },
    }
}

/// Round half-away-from-zero to `dp` decimal places, used by `roundto`
/// and the rule tweaker.
pub fn round_to(v: f64, dp: u32) -> f64 {
    let factor = 10f64.powi(dp as i32);
    let scaled = v * factor;
    let rounded = if scaled >= 0.0 {
        (scaled + 0.5).floor()
    } else {
        (scaled - 0.5).ceil()
    };
    rounded / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_display_strips_trailing_zeros() {
        assert_eq!(Literal::float(7.8903).to_display_string(), "7.8903");
        assert_eq!(Literal::float(7.0).to_display_string(), "7");
    }

    #[test]
    fn original_text_is_preserved() {
        let l = Literal::float_with_text(7.89, "7.890");
        assert_eq!(l.to_display_string(), "7.890");
        let l2 = Literal::float_with_text(7.89, "7.89");
        assert_ne!(l.to_display_string(), l2.to_display_string());
    }

    #[test]
    fn equality_is_by_rendered_form() {
        assert_eq!(Literal::int(7), Literal::float(7.0));
        assert_ne!(Literal::int(7), Literal::string("7"));
    }

    #[test]
    fn integer_view_available_for_whole_floats() {
        assert_eq!(Literal::float(7.0).as_int(), Some(7));
        assert_eq!(Literal::float(7.5).as_int(), None);
    }

    #[test]
    fn bool_render() {
        assert_eq!(Literal::bool(true).to_display_string(), "TRUE");
        assert_eq!(Literal::bool(false).to_display_string(), "FALSE");
    }

    #[test]
    fn decimal_places_counts_excluding_trailing_zeros() {
        assert_eq!(decimal_places("15.1"), 1);
        assert_eq!(decimal_places("15.100"), 1);
        assert_eq!(decimal_places("15"), 0);
    }

    #[test]
    fn round_to_half_away_from_zero() {
        assert_eq!(round_to(0.75, 4), 0.75);
        assert_eq!(round_to(1.005, 2), 1.01);
        assert_eq!(round_to(-1.005, 2), -1.01);
    }

    #[test]
    fn parse_prefers_int_then_float_then_string() {
        assert!(matches!(Literal::parse("7"), Literal::Int(7)));
        assert!(matches!(Literal::parse("7.3"), Literal::Float { .. }));
        assert!(matches!(Literal::parse("9.9a"), Literal::String(_)));
    }
}
