//! The rule taxonomy (spec §4.4): a sealed sum type with shared operations,
//! generalised from the teacher's `parser::ast::ScalarExpr` tagged-enum
//! shape and grounded on the original `rule.Rule`/`rule.TweakableRule`
//! interfaces (`InvalidRuleError`, `IncompatibleTypesRuleError`).
//!
//! Monomorphised rather than boxed as trait objects: the assessor's inner
//! loop calls `is_true` once per rule per record, and a flat enum match
//! avoids a vtable indirection there.

pub mod generator;
pub mod tweaker;

use crate::literal::{render_float, Literal};
use crate::record::Record;
use std::fmt;

#[derive(Debug, Clone)]
pub enum RuleError {
    InvalidRule { rule: String, field: String },
    IncompatibleTypes { rule: String, field: String },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::InvalidRule { rule, field } => {
                write!(f, "invalid rule: {rule} (missing field {field})")
            }
            RuleError::IncompatibleTypes { rule, field } => {
                write!(f, "incompatible types in rule: {rule} (field {field})")
            }
        }
    }
}
impl std::error::Error for RuleError {}

/// A pure boolean predicate over a record. Equality and hashing are by
/// canonical string, matching the dedup rule used throughout the generator
/// and the `And`/`Or` invalidity checks ("invalid if R1==R2").
#[derive(Debug, Clone)]
pub enum Rule {
    True,
    EqFV(String, Literal),
    NeFV(String, Literal),
    GeFV(String, f64),
    LeFV(String, f64),
    GtFF(String, String),
    LtFF(String, String),
    EqFF(String, String),
    NeFF(String, String),
    GeFF(String, String),
    LeFF(String, String),
    BetweenFVI(String, i64, i64),
    InFV(String, Vec<String>),
    AddGEF(String, String, f64),
    AddLEF(String, String, f64),
    MulGEF(String, String, f64),
    MulLEF(String, String, f64),
    And(Box<Rule>, Box<Rule>),
    Or(Box<Rule>, Box<Rule>),
}

fn fmt_value(v: &Literal) -> String {
    match v {
        Literal::String(s) => format!("\"{s}\""),
        other => other.to_display_string(),
    }
}

fn fmt_num(c: f64) -> String {
    render_float(c)
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::True => write!(f, "true()"),
            Rule::EqFV(field, v) => write!(f, "{field} == {}", fmt_value(v)),
            Rule::NeFV(field, v) => write!(f, "{field} != {}", fmt_value(v)),
            Rule::GeFV(field, c) => write!(f, "{field} >= {}", fmt_num(*c)),
            Rule::LeFV(field, c) => write!(f, "{field} <= {}", fmt_num(*c)),
            Rule::GtFF(a, b) => write!(f, "{a} > {b}"),
            Rule::LtFF(a, b) => write!(f, "{a} < {b}"),
            Rule::EqFF(a, b) => write!(f, "{a} == {b}"),
            Rule::NeFF(a, b) => write!(f, "{a} != {b}"),
            Rule::GeFF(a, b) => write!(f, "{a} >= {b}"),
            Rule::LeFF(a, b) => write!(f, "{a} <= {b}"),
            Rule::BetweenFVI(field, lo, hi) => write!(f, "{field} >= {lo} && {field} <= {hi}"),
            Rule::InFV(field, values) => {
                let joined = values.iter().map(|v| format!("\"{v}\"")).collect::<Vec<_>>().join(", ");
                write!(f, "in({field}, {joined})")
            }
            Rule::AddGEF(a, b, c) => write!(f, "{a} + {b} >= {}", fmt_num(*c)),
            Rule::AddLEF(a, b, c) => write!(f, "{a} + {b} <= {}", fmt_num(*c)),
            Rule::MulGEF(a, b, c) => write!(f, "{a} * {b} >= {}", fmt_num(*c)),
            Rule::MulLEF(a, b, c) => write!(f, "{a} * {b} <= {}", fmt_num(*c)),
            Rule::And(a, b) => write!(f, "({a}) && ({b})"),
            Rule::Or(a, b) => write!(f, "({a}) || ({b})"),
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
impl Eq for Rule {}

impl Rule {
    /// Dependency field names, in the order they appear in the rule.
    pub fn fields(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields(&self, out: &mut Vec<String>) {
        let mut push = |name: &str| {
            if !out.iter().any(|f| f == name) {
                out.push(name.to_string());
            }
        };
        match self {
            Rule::True => {}
            Rule::EqFV(f, _) | Rule::NeFV(f, _) | Rule::GeFV(f, _) | Rule::LeFV(f, _) | Rule::BetweenFVI(f, _, _) | Rule::InFV(f, _) => {
                push(f);
            }
            Rule::GtFF(a, b) | Rule::LtFF(a, b) | Rule::EqFF(a, b) | Rule::NeFF(a, b) | Rule::GeFF(a, b) | Rule::LeFF(a, b) => {
                push(a);
                push(b);
            }
            Rule::AddGEF(a, b, _) | Rule::AddLEF(a, b, _) | Rule::MulGEF(a, b, _) | Rule::MulLEF(a, b, _) => {
                push(a);
                push(b);
            }
            Rule::And(l, r) | Rule::Or(l, r) => {
                for name in l.fields() {
                    push(&name);
                }
                for name in r.fields() {
                    push(&name);
                }
            }
        }
    }

    fn get_numeric(record: &Record, rule: &Rule, field: &str) -> Result<f64, RuleError> {
        let v = record.get(field).ok_or_else(|| RuleError::InvalidRule { rule: rule.to_string(), field: field.to_string() })?;
        v.as_float().ok_or_else(|| RuleError::IncompatibleTypes { rule: rule.to_string(), field: field.to_string() })
    }

    fn get_value<'a>(record: &'a Record, rule: &Rule, field: &str) -> Result<&'a Literal, RuleError> {
        record.get(field).ok_or_else(|| RuleError::InvalidRule { rule: rule.to_string(), field: field.to_string() })
    }

    pub fn is_true(&self, record: &Record) -> Result<bool, RuleError> {
        match self {
            Rule::True => Ok(true),
            Rule::EqFV(field, v) => {
                let rv = Self::get_value(record, self, field)?;
                Ok(rv == v)
            }
            Rule::NeFV(field, v) => {
                let rv = Self::get_value(record, self, field)?;
                Ok(rv != v)
            }
            Rule::GeFV(field, c) => Ok(Self::get_numeric(record, self, field)? >= *c),
            Rule::LeFV(field, c) => Ok(Self::get_numeric(record, self, field)? <= *c),
            Rule::GtFF(a, b) => Ok(Self::get_numeric(record, self, a)? > Self::get_numeric(record, self, b)?),
            Rule::LtFF(a, b) => Ok(Self::get_numeric(record, self, a)? < Self::get_numeric(record, self, b)?),
            Rule::GeFF(a, b) => Ok(Self::get_numeric(record, self, a)? >= Self::get_numeric(record, self, b)?),
            Rule::LeFF(a, b) => Ok(Self::get_numeric(record, self, a)? <= Self::get_numeric(record, self, b)?),
            Rule::EqFF(a, b) => {
                let va = Self::get_value(record, self, a)?;
                let vb = Self::get_value(record, self, b)?;
                Ok(va == vb)
            }
            Rule::NeFF(a, b) => {
                let va = Self::get_value(record, self, a)?;
                let vb = Self::get_value(record, self, b)?;
                Ok(va != vb)
            }
            Rule::BetweenFVI(field, lo, hi) => {
                let v = Self::get_numeric(record, self, field)?;
                Ok(v >= *lo as f64 && v <= *hi as f64)
            }
            Rule::InFV(field, values) => {
                let rv = Self::get_value(record, self, field)?;
                let s = rv.to_display_string();
                Ok(values.iter().any(|v| v == &s))
            }
            Rule::AddGEF(a, b, c) => Ok(Self::get_numeric(record, self, a)? + Self::get_numeric(record, self, b)? >= *c),
            Rule::AddLEF(a, b, c) => Ok(Self::get_numeric(record, self, a)? + Self::get_numeric(record, self, b)? <= *c),
            Rule::MulGEF(a, b, c) => Ok(Self::get_numeric(record, self, a)? * Self::get_numeric(record, self, b)? >= *c),
            Rule::MulLEF(a, b, c) => Ok(Self::get_numeric(record, self, a)? * Self::get_numeric(record, self, b)? <= *c),
            Rule::And(l, r) => {
                let lv = l.is_true(record)?;
                let rv = r.is_true(record)?;
                Ok(lv && rv)
            }
            Rule::Or(l, r) => {
                let lv = l.is_true(record)?;
                let rv = r.is_true(record)?;
                Ok(lv || rv)
            }
        }
    }

    /// Builds a valid `And`/`Or`: rejects combining a rule with itself or
    /// with `true()` (spec §4.4: "invalid if R1==R2 or one is True").
    pub fn combine_and(a: Rule, b: Rule) -> Option<Rule> {
        if a == b || a == Rule::True || b == Rule::True {
            return None;
        }
        Some(Rule::And(Box::new(a), Box::new(b)))
    }

    pub fn combine_or(a: Rule, b: Rule) -> Option<Rule> {
        if a == b || a == Rule::True || b == Rule::True {
            return None;
        }
        Some(Rule::Or(Box::new(a), Box::new(b)))
    }

    /// Whether this variant supports `tweak` (spec §4.4 "Tweakable?"
    /// column).
    pub fn is_tweakable(&self) -> bool {
        matches!(self, Rule::GeFV(..) | Rule::LeFV(..) | Rule::AddGEF(..) | Rule::AddLEF(..) | Rule::MulGEF(..) | Rule::MulLEF(..))
    }

    /// For tweakable variants of the same shape and field(s), rules
    /// overlap and belong to the same refinement family (spec §4.4).
    pub fn overlaps(&self, other: &Rule) -> bool {
        match (self, other) {
            (Rule::GeFV(f1, _), Rule::GeFV(f2, _)) => f1 == f2,
            (Rule::LeFV(f1, _), Rule::LeFV(f2, _)) => f1 == f2,
            (Rule::AddGEF(a1, b1, _), Rule::AddGEF(a2, b2, _)) => a1 == a2 && b1 == b2,
            (Rule::AddLEF(a1, b1, _), Rule::AddLEF(a2, b2, _)) => a1 == a2 && b1 == b2,
            (Rule::MulGEF(a1, b1, _), Rule::MulGEF(a2, b2, _)) => a1 == a2 && b1 == b2,
            (Rule::MulLEF(a1, b1, _), Rule::MulLEF(a2, b2, _)) => a1 == a2 && b1 == b2,
            (Rule::InFV(f1, _), Rule::InFV(f2, _)) => f1 == f2,
            _ => false,
        }
    }

    /// A family key used by refinement to cap rules "per `(field,
    /// operator)` pair" (spec §4.8 step 3).
    pub fn family_key(&self) -> Option<String> {
        match self {
            Rule::GeFV(f, _) => Some(format!("{f}^>=")),
            Rule::LeFV(f, _) => Some(format!("{f}^<=")),
            Rule::AddGEF(a, b, _) => Some(format!("{a}+{b}^>=")),
            Rule::AddLEF(a, b, _) => Some(format!("{a}+{b}^<=")),
            Rule::MulGEF(a, b, _) => Some(format!("{a}*{b}^>=")),
            Rule::MulLEF(a, b, _) => Some(format!("{a}*{b}^<=")),
            _ => None,
        }
    }

    pub fn in_fv_field(&self) -> Option<(&str, bool)> {
        match self {
            Rule::InFV(f, _) => Some((f, true)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: &[(&str, Literal)]) -> Record {
        let mut r = Record::new();
        for (k, v) in pairs {
            r.insert(*k, v.clone());
        }
        r
    }

    #[test]
    fn true_rule_always_holds() {
        assert!(Rule::True.is_true(&Record::new()).unwrap());
        assert_eq!(Rule::True.to_string(), "true()");
    }

    #[test]
    fn eqfv_missing_field_is_invalid_rule_error() {
        let r = Rule::EqFV("x".into(), Literal::int(5));
        let err = r.is_true(&Record::new()).unwrap_err();
        assert!(matches!(err, RuleError::InvalidRule { .. }));
    }

    #[test]
    fn gefv_wrong_type_is_incompatible_types_error() {
        let r = Rule::GeFV("x".into(), 5.0);
        let record = rec(&[("x", Literal::string("abc"))]);
        let err = r.is_true(&record).unwrap_err();
        assert!(matches!(err, RuleError::IncompatibleTypes { .. }));
    }

    #[test]
    fn two_field_comparison() {
        let r = Rule::GtFF("a".into(), "b".into());
        let record = rec(&[("a", Literal::int(5)), ("b", Literal::int(2))]);
        assert!(r.is_true(&record).unwrap());
        assert_eq!(r.to_string(), "a > b");
    }

    #[test]
    fn in_fv_canonical_form_and_membership() {
        let r = Rule::InFV("level".into(), vec!["0".into(), "1".into()]);
        assert_eq!(r.to_string(), "in(level, \"0\", \"1\")");
        let record = rec(&[("level", Literal::int(1))]);
        assert!(r.is_true(&record).unwrap());
        let record = rec(&[("level", Literal::int(2))]);
        assert!(!r.is_true(&record).unwrap());
    }

    #[test]
    fn and_rejects_self_combination_and_true() {
        let r = Rule::GeFV("x".into(), 1.0);
        assert!(Rule::combine_and(r.clone(), r.clone()).is_none());
        assert!(Rule::combine_and(Rule::True, r.clone()).is_none());
        let other = Rule::LeFV("x".into(), 10.0);
        assert!(Rule::combine_and(r, other).is_some());
    }

    #[test]
    fn and_propagates_leftmost_error() {
        let r = Rule::And(Box::new(Rule::EqFV("missing".into(), Literal::int(1))), Box::new(Rule::True));
        let err = r.is_true(&Record::new()).unwrap_err();
        assert!(matches!(err, RuleError::InvalidRule { field, .. } if field == "missing"));
    }

    #[test]
    fn fields_collects_dependencies_in_order_deduped() {
        let r = Rule::And(
            Box::new(Rule::GtFF("a".into(), "b".into())),
            Box::new(Rule::GeFV("a".into(), 1.0)),
        );
        assert_eq!(r.fields(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn overlaps_is_true_for_same_shape_same_field() {
        let r1 = Rule::GeFV("income".into(), 100.0);
        let r2 = Rule::GeFV("income".into(), 200.0);
        let r3 = Rule::GeFV("cost".into(), 200.0);
        assert!(r1.overlaps(&r2));
        assert!(!r1.overlaps(&r3));
    }
}
