//! Expression evaluation against a record and a function table, in the
//! teacher's `executor::eval::Eval` style: a stateless evaluator struct
//! with a recursive `eval` and a boolean-checked `eval_bool` wrapper.

use super::ast::{BinOp, Expr};
use super::error::EvalError;
use super::funcs::FuncTable;
use crate::literal::Literal;
use crate::record::Record;

pub struct Eval;

impl Eval {
    /// Evaluate `expr` against `record`, returning an `Error`-kind literal
    /// for unknown variables, type mismatches, division by zero or
    /// unknown functions rather than a `Result` — per spec, an error
    /// value flows through arithmetic like any other value and is only
    /// turned into a `Result` at the boolean boundary (`eval_bool`).
    pub fn eval(expr: &Expr, record: &Record, funcs: &FuncTable) -> Literal {
        match expr {
            Expr::Lit(l) => l.clone(),
            Expr::Field(name) => match record.get(name) {
                Some(v) => v.clone(),
                None => Literal::error(format!("variable does not exist: {name}")),
            },
            Expr::Not(inner) => {
                let v = Self::eval(inner, record, funcs);
                match v.as_bool() {
                    Some(b) => Literal::bool(!b),
                    None if v.is_error() => v,
                    None => Literal::error("! applied to non-boolean"),
                }
            }
            Expr::Neg(inner) => {
                let v = Self::eval(inner, record, funcs);
                if v.is_error() {
                    return v;
                }
                match v {
                    Literal::Int(i) => Literal::int(-i),
                    Literal::Float { .. } => Literal::float(-v.as_float().unwrap()),
                    _ => Literal::error("unary - applied to non-numeric"),
                }
            }
            Expr::Bin(op, l, r) => {
                let lv = Self::eval(l, record, funcs);
                let rv = Self::eval(r, record, funcs);
                Self::eval_bin(*op, lv, rv)
            }
            Expr::Call(name, args) => {
                let values: Vec<Literal> = args.iter().map(|a| Self::eval(a, record, funcs)).collect();
                if let Some(err) = values.iter().find(|v| v.is_error()) {
                    return (*err).clone();
                }
                match funcs.call(name, &values) {
                    Some(v) => v,
                    None => Literal::error(format!("unknown function: {name}")),
                }
            }
        }
    }

    fn eval_bin(op: BinOp, l: Literal, r: Literal) -> Literal {
        if l.is_error() {
            return l;
        }
        if r.is_error() {
            return r;
        }
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => Self::arith(op, &l, &r),
            BinOp::Eq => Literal::bool(l == r),
            BinOp::Ne => Literal::bool(l != r),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => Self::relational(op, &l, &r),
            BinOp::And => match (l.as_bool(), r.as_bool()) {
                (Some(a), Some(b)) => Literal::bool(a && b),
                _ => Literal::error("&& applied to non-boolean"),
            },
            BinOp::Or => match (l.as_bool(), r.as_bool()) {
                (Some(a), Some(b)) => Literal::bool(a || b),
                _ => Literal::error("|| applied to non-boolean"),
            },
        }
    }

    fn arith(op: BinOp, l: &Literal, r: &Literal) -> Literal {
        let (Some(lf), Some(rf)) = (l.as_float(), r.as_float()) else {
            return Literal::error(format!("incompatible types for {}", arith_name(op)));
        };
        let both_int = matches!(l, Literal::Int(_)) && matches!(r, Literal::Int(_));
        match op {
            BinOp::Add => {
                if both_int {
                    Literal::int(l.as_int().unwrap() + r.as_int().unwrap())
                } else {
                    Literal::float(lf + rf)
                }
            }
            BinOp::Sub => {
                if both_int {
                    Literal::int(l.as_int().unwrap() - r.as_int().unwrap())
                } else {
                    Literal::float(lf - rf)
                }
            }
            BinOp::Mul => {
                if both_int {
                    Literal::int(l.as_int().unwrap() * r.as_int().unwrap())
                } else {
                    Literal::float(lf * rf)
                }
            }
            BinOp::Div => {
                if rf == 0.0 {
                    return Literal::error("division by zero");
                }
                if both_int && l.as_int().unwrap() % r.as_int().unwrap() == 0 {
                    Literal::int(l.as_int().unwrap() / r.as_int().unwrap())
                } else {
                    Literal::float(lf / rf)
                }
            }
            _ => unreachable!(),
        }
    }

    fn relational(op: BinOp, l: &Literal, r: &Literal) -> Literal {
        let (Some(lf), Some(rf)) = (l.as_float(), r.as_float()) else {
            return Literal::error(format!("incompatible types for {}", arith_name(op)));
        };
        let b = match op {
            BinOp::Lt => lf < rf,
            BinOp::Le => lf <= rf,
            BinOp::Gt => lf > rf,
            BinOp::Ge => lf >= rf,
            _ => unreachable!(),
        };
        Literal::bool(b)
    }

    /// Evaluate `expr` and require a boolean result; `Error` literals and
    /// non-boolean results are surfaced as `EvalError`.
    pub fn eval_bool(expr: &Expr, record: &Record, funcs: &FuncTable) -> Result<bool, EvalError> {
        let v = Self::eval(expr, record, funcs);
        match v {
            Literal::Bool(b) => Ok(b),
            Literal::Error(msg) => Err(classify_error(&msg)),
            other => Err(EvalError::NotBoolean(other.to_display_string())),
        }
    }

    /// Evaluate `expr`, surfacing an `Error`-kind result as `EvalError`
    /// instead of letting it flow on as a value. Used by aggregators whose
    /// arg expression is arithmetic rather than boolean (spec §4.1:
    /// "a failed expression inside an aggregator NextRecord aborts that
    /// aggregator-instance ... and surfaces the error").
    pub fn eval_checked(expr: &Expr, record: &Record, funcs: &FuncTable) -> Result<Literal, EvalError> {
        let v = Self::eval(expr, record, funcs);
        match v {
            Literal::Error(msg) => Err(classify_error(&msg)),
            other => Ok(other),
        }
    }
}

fn arith_name(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        _ => "?",
    }
}

fn classify_error(msg: &str) -> EvalError {
    if let Some(rest) = msg.strip_prefix("variable does not exist: ") {
        EvalError::VarNotExist(rest.to_string())
    } else if msg == "division by zero" {
        EvalError::DivisionByZero
    } else if let Some(rest) = msg.strip_prefix("unknown function: ") {
        EvalError::UnknownFunction(rest.to_string())
    } else {
        EvalError::IncompatibleTypes { op: msg.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parser::parse;

    fn rec(pairs: &[(&str, Literal)]) -> Record {
        let mut r = Record::new();
        for (k, v) in pairs {
            r.insert(*k, v.clone());
        }
        r
    }

    #[test]
    fn arithmetic_mixed_int_float_promotes_to_float() {
        let funcs = FuncTable::with_builtins();
        let r = rec(&[("income", Literal::int(3)), ("cost", Literal::float(4.5))]);
        let e = parse("income - cost").unwrap();
        let v = Eval::eval(&e, &r, &funcs);
        assert_eq!(v.as_float(), Some(-1.5));
    }

    #[test]
    fn unknown_variable_is_error_and_surfaces_on_eval_bool() {
        let funcs = FuncTable::with_builtins();
        let r = rec(&[]);
        let e = parse("missing == 1").unwrap();
        let err = Eval::eval_bool(&e, &r, &funcs).unwrap_err();
        assert_eq!(err, EvalError::VarNotExist("missing".to_string()));
    }

    #[test]
    fn division_by_zero_is_error() {
        let funcs = FuncTable::with_builtins();
        let r = rec(&[("x", Literal::int(1)), ("y", Literal::int(0))]);
        let e = parse("x / y").unwrap();
        let v = Eval::eval(&e, &r, &funcs);
        assert!(v.is_error());
    }

    #[test]
    fn error_propagates_through_arithmetic() {
        let funcs = FuncTable::with_builtins();
        let r = rec(&[("x", Literal::int(1))]);
        let e = parse("(x / 0) + 5").unwrap();
        let v = Eval::eval(&e, &r, &funcs);
        assert!(v.is_error());
    }

    #[test]
    fn roundto_via_eval() {
        let funcs = FuncTable::with_builtins();
        let r = rec(&[("x", Literal::float(7.89030))]);
        let e = parse("roundto(x, 2)").unwrap();
        let v = Eval::eval(&e, &r, &funcs);
        assert_eq!(v.to_display_string(), "7.89");
    }

    #[test]
    fn membership_and_bool_connectives() {
        let funcs = FuncTable::with_builtins();
        let r = rec(&[("level", Literal::int(3))]);
        let e = parse("in(level, \"3\", \"4\") && level > 0").unwrap();
        assert_eq!(Eval::eval_bool(&e, &r, &funcs), Ok(true));
    }
}
