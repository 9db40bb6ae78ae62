//! `precision`: fraction of rule-matching records for which the arg
//! (a boolean expression) also held, rounded to 4 decimal places.

use super::{AggregatorInstance, AggregatorSpec, CompileError};
use crate::expr::{EvalError, Expression, FuncTable};
use crate::literal::{round_to, Literal};
use crate::record::Record;
use indexmap::IndexMap;

pub struct PrecisionSpec {
    name: String,
    arg: Expression,
}

pub fn make(name: &str, arg: &str) -> Result<Box<dyn AggregatorSpec>, CompileError> {
    let arg = Expression::parse(arg)?;
    Ok(Box::new(PrecisionSpec { name: name.to_string(), arg }))
}

impl AggregatorSpec for PrecisionSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_instance(&self, _funcs: &FuncTable) -> Box<dyn AggregatorInstance> {
        Box::new(PrecisionInstance { arg: self.arg.clone(), tp: 0, fp: 0 })
    }
}

struct PrecisionInstance {
    arg: Expression,
    tp: i64,
    fp: i64,
}

impl AggregatorInstance for PrecisionInstance {
    fn next_record(&mut self, record: &Record, rule_is_true: bool, funcs: &FuncTable) -> Result<(), EvalError> {
        let matched = self.arg.eval_bool(record, funcs)?;
        if rule_is_true {
            if matched {
                self.tp += 1;
            } else {
                self.fp += 1;
            }
        }
        Ok(())
    }

    fn result(&self, _peers: &IndexMap<String, Literal>, _num_records: i64, _goals: &[bool]) -> Literal {
        if self.tp == 0 && self.fp == 0 {
            return Literal::int(0);
        }
        let v = self.tp as f64 / (self.tp + self.fp) as f64;
        Literal::float(round_to(v, 4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(married: bool) -> Record {
        let mut r = Record::new();
        r.insert("marital", Literal::string(if married { "married" } else { "single" }));
        r
    }

    #[test]
    fn precision_is_tp_over_tp_plus_fp() {
        let spec = make("p", "marital == \"married\"").unwrap();
        let funcs = FuncTable::with_builtins();
        let mut inst = spec.new_instance(&funcs);
        for m in [true, true, true, false] {
            inst.next_record(&rec(m), true, &funcs).unwrap();
        }
        let peers = IndexMap::new();
        assert_eq!(inst.result(&peers, 4, &[]).to_display_string(), "0.75");
    }
}
