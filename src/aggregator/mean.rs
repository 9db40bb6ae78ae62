//! `mean`: running average of a numeric arg expression over matching
//! records.

use super::{AggregatorInstance, AggregatorSpec, CompileError};
use crate::expr::{EvalError, Expression, FuncTable};
use crate::literal::{add_numeric, Literal};
use crate::record::Record;
use indexmap::IndexMap;

pub struct MeanSpec {
    name: String,
    arg: Expression,
}

pub fn make(name: &str, arg: &str) -> Result<Box<dyn AggregatorSpec>, CompileError> {
    let arg = Expression::parse(arg)?;
    Ok(Box::new(MeanSpec { name: name.to_string(), arg }))
}

impl AggregatorSpec for MeanSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_instance(&self, _funcs: &FuncTable) -> Box<dyn AggregatorInstance> {
        Box::new(MeanInstance { arg: self.arg.clone(), sum: Literal::int(0), k: 0 })
    }
}

struct MeanInstance {
    arg: Expression,
    sum: Literal,
    k: i64,
}

impl AggregatorInstance for MeanInstance {
    fn next_record(&mut self, record: &Record, rule_is_true: bool, funcs: &FuncTable) -> Result<(), EvalError> {
        if !rule_is_true {
            return Ok(());
        }
        let v = self.arg.eval_checked(record, funcs)?;
        if v.as_float().is_none() {
            return Err(EvalError::IncompatibleTypes { op: "mean: value isn't numeric".to_string() });
        }
        self.k += 1;
        self.sum = add_numeric(&self.sum, &v);
        Ok(())
    }

    fn result(&self, _peers: &IndexMap<String, Literal>, _num_records: i64, _goals: &[bool]) -> Literal {
        if self.k == 0 {
            return Literal::int(0);
        }
        Literal::float(self.sum.as_float().unwrap_or(0.0) / self.k as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(x: f64) -> Record {
        let mut r = Record::new();
        r.insert("x", Literal::float(x));
        r
    }

    #[test]
    fn mean_of_matching_records() {
        let spec = make("m", "x").unwrap();
        let funcs = FuncTable::with_builtins();
        let mut inst = spec.new_instance(&funcs);
        for v in [1.0, 2.0, 3.0] {
            inst.next_record(&rec(v), true, &funcs).unwrap();
        }
        let peers = IndexMap::new();
        assert_eq!(inst.result(&peers, 3, &[]).as_float(), Some(2.0));
    }

    #[test]
    fn mean_of_zero_records_is_zero() {
        let spec = make("m", "x").unwrap();
        let funcs = FuncTable::with_builtins();
        let inst = spec.new_instance(&funcs);
        let peers = IndexMap::new();
        assert_eq!(inst.result(&peers, 0, &[]).as_int(), Some(0));
    }
}
