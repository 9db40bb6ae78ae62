//! `sum`: running total of the arg expression over matching records.

use super::{AggregatorInstance, AggregatorSpec, CompileError};
use crate::expr::{EvalError, Expression, FuncTable};
use crate::literal::{add_numeric, Literal};
use crate::record::Record;
use indexmap::IndexMap;

pub struct SumSpec {
    name: String,
    arg: Expression,
}

pub fn make(name: &str, arg: &str) -> Result<Box<dyn AggregatorSpec>, CompileError> {
    let arg = Expression::parse(arg)?;
    Ok(Box::new(SumSpec { name: name.to_string(), arg }))
}

impl AggregatorSpec for SumSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_instance(&self, _funcs: &FuncTable) -> Box<dyn AggregatorInstance> {
        Box::new(SumInstance { arg: self.arg.clone(), sum: None })
    }
}

struct SumInstance {
    arg: Expression,
    sum: Option<Literal>,
}

impl AggregatorInstance for SumInstance {
    fn next_record(&mut self, record: &Record, rule_is_true: bool, funcs: &FuncTable) -> Result<(), EvalError> {
        if !rule_is_true {
            return Ok(());
        }
        let v = self.arg.eval_checked(record, funcs)?;
        self.sum = Some(match &self.sum {
            Some(s) => add_numeric(s, &v),
            None => v,
        });
        Ok(())
    }

    fn result(&self, _peers: &IndexMap<String, Literal>, _num_records: i64, _goals: &[bool]) -> Literal {
        self.sum.clone().unwrap_or_else(|| Literal::int(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal as Lit;

    fn rec(income: i64, cost: f64) -> Record {
        let mut r = Record::new();
        r.insert("income", Lit::int(income));
        r.insert("cost", Lit::float(cost));
        r
    }

    #[test]
    fn sum_skips_excluded_record() {
        let spec = make("profit", "income - cost").unwrap();
        let funcs = FuncTable::with_builtins();
        let mut inst = spec.new_instance(&funcs);
        let rows = [(3, 4.5, true), (3, 3.2, true), (2, 1.2, false), (9, 2.0, true)];
        for (income, cost, is_true) in rows {
            inst.next_record(&rec(income, cost), is_true, &funcs).unwrap();
        }
        let peers = IndexMap::new();
        let result = inst.result(&peers, 4, &[]);
        assert!((result.as_float().unwrap() - 5.3).abs() < 1e-9);
    }
}
