//! `count`: increments when the rule held and the arg expression is true
//! for the record.

use super::{AggregatorInstance, AggregatorSpec, CompileError};
use crate::expr::{EvalError, Expression, FuncTable};
use crate::literal::Literal;
use crate::record::Record;
use indexmap::IndexMap;

pub struct CountSpec {
    name: String,
    arg: Expression,
}

pub fn make(name: &str, arg: &str) -> Result<Box<dyn AggregatorSpec>, CompileError> {
    let arg = Expression::parse(arg)?;
    Ok(Box::new(CountSpec { name: name.to_string(), arg }))
}

impl AggregatorSpec for CountSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_instance(&self, _funcs: &FuncTable) -> Box<dyn AggregatorInstance> {
        Box::new(CountInstance { arg: self.arg.clone(), n: 0 })
    }
}

struct CountInstance {
    arg: Expression,
    n: i64,
}

impl AggregatorInstance for CountInstance {
    fn next_record(&mut self, record: &Record, rule_is_true: bool, funcs: &FuncTable) -> Result<(), EvalError> {
        if rule_is_true && self.arg.eval_bool(record, funcs)? {
            self.n += 1;
        }
        Ok(())
    }

    fn result(&self, _peers: &IndexMap<String, Literal>, _num_records: i64, _goals: &[bool]) -> Literal {
        Literal::int(self.n)
    }
}
