//! `calc`: a stateless aggregator whose value is an expression over every
//! other aggregator's already-computed result plus `numRecords`. Captures
//! the experiment's function table at construction so it can evaluate that
//! expression at finalisation, once every peer is in hand.

use super::{AggregatorInstance, AggregatorSpec, Category, CompileError};
use crate::expr::{EvalError, Expression, FuncTable};
use crate::literal::Literal;
use crate::record::Record;
use indexmap::IndexMap;

pub struct CalcSpec {
    name: String,
    arg: Expression,
}

pub fn make(name: &str, arg: &str) -> Result<Box<dyn AggregatorSpec>, CompileError> {
    let arg = Expression::parse(arg)?;
    Ok(Box::new(CalcSpec { name: name.to_string(), arg }))
}

impl AggregatorSpec for CalcSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_instance(&self, funcs: &FuncTable) -> Box<dyn AggregatorInstance> {
        Box::new(CalcInstance { arg: self.arg.clone(), funcs: funcs.clone() })
    }
}

struct CalcInstance {
    arg: Expression,
    funcs: FuncTable,
}

impl AggregatorInstance for CalcInstance {
    fn next_record(&mut self, _record: &Record, _rule_is_true: bool, _funcs: &FuncTable) -> Result<(), EvalError> {
        Ok(())
    }

    fn result(&self, peers: &IndexMap<String, Literal>, num_records: i64, _goals: &[bool]) -> Literal {
        let mut binding = Record::new();
        for (name, value) in peers {
            binding.insert(name, value.clone());
        }
        binding.insert("numRecords", Literal::int(num_records));
        self.arg.eval(&binding, &self.funcs)
    }

    fn category(&self) -> Category {
        Category::Calc
    }
}
