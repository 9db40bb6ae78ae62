//! `goalsPassedScore`: rewards rules that pass more goals, with passed goals
//! weighted far above failed ones so score is dominated by pass count and
//! only tie-broken by how close the failures came.
//!
//! Score = 1.0 per passed goal + 0.001 per failed goal.

use super::{AggregatorInstance, AggregatorSpec, Category, CompileError};
use crate::expr::{EvalError, FuncTable};
use crate::literal::Literal;
use crate::record::Record;
use indexmap::IndexMap;

pub struct GoalsPassedScoreSpec {
    name: String,
}

/// `arg` is unused; the kind takes its input from the goals list handed to
/// `result`, not from a per-record expression.
pub fn make(name: &str, _arg: &str) -> Result<Box<dyn AggregatorSpec>, CompileError> {
    Ok(Box::new(GoalsPassedScoreSpec { name: name.to_string() }))
}

impl AggregatorSpec for GoalsPassedScoreSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_instance(&self, _funcs: &FuncTable) -> Box<dyn AggregatorInstance> {
        Box::new(GoalsPassedScoreInstance)
    }
}

struct GoalsPassedScoreInstance;

impl AggregatorInstance for GoalsPassedScoreInstance {
    fn next_record(&mut self, _record: &Record, _rule_is_true: bool, _funcs: &FuncTable) -> Result<(), EvalError> {
        Ok(())
    }

    fn result(&self, _peers: &IndexMap<String, Literal>, _num_records: i64, goals: &[bool]) -> Literal {
        let score: f64 = goals.iter().map(|&passed| if passed { 1.0 } else { 0.001 }).sum();
        Literal::float(score)
    }

    fn category(&self) -> Category {
        Category::GoalsPassedScore
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_rewards_passed_goals_far_more_than_failed() {
        let spec = make("s", "").unwrap();
        let funcs = FuncTable::with_builtins();
        let inst = spec.new_instance(&funcs);
        let peers = IndexMap::new();
        let score = inst.result(&peers, 0, &[true, true, false]).as_float().unwrap();
        assert!((score - 2.001).abs() < 1e-9);
    }

    #[test]
    fn more_passed_goals_always_outscores_fewer() {
        let spec = make("s", "").unwrap();
        let funcs = FuncTable::with_builtins();
        let inst = spec.new_instance(&funcs);
        let peers = IndexMap::new();
        let one_pass = inst.result(&peers, 0, &[true, false, false, false]).as_float().unwrap();
        let two_pass_many_fail = inst.result(&peers, 0, &[true, true, false, false, false, false, false, false, false, false]).as_float().unwrap();
        assert!(two_pass_many_fail > one_pass);
    }
}
