//! The single-threaded rule assessor (spec §4.7), grounded on
//! `rulesassessor.go`'s `AssessRules`: it prepends a `numMatches` count
//! aggregator and a `percentMatches` calc aggregator, and appends a
//! `numGoalsPassed` `goalsPassedScore` aggregator, exactly as the original
//! does (`internal.NewCountAggregator("numMatches", "1==1")`,
//! `internal.NewCalcAggregator("percentMatches", "roundto(100.0 *
//! numMatches / numRecords, 2)")`).

use super::{Assessment, RuleAssessment};
use crate::aggregator::{make_spec, AggregatorInstance, AggregatorSpec, Category, CompileError};
use crate::expr::{Expression, FuncTable};
use crate::literal::Literal;
use crate::record::Record;
use crate::rule::Rule;
use crate::source::{IoError, RecordSource};
use indexmap::IndexMap;
use std::fmt;

#[derive(Debug)]
pub enum AssessError {
    Io(IoError),
    Compile(CompileError),
}

impl fmt::Display for AssessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessError::Io(e) => write!(f, "{e}"),
            AssessError::Compile(e) => write!(f, "{e}"),
        }
    }
}
impl std::error::Error for AssessError {}

impl From<IoError> for AssessError {
    fn from(e: IoError) -> Self {
        AssessError::Io(e)
    }
}
impl From<CompileError> for AssessError {
    fn from(e: CompileError) -> Self {
        AssessError::Compile(e)
    }
}

struct RuleState {
    instances: Vec<Box<dyn AggregatorInstance>>,
    bad: bool,
}

fn build_synthetic_specs() -> Result<Vec<Box<dyn AggregatorSpec>>, CompileError> {
    let synthetic_head = vec![
        make_spec("count", "numMatches", "1 == 1")?,
        make_spec("calc", "percentMatches", "roundto(100.0 * numMatches / numRecords, 2)")?,
    ];
    let synthetic_tail = make_spec("goalsPassedScore", "numGoalsPassed", "")?;
    let mut owned = synthetic_head;
    owned.push(synthetic_tail);
    Ok(owned)
}

fn build_effective_specs<'a>(
    owned: &'a [Box<dyn AggregatorSpec>],
    user_specs: &'a [Box<dyn AggregatorSpec>],
) -> Vec<&'a dyn AggregatorSpec> {
    // Borrowed view in call order: head, user specs, tail.
    let mut ordered: Vec<&dyn AggregatorSpec> = vec![owned[0].as_ref(), owned[1].as_ref()];
    ordered.extend(user_specs.iter().map(|s| s.as_ref()));
    ordered.push(owned[2].as_ref());
    ordered
}

/// Assess `rules` against `source`, with `user_specs` sandwiched between
/// the synthetic `numMatches`/`percentMatches` and `numGoalsPassed`
/// aggregators, and `goals` evaluated against each rule's finished
/// aggregator results.
pub fn assess(
    rules: &[Rule],
    user_specs: &[Box<dyn AggregatorSpec>],
    goals: &[Expression],
    funcs: &FuncTable,
    source: &mut dyn RecordSource,
) -> Result<Assessment, AssessError> {
    tracing::debug!(rules = rules.len(), aggregators = user_specs.len(), goals = goals.len(), "assessment pass starting");
    let _owned_synthetic = build_synthetic_specs()?;
    let specs = build_effective_specs(&_owned_synthetic, user_specs);

    let mut states: Vec<RuleState> = rules
        .iter()
        .map(|_| RuleState { instances: specs.iter().map(|s| s.new_instance(funcs)).collect(), bad: false })
        .collect();

    source.rewind()?;
    let mut num_records: i64 = 0;
    while source.next() {
        let record = source.read()?;
        num_records += 1;
        for (rule, state) in rules.iter().zip(states.iter_mut()) {
            if state.bad {
                continue;
            }
            let is_true = match rule.is_true(&record) {
                Ok(v) => v,
                Err(_) => {
                    state.bad = true;
                    continue;
                }
            };
            for inst in state.instances.iter_mut() {
                if inst.next_record(&record, is_true, funcs).is_err() {
                    state.bad = true;
                    break;
                }
            }
        }
    }

    let mut rule_assessments = Vec::new();
    for (rule, state) in rules.iter().zip(states.into_iter()) {
        if state.bad {
            continue;
        }
        let mut peers: IndexMap<String, Literal> = IndexMap::new();
        for (spec, inst) in specs.iter().zip(state.instances.iter()) {
            if inst.category() == Category::Plain {
                peers.insert(spec.name().to_string(), inst.result(&peers, num_records, &[]));
            }
        }
        for (spec, inst) in specs.iter().zip(state.instances.iter()) {
            if inst.category() == Category::Calc {
                let v = inst.result(&peers, num_records, &[]);
                peers.insert(spec.name().to_string(), v);
            }
        }

        let mut binding = Record::new();
        for (name, value) in &peers {
            binding.insert(name, value.clone());
        }
        binding.insert("numRecords", Literal::int(num_records));
        let goal_outcomes: Vec<bool> = goals.iter().map(|g| g.eval_bool(&binding, funcs).unwrap_or(false)).collect();

        for (spec, inst) in specs.iter().zip(state.instances.iter()) {
            if inst.category() == Category::GoalsPassedScore {
                let v = inst.result(&peers, num_records, &goal_outcomes);
                peers.insert(spec.name().to_string(), v);
            }
        }

        let num_matches = peers.get("numMatches").and_then(|l| l.as_int()).unwrap_or(0);
        if num_matches > 0 {
            rule_assessments.push(RuleAssessment { rule: rule.clone(), aggregator_results: peers, goal_outcomes });
        }
    }

    tracing::debug!(num_records, kept = rule_assessments.len(), "assessment pass complete");
    Ok(Assessment::new(num_records, rule_assessments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;
    use crate::source::VecRecordSource;

    fn rec(income: i64, cost: f64) -> Record {
        let mut r = Record::new();
        r.insert("income", Literal::int(income));
        r.insert("cost", Literal::float(cost));
        r
    }

    #[test]
    fn assesses_and_filters_zero_match_rules() {
        let rules = vec![Rule::GeFV("income".to_string(), 5.0), Rule::GeFV("income".to_string(), 1000.0)];
        let mut src = VecRecordSource::new(vec![rec(3, 1.0), rec(6, 2.0), rec(9, 3.0)]);
        let funcs = FuncTable::with_builtins();
        let assessment = assess(&rules, &[], &[], &funcs, &mut src).unwrap();
        assert_eq!(assessment.num_records, 3);
        assert_eq!(assessment.rule_assessments.len(), 1);
        let ra = &assessment.rule_assessments[0];
        assert_eq!(ra.rule.to_string(), "income >= 5");
        assert_eq!(ra.aggregator_results["numMatches"].as_int(), Some(2));
        assert_eq!(ra.aggregator_results["percentMatches"].as_float(), Some(66.67));
    }

    #[test]
    fn bad_rule_is_excluded_not_fatal() {
        let rules = vec![Rule::GeFV("missing".to_string(), 1.0), Rule::True];
        let mut src = VecRecordSource::new(vec![rec(3, 1.0)]);
        let funcs = FuncTable::with_builtins();
        let assessment = assess(&rules, &[], &[], &funcs, &mut src).unwrap();
        assert_eq!(assessment.rule_assessments.len(), 1);
        assert_eq!(assessment.rule_assessments[0].rule, Rule::True);
    }

    #[test]
    fn user_aggregator_and_goal_are_evaluated() {
        let rules = vec![Rule::True];
        let mut src = VecRecordSource::new(vec![rec(3, 1.0), rec(6, 2.0)]);
        let funcs = FuncTable::with_builtins();
        let specs = vec![crate::aggregator::make_spec("sum", "profit", "income - cost").unwrap()];
        let goals = vec![Expression::parse("profit >= 5").unwrap()];
        let assessment = assess(&rules, &specs, &goals, &funcs, &mut src).unwrap();
        let ra = &assessment.rule_assessments[0];
        assert_eq!(ra.aggregator_results["profit"].as_float(), Some(6.0));
        assert_eq!(ra.goal_outcomes, vec![true]);
        assert_eq!(ra.aggregator_results["numGoalsPassed"].as_float(), Some(1.0));
    }
}
