//! A rule-induction engine: given a tabular record source and an
//! experiment description, infers a field schema (the describer),
//! generates candidate boolean rules, assesses them against the dataset,
//! and refines the resulting assessment down to the rules worth a
//! closer look.
//!
//! Reshaped from an in-memory SQL-like query engine into a single-purpose
//! statistical tool: the dynamic value type, expression parser/evaluator
//! and record model carry over in spirit (see each module's header for its
//! concrete grounding), but the top-level pipeline here is describe ->
//! generate -> assess -> refine, not parse-plan-execute.

pub mod aggregator;
pub mod assessment;
pub mod describer;
pub mod driver;
pub mod experiment;
pub mod expr;
pub mod literal;
pub mod record;
pub mod rule;
pub mod source;

pub use assessment::{Assessment, RuleAssessment};
pub use describer::Description;
pub use experiment::{Experiment, InvalidExperimentField};
pub use expr::{EvalError, Expression, FuncTable, SyntaxError};
pub use literal::Literal;
pub use record::Record;
pub use rule::{Rule, RuleError};
pub use source::{IoError, RecordSource, VecRecordSource};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::AggregatorDesc;

    fn rec(income: i64, cost: f64, level: &str) -> Record {
        let mut r = Record::new();
        r.insert("income", Literal::int(income));
        r.insert("cost", Literal::float(cost));
        r.insert("level", Literal::string(level));
        r
    }

    /// Exercises the full describe -> generate -> assess -> sort -> refine
    /// pipeline end to end over a tiny in-memory dataset.
    #[test]
    fn full_pipeline_smoke_test() {
        let records = vec![
            rec(3, 4.5, "low"),
            rec(3, 3.2, "low"),
            rec(2, 1.2, "mid"),
            rec(9, 2.0, "high"),
        ];
        let mut source = VecRecordSource::new(records);

        eprintln!("STEP describe");
        let description = Description::describe(&mut source).unwrap();
        assert!(description.fields.contains_key("income"));

        eprintln!("STEP generate");
        let rule_fields = vec!["income".to_string(), "cost".to_string()];
        let rules = rule::generator::generate(&description, &rule_fields, 5);
        eprintln!("STEP generate done, {} rules", rules.len());
        assert!(rules.contains(&Rule::True));
        assert!(rules.len() > 1);

        let funcs = FuncTable::with_builtins();
        let specs = vec![aggregator::make_spec("sum", "profit", "income - cost").unwrap()];
        let goals = vec![Expression::parse("profit >= 0").unwrap()];

        let mut source = VecRecordSource::new(vec![
            rec(3, 4.5, "low"),
            rec(3, 3.2, "low"),
            rec(2, 1.2, "mid"),
            rec(9, 2.0, "high"),
        ]);
        eprintln!("STEP assess");
        let mut assessment = assessment::assessor::assess(&rules, &specs, &goals, &funcs, &mut source).unwrap();
        eprintln!("STEP assess done");
        assert_eq!(assessment.num_records, 4);
        assert!(!assessment.rule_assessments.is_empty());

        eprintln!("STEP sort");
        let order = vec![assessment::SortKey { aggregator_name: "numMatches".to_string(), direction: assessment::Direction::Descending }];
        assessment.sort(&order);
        eprintln!("STEP sort done");
        assert!(assessment.is_sorted());
        eprintln!("STEP refine");
        assessment.refine(3);
        eprintln!("STEP refine done");
        assert!(assessment.is_refined());

        for ra in &assessment.rule_assessments {
            assert!(ra.aggregator_results["numMatches"].as_int().unwrap() >= 1);
        }
    }

    #[test]
    fn validated_experiment_drives_the_same_pipeline() {
        let records = vec![rec(3, 4.5, "low"), rec(3, 3.2, "low"), rec(2, 1.2, "mid"), rec(9, 2.0, "high")];
        let experiment = Experiment {
            title: "profitability".to_string(),
            dataset: Box::new(VecRecordSource::new(records)),
            rule_fields: vec!["income".to_string(), "cost".to_string()],
            exclude_fields: vec![],
            aggregators: vec![AggregatorDesc { name: "profit".to_string(), kind: "sum".to_string(), arg: "income - cost".to_string() }],
            goals: vec!["profit >= 0".to_string()],
            sort_order: vec![],
        };
        experiment.validate().unwrap();
        let specs = experiment.compile_aggregators().unwrap();
        let goals = experiment.compile_goals().unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(goals.len(), 1);
    }
}
