//! Experiment description and validation (spec §6), grounded on the
//! original `experiment.go`'s `Validate` pass, reshaped around the
//! aggregator/rule/assessment types built elsewhere in this crate.

use crate::aggregator::{make_spec, AggregatorSpec, CompileError};
use crate::assessment::Direction;
use crate::expr::{Expression, SyntaxError};
use crate::record::is_identifier;
use crate::source::RecordSource;
use std::fmt;

#[derive(Debug, Clone)]
pub struct AggregatorDesc {
    pub name: String,
    pub kind: String,
    pub arg: String,
}

#[derive(Debug, Clone)]
pub struct SortDesc {
    pub aggregator_name: String,
    pub direction: String,
}

const SYNTHETIC_SORT_NAMES: [&str; 4] = ["numMatches", "percentMatches", "numGoalsPassed", "goalsScore"];

/// A structured experiment description, consumed by the generator,
/// tweaker and assessor. `dataset` is the caller-owned record source; it
/// is never cloned here (the parallel driver clones per shard).
pub struct Experiment {
    pub title: String,
    pub dataset: Box<dyn RecordSource>,
    pub rule_fields: Vec<String>,
    pub exclude_fields: Vec<String>,
    pub aggregators: Vec<AggregatorDesc>,
    pub goals: Vec<String>,
    pub sort_order: Vec<SortDesc>,
}

#[derive(Debug)]
pub struct InvalidExperimentField {
    pub field: String,
    pub value: String,
    pub cause: String,
}

impl fmt::Display for InvalidExperimentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid experiment field {:?} (value {:?}): {}", self.field, self.value, self.cause)
    }
}
impl std::error::Error for InvalidExperimentField {}

impl From<CompileError> for InvalidExperimentField {
    fn from(e: CompileError) -> Self {
        InvalidExperimentField { field: "aggregators".to_string(), value: e.to_string(), cause: "failed to compile".to_string() }
    }
}
impl From<SyntaxError> for InvalidExperimentField {
    fn from(e: SyntaxError) -> Self {
        InvalidExperimentField { field: "goals".to_string(), value: e.to_string(), cause: "failed to parse".to_string() }
    }
}

impl Experiment {
    /// Validate structure (spec §6) without touching `dataset`.
    pub fn validate(&self) -> Result<(), InvalidExperimentField> {
        if self.rule_fields.len() < 2 {
            return Err(InvalidExperimentField {
                field: "rule_fields".to_string(),
                value: self.rule_fields.len().to_string(),
                cause: "must contain at least 2 fields".to_string(),
            });
        }
        for f in &self.rule_fields {
            if !is_identifier(f) {
                return Err(InvalidExperimentField { field: "rule_fields".to_string(), value: f.clone(), cause: "not a valid identifier".to_string() });
            }
        }
        for f in &self.exclude_fields {
            if !self.rule_fields.contains(f) {
                return Err(InvalidExperimentField { field: "exclude_fields".to_string(), value: f.clone(), cause: "must appear in rule_fields".to_string() });
            }
        }
        for agg in &self.aggregators {
            if !is_identifier(&agg.name) {
                return Err(InvalidExperimentField { field: "aggregators".to_string(), value: agg.name.clone(), cause: "name is not a valid identifier".to_string() });
            }
            if self.rule_fields.contains(&agg.name) {
                return Err(InvalidExperimentField { field: "aggregators".to_string(), value: agg.name.clone(), cause: "collides with a rule field".to_string() });
            }
        }
        let known_names: Vec<&str> = self.aggregators.iter().map(|a| a.name.as_str()).collect();
        for sort in &self.sort_order {
            let resolves = known_names.contains(&sort.aggregator_name.as_str()) || SYNTHETIC_SORT_NAMES.contains(&sort.aggregator_name.as_str());
            if !resolves {
                return Err(InvalidExperimentField {
                    field: "sort_order".to_string(),
                    value: sort.aggregator_name.clone(),
                    cause: "does not resolve to a known or synthetic aggregator".to_string(),
                });
            }
            if sort.direction != "ascending" && sort.direction != "descending" {
                return Err(InvalidExperimentField {
                    field: "sort_order".to_string(),
                    value: sort.direction.clone(),
                    cause: "direction must be \"ascending\" or \"descending\"".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Compile `aggregators` into aggregator specs.
    pub fn compile_aggregators(&self) -> Result<Vec<Box<dyn AggregatorSpec>>, InvalidExperimentField> {
        self.aggregators
            .iter()
            .map(|a| make_spec(&a.kind, &a.name, &a.arg).map_err(InvalidExperimentField::from))
            .collect()
    }

    /// Parse `goals` into evaluable expressions.
    pub fn compile_goals(&self) -> Result<Vec<Expression>, InvalidExperimentField> {
        self.goals.iter().map(|g| Expression::parse(g).map_err(InvalidExperimentField::from)).collect()
    }

    /// `sort_order` as typed `SortKey`s, for `Assessment::sort`.
    pub fn sort_keys(&self) -> Vec<crate::assessment::SortKey> {
        self.sort_order
            .iter()
            .map(|s| crate::assessment::SortKey {
                aggregator_name: s.aggregator_name.clone(),
                direction: if s.direction == "descending" { Direction::Descending } else { Direction::Ascending },
            })
            .collect()
    }

    /// Rule-eligible field names: `rule_fields` minus `exclude_fields`.
    pub fn eligible_rule_fields(&self) -> Vec<String> {
        self.rule_fields.iter().filter(|f| !self.exclude_fields.contains(f)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::VecRecordSource;

    fn base_experiment() -> Experiment {
        Experiment {
            title: "test".to_string(),
            dataset: Box::new(VecRecordSource::new(vec![])),
            rule_fields: vec!["income".to_string(), "cost".to_string()],
            exclude_fields: vec![],
            aggregators: vec![AggregatorDesc { name: "profit".to_string(), kind: "sum".to_string(), arg: "income - cost".to_string() }],
            goals: vec![],
            sort_order: vec![],
        }
    }

    #[test]
    fn valid_experiment_passes() {
        assert!(base_experiment().validate().is_ok());
    }

    #[test]
    fn too_few_rule_fields_is_invalid() {
        let mut e = base_experiment();
        e.rule_fields = vec!["income".to_string()];
        let err = e.validate().unwrap_err();
        assert_eq!(err.field, "rule_fields");
    }

    #[test]
    fn aggregator_name_colliding_with_rule_field_is_invalid() {
        let mut e = base_experiment();
        e.aggregators[0].name = "income".to_string();
        let err = e.validate().unwrap_err();
        assert_eq!(err.field, "aggregators");
    }

    #[test]
    fn sort_order_accepts_synthetic_names() {
        let mut e = base_experiment();
        e.sort_order.push(SortDesc { aggregator_name: "numMatches".to_string(), direction: "descending".to_string() });
        assert!(e.validate().is_ok());
    }

    #[test]
    fn sort_order_rejects_unknown_aggregator() {
        let mut e = base_experiment();
        e.sort_order.push(SortDesc { aggregator_name: "bogus".to_string(), direction: "ascending".to_string() });
        let err = e.validate().unwrap_err();
        assert_eq!(err.field, "sort_order");
    }

    #[test]
    fn sort_order_rejects_bad_direction() {
        let mut e = base_experiment();
        e.sort_order.push(SortDesc { aggregator_name: "profit".to_string(), direction: "sideways".to_string() });
        let err = e.validate().unwrap_err();
        assert_eq!(err.cause, "direction must be \"ascending\" or \"descending\"");
    }

    #[test]
    fn exclude_field_not_in_rule_fields_is_invalid() {
        let mut e = base_experiment();
        e.exclude_fields.push("other".to_string());
        let err = e.validate().unwrap_err();
        assert_eq!(err.field, "exclude_fields");
    }
}
