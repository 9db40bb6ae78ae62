//! Assessment operations (spec §4.8): sort, refine, merge, truncate over
//! the output of the rule assessor.
//!
//! Grounded on the teacher's `executor::plan_executor` result-shaping pass
//! (its `ORDER BY`/`LIMIT` post-processing over a materialised row set),
//! generalised from SQL row ordering to multi-key numeric sort over
//! per-rule aggregator results.

pub mod assessor;

use crate::literal::Literal;
use crate::rule::Rule;
use indexmap::IndexMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone)]
pub struct SortKey {
    pub aggregator_name: String,
    pub direction: Direction,
}

#[derive(Debug, Clone)]
pub struct RuleAssessment {
    pub rule: Rule,
    pub aggregator_results: IndexMap<String, Literal>,
    pub goal_outcomes: Vec<bool>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    sorted: bool,
    refined: bool,
}

#[derive(Debug)]
pub struct MergeMismatchError {
    pub left_num_records: i64,
    pub right_num_records: i64,
}

impl fmt::Display for MergeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot merge assessments with differing num_records: {} vs {}", self.left_num_records, self.right_num_records)
    }
}
impl std::error::Error for MergeMismatchError {}

#[derive(Debug, Clone)]
pub struct Assessment {
    pub num_records: i64,
    pub rule_assessments: Vec<RuleAssessment>,
    flags: Flags,
}

impl Assessment {
    pub fn new(num_records: i64, rule_assessments: Vec<RuleAssessment>) -> Self {
        Assessment { num_records, rule_assessments, flags: Flags::default() }
    }

    pub fn is_sorted(&self) -> bool {
        self.flags.sorted
    }

    pub fn is_refined(&self) -> bool {
        self.flags.refined
    }

    fn key_value(result: &Literal, aggregator_name: &str) -> f64 {
        result.as_float().unwrap_or_else(|| {
            panic!("sort key \"{aggregator_name}\" is not a numeric aggregator result")
        })
    }

    /// Stable multi-key sort. Ties break on canonical-string length
    /// (shorter first).
    pub fn sort(&mut self, order: &[SortKey]) {
        self.rule_assessments.sort_by(|a, b| {
            for key in order {
                let va = a.aggregator_results.get(&key.aggregator_name);
                let vb = b.aggregator_results.get(&key.aggregator_name);
                let (va, vb) = match (va, vb) {
                    (Some(x), Some(y)) => (x, y),
                    _ => panic!("sort key \"{}\" missing from aggregator results", key.aggregator_name),
                };
                let fa = Self::key_value(va, &key.aggregator_name);
                let fb = Self::key_value(vb, &key.aggregator_name);
                let ord = fa.partial_cmp(&fb).unwrap_or(std::cmp::Ordering::Equal);
                let ord = match key.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                };
                if ord != std::cmp::Ordering::Equal {
                    return ord;
                }
            }
            a.rule.to_string().len().cmp(&b.rule.to_string().len())
        });
        self.flags.sorted = true;
    }

    fn num_matches(ra: &RuleAssessment) -> i64 {
        ra.aggregator_results.get("numMatches").and_then(|l| l.as_int()).unwrap_or(0)
    }

    /// Three-pass pruning (spec §4.8). Requires a prior `sort`.
    pub fn refine(&mut self, n: usize) {
        assert!(self.flags.sorted, "refine requires a sorted assessment");

        // Pass 1: drop everything at or below true() unless numMatches > 1.
        let mut kept = Vec::with_capacity(self.rule_assessments.len());
        for ra in self.rule_assessments.drain(..) {
            let is_true_rule = ra.rule == Rule::True;
            let keep = Self::num_matches(&ra) > 1 || is_true_rule;
            if !keep {
                continue;
            }
            let stop_after = is_true_rule;
            kept.push(ra);
            if stop_after {
                break;
            }
        }
        self.rule_assessments = kept;

        // Pass 2: cap InFV rules per field (and its negated form) at n.
        let mut in_fv_counts: IndexMap<String, usize> = IndexMap::new();
        self.rule_assessments.retain(|ra| {
            if let Some((field, _)) = ra.rule.in_fv_field() {
                let count = in_fv_counts.entry(field.to_string()).or_insert(0);
                *count += 1;
                *count <= n
            } else {
                true
            }
        });

        // Pass 3: cap tweakable rules per (field, operator) family at n.
        let mut family_counts: IndexMap<String, usize> = IndexMap::new();
        self.rule_assessments.retain(|ra| {
            if let Some(key) = ra.rule.family_key() {
                let count = family_counts.entry(key).or_insert(0);
                *count += 1;
                *count <= n
            } else {
                true
            }
        });

        self.flags.refined = true;
    }

    pub fn merge(&mut self, mut other: Assessment) -> Result<(), MergeMismatchError> {
        if self.num_records != other.num_records {
            return Err(MergeMismatchError { left_num_records: self.num_records, right_num_records: other.num_records });
        }
        self.rule_assessments.append(&mut other.rule_assessments);
        self.flags = Flags::default();
        Ok(())
    }

    pub fn truncate(&mut self, k: usize) {
        self.rule_assessments.truncate(k);
    }
}
