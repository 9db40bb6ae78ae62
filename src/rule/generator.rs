//! Rule generator (spec §4.5), grounded on the original `rulegenerator.go`
//! pipeline (`generateCompareNumericRules`, `generateCompareStringRules`,
//! `generateInNiRules`, single-field value/breakpoint rules) reshaped
//! around the unified [`Rule`](super::Rule) taxonomy.

use super::Rule;
use crate::describer::{Description, FieldDescription, FieldKind};
use crate::literal::round_to;

const MAX_NUM_RULES: usize = 200_000;

struct Generated {
    rules: Vec<Rule>,
}

impl Generated {
    fn push(&mut self, rule: Rule) {
        if self.rules.len() >= MAX_NUM_RULES {
            return;
        }
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
    }
}

fn numeric_range(fd: &FieldDescription) -> Option<(f64, f64)> {
    if fd.kind != FieldKind::Number {
        return None;
    }
    Some((fd.min.as_ref()?.as_float()?, fd.max.as_ref()?.as_float()?))
}

fn breakpoints(lo: f64, hi: f64, dp: usize) -> Vec<f64> {
    if hi <= lo {
        return Vec::new();
    }
    let mut seen = Vec::new();
    for k in 1..=19 {
        let raw = lo + (k as f64) * (hi - lo) / 20.0;
        let rounded = round_to(raw, dp as u32);
        if !seen.contains(&rounded) {
            seen.push(rounded);
        }
    }
    seen
}

fn extra_for_complexity(complexity: u32, num_rule_fields: usize) -> usize {
    let mut extra = match complexity {
        7 | 8 => 2,
        9..=10 => 4,
        _ => 0,
    };
    if num_rule_fields == 2 {
        extra += 2;
    }
    extra
}

fn generate_compare_numeric(description: &Description, field: &str, other: &str, out: &mut Generated) {
    let (fd, od) = match (description.fields.get(field), description.fields.get(other)) {
        (Some(a), Some(b)) => (a, b),
        _ => return,
    };
    let (lo1, hi1) = match numeric_range(fd) {
        Some(r) => r,
        None => return,
    };
    let (lo2, hi2) = match numeric_range(od) {
        Some(r) => r,
        None => return,
    };
    if !(lo1 < hi2 && hi1 > lo2) {
        return;
    }
    out.push(Rule::GtFF(field.to_string(), other.to_string()));
    out.push(Rule::LtFF(field.to_string(), other.to_string()));
    out.push(Rule::EqFF(field.to_string(), other.to_string()));
    out.push(Rule::NeFF(field.to_string(), other.to_string()));
    out.push(Rule::GeFF(field.to_string(), other.to_string()));
    out.push(Rule::LeFF(field.to_string(), other.to_string()));
}

fn generate_compare_string(description: &Description, field: &str, other: &str, out: &mut Generated) {
    let (fd, od) = match (description.fields.get(field), description.fields.get(other)) {
        (Some(a), Some(b)) => (a, b),
        _ => return,
    };
    if fd.kind != FieldKind::String || od.kind != FieldKind::String {
        return;
    }
    let shared = fd.values.keys().filter(|k| od.values.contains_key(*k)).count();
    if shared < 2 {
        return;
    }
    out.push(Rule::EqFF(field.to_string(), other.to_string()));
    out.push(Rule::NeFF(field.to_string(), other.to_string()));
}

fn generate_in_rules(fd: &FieldDescription, field: &str, complexity: u32, num_rule_fields: usize, out: &mut Generated) {
    let extra = extra_for_complexity(complexity, num_rule_fields);
    let n = fd.values.len();
    if !(4..=12 + extra).contains(&n) {
        return;
    }
    let max_size = (5 + extra).min(n.saturating_sub(2));
    if max_size < 2 {
        return;
    }
    let mut keys: Vec<&String> = fd.values.keys().collect();
    keys.sort();

    for mask in 3u32..(1u32 << n) {
        let size = mask.count_ones() as usize;
        if size < 2 || size > max_size || size == n {
            continue;
        }
        let mut selected = Vec::with_capacity(size);
        let mut ok = true;
        for (i, key) in keys.iter().enumerate() {
            if mask & (1 << i) != 0 {
                let vc = &fd.values[*key];
                if vc.count < 2 {
                    ok = false;
                    break;
                }
                selected.push((*key).clone());
            }
        }
        if ok {
            out.push(Rule::InFV(field.to_string(), selected));
        }
    }
}

fn generate_single_field(fd: &FieldDescription, field: &str, out: &mut Generated) {
    for (key, vc) in &fd.values {
        if vc.count < 2 {
            continue;
        }
        out.push(Rule::EqFV(field.to_string(), vc.literal.clone()));
        out.push(Rule::NeFV(field.to_string(), vc.literal.clone()));
        let _ = key;
    }
    if let Some((lo, hi)) = numeric_range(fd) {
        for bp in breakpoints(lo, hi, fd.max_dp) {
            out.push(Rule::GeFV(field.to_string(), bp));
            out.push(Rule::LeFV(field.to_string(), bp));
        }
    }
}

fn generate_pair_arithmetic(description: &Description, a: &str, b: &str, out: &mut Generated) {
    let (fd, od) = match (description.fields.get(a), description.fields.get(b)) {
        (Some(x), Some(y)) => (x, y),
        _ => return,
    };
    let (alo, ahi) = match numeric_range(fd) {
        Some(r) => r,
        None => return,
    };
    let (blo, bhi) = match numeric_range(od) {
        Some(r) => r,
        None => return,
    };
    if !(alo < bhi && ahi > blo) {
        return;
    }
    let dp = fd.max_dp.max(od.max_dp);

    for bp in breakpoints(alo + blo, ahi + bhi, dp) {
        out.push(Rule::AddGEF(a.to_string(), b.to_string(), bp));
        out.push(Rule::AddLEF(a.to_string(), b.to_string(), bp));
    }
    let products = [alo * blo, alo * bhi, ahi * blo, ahi * bhi];
    let plo = products.iter().cloned().fold(f64::INFINITY, f64::min);
    let phi = products.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    for bp in breakpoints(plo, phi, dp) {
        out.push(Rule::MulGEF(a.to_string(), b.to_string(), bp));
        out.push(Rule::MulLEF(a.to_string(), b.to_string(), bp));
    }
}

/// Generate the deduplicated, canonically-sorted rule set for `rule_fields`
/// against `description` (spec §4.5).
pub fn generate(description: &Description, rule_fields: &[String], complexity: u32) -> Vec<Rule> {
    let mut generated_rules = Generated { rules: Vec::new() };
    generated_rules.push(Rule::True);

    for field in rule_fields {
        let fd = match description.fields.get(field) {
            Some(fd) => fd,
            None => continue,
        };
        for other in rule_fields {
            if other == field {
                continue;
            }
            generate_compare_numeric(description, field, other, &mut generated_rules);
            generate_compare_string(description, field, other, &mut generated_rules);
        }
        generate_in_rules(fd, field, complexity, rule_fields.len(), &mut generated_rules);
        generate_single_field(fd, field, &mut generated_rules);
    }

    for (i, a) in rule_fields.iter().enumerate() {
        for b in rule_fields.iter().skip(i + 1) {
            generate_pair_arithmetic(description, a, b, &mut generated_rules);
        }
    }

    if rule_fields.len() == 2 {
        let base: Vec<Rule> = generated_rules.rules.clone();
        for (i, r1) in base.iter().enumerate() {
            for r2 in base.iter().skip(i + 1) {
                if let Some(r) = Rule::combine_and(r1.clone(), r2.clone()) {
                    generated_rules.push(r);
                }
                if let Some(r) = Rule::combine_or(r1.clone(), r2.clone()) {
                    generated_rules.push(r);
                }
            }
        }
    }

    generated_rules.rules.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
    tracing::debug!(fields = rule_fields.len(), complexity, generated = generated_rules.rules.len(), "rule generation complete");
    generated_rules.rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;
    use crate::record::Record;

    fn describe_levels() -> Description {
        let mut d = Description::new();
        for (level, reps) in [(0, 3), (1, 2), (3, 2), (4, 2), (5, 2)] {
            for _ in 0..reps {
                let mut r = Record::new();
                r.insert("level", Literal::int(level));
                d.next_record(&r);
            }
        }
        d
    }

    #[test]
    fn seeds_with_true() {
        let d = describe_levels();
        let rules = generate(&d, &["level".to_string()], 5);
        assert!(rules.contains(&Rule::True));
    }

    #[test]
    fn in_fv_generation_matches_scenario() {
        let d = describe_levels();
        let rules = generate(&d, &["level".to_string()], 10);
        let as_strings: Vec<String> = rules.iter().map(|r| r.to_string()).collect();
        assert!(as_strings.contains(&"in(level, \"0\", \"1\")".to_string()));
        assert!(as_strings.contains(&"in(level, \"3\", \"4\", \"5\")".to_string()));
        // No subset of size 5 (== |values|) is ever generated.
        assert!(!as_strings.iter().any(|s| s.matches('"').count() / 2 == 5));
        // No subset of size 4 (== |values| - 1, "all but one") is ever generated either.
        assert!(!as_strings.iter().any(|s| s.starts_with("in(level") && s.matches('"').count() / 2 == 4));
    }

    #[test]
    fn rules_are_sorted_by_canonical_string() {
        let d = describe_levels();
        let rules = generate(&d, &["level".to_string()], 5);
        let strings: Vec<String> = rules.iter().map(|r| r.to_string()).collect();
        let mut sorted = strings.clone();
        sorted.sort();
        assert_eq!(strings, sorted);
    }

    #[test]
    fn generation_is_deduplicated() {
        let d = describe_levels();
        let rules = generate(&d, &["level".to_string()], 5);
        let mut seen = std::collections::HashSet::new();
        for r in &rules {
            assert!(seen.insert(r.to_string()), "duplicate rule: {r}");
        }
    }
}
