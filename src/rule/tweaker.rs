//! Rule tweaker (spec §4.6): produce neighbouring rules differing only in
//! a numeric constant, for the tweakable variants of [`Rule`](super::Rule).
//!
//! The original `tweaker.go` walks a fixed percentage ladder around the
//! existing constant; the specification instead calls for 19 evenly spaced
//! interior candidates within a stage-shrinking window, which is what is
//! implemented here.

use super::Rule;
use crate::describer::Description;
use crate::literal::round_to;

/// 19 interior candidates between `v0 - step` and `v0 + step`, clamped to
/// `[lo, hi]`, rounded to `dp` places, with `v0` and the window endpoints
/// excluded. Falls back to a 1- or 2-point set around `v0` when the window
/// collapses.
fn candidates(lo: f64, hi: f64, dp: u32, v0: f64, stage: u32) -> Vec<f64> {
    let stage = stage.max(1);
    let range = hi - lo;
    let step = range / (10.0 * stage as f64);
    let low = (v0 - step).max(lo);
    let high = (v0 + step).min(hi);

    let mut out = Vec::new();
    if low >= high {
        for cand in [round_to(lo, dp), round_to(hi, dp)] {
            if (cand - v0).abs() > f64::EPSILON && !out.contains(&cand) {
                out.push(cand);
            }
        }
        return out;
    }

    let mut seen = Vec::new();
    for k in 1..=19 {
        let raw = low + (k as f64) * (high - low) / 20.0;
        let rounded = round_to(raw, dp);
        if (rounded - v0).abs() <= f64::EPSILON {
            continue;
        }
        if (rounded - low).abs() <= f64::EPSILON || (rounded - high).abs() <= f64::EPSILON {
            continue;
        }
        if !seen.contains(&rounded) {
            seen.push(rounded);
        }
    }
    out.extend(seen);
    out
}

fn field_range(description: &Description, field: &str) -> Option<(f64, f64, u32)> {
    let fd = description.fields.get(field)?;
    let lo = fd.min.as_ref()?.as_float()?;
    let hi = fd.max.as_ref()?.as_float()?;
    Some((lo, hi, fd.max_dp as u32))
}

fn pair_range(description: &Description, a: &str, b: &str, combine: impl Fn(f64, f64) -> f64) -> Option<(f64, f64, u32)> {
    let (alo, ahi, adp) = field_range(description, a)?;
    let (blo, bhi, bdp) = field_range(description, b)?;
    Some((combine(alo, blo), combine(ahi, bhi), adp.max(bdp)))
}

impl Rule {
    /// Neighbouring rules with the constant perturbed, or `None` for a
    /// non-tweakable variant or one whose field range is unavailable.
    pub fn tweak(&self, description: &Description, stage: u32) -> Option<Vec<Rule>> {
        match self {
            Rule::GeFV(field, c) => {
                let (lo, hi, dp) = field_range(description, field)?;
                Some(candidates(lo, hi, dp, *c, stage).into_iter().map(|v| Rule::GeFV(field.clone(), v)).collect())
            }
            Rule::LeFV(field, c) => {
                let (lo, hi, dp) = field_range(description, field)?;
                Some(candidates(lo, hi, dp, *c, stage).into_iter().map(|v| Rule::LeFV(field.clone(), v)).collect())
            }
            Rule::AddGEF(a, b, c) => {
                let (lo, hi, dp) = pair_range(description, a, b, |x, y| x + y)?;
                Some(candidates(lo, hi, dp, *c, stage).into_iter().map(|v| Rule::AddGEF(a.clone(), b.clone(), v)).collect())
            }
            Rule::AddLEF(a, b, c) => {
                let (lo, hi, dp) = pair_range(description, a, b, |x, y| x + y)?;
                Some(candidates(lo, hi, dp, *c, stage).into_iter().map(|v| Rule::AddLEF(a.clone(), b.clone(), v)).collect())
            }
            Rule::MulGEF(a, b, c) => {
                let (lo, hi, dp) = pair_range(description, a, b, |x, y| x * y)?;
                Some(candidates(lo, hi, dp, *c, stage).into_iter().map(|v| Rule::MulGEF(a.clone(), b.clone(), v)).collect())
            }
            Rule::MulLEF(a, b, c) => {
                let (lo, hi, dp) = pair_range(description, a, b, |x, y| x * y)?;
                Some(candidates(lo, hi, dp, *c, stage).into_iter().map(|v| Rule::MulLEF(a.clone(), b.clone(), v)).collect())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;
    use crate::record::Record;

    fn describe_income() -> Description {
        let mut d = Description::new();
        for v in [500i64, 1000] {
            let mut r = Record::new();
            r.insert("income", Literal::int(v));
            d.next_record(&r);
        }
        // Seed values so max_dp behaves as if values had 2 dp precision.
        let mut r = Record::new();
        r.insert("income", Literal::float_with_text(750.12, "750.12"));
        d.next_record(&r);
        d
    }

    #[test]
    fn gefv_tweak_produces_interior_points_around_existing_constant() {
        let d = describe_income();
        let rule = Rule::GeFV("income".to_string(), 800.0);
        let tweaked = rule.tweak(&d, 1).unwrap();
        assert!(tweaked.len() >= 15);
        for r in &tweaked {
            if let Rule::GeFV(_, c) = r {
                assert!(*c >= 755.0 && *c <= 845.0, "constant {c} out of expected window");
                assert_ne!(*c, 800.0);
            } else {
                panic!("expected GeFV");
            }
        }
    }

    #[test]
    fn non_tweakable_rule_returns_none() {
        let d = describe_income();
        assert!(Rule::True.tweak(&d, 1).is_none());
        assert!(Rule::EqFV("income".to_string(), Literal::int(1)).tweak(&d, 1).is_none());
    }
}
