//! One-pass field-type & range inference over a record stream (spec §4.3).
//!
//! Generalised from the teacher's `database::schema::{JsonPrimitive,
//! FieldInfo}` single-pass nullability/type inference: instead of a
//! coarse JSON shape, each field accumulates a kind, numeric range,
//! decimal precision and a bounded value histogram used to seed rule
//! generation.

use crate::literal::{decimal_places, Literal};
use crate::record::Record;
use indexmap::IndexMap;

const MAX_VALUES: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Unknown,
    Number,
    String,
    Ignore,
}

#[derive(Debug, Clone)]
pub struct ValueCount {
    pub literal: Literal,
    pub count: u64,
}

/// Per-field statistics. `kind` only ever advances along
/// `Unknown -> Number -> String -> Ignore`.
#[derive(Debug, Clone)]
pub struct FieldDescription {
    pub kind: FieldKind,
    pub min: Option<Literal>,
    pub max: Option<Literal>,
    pub max_dp: usize,
    pub values: IndexMap<String, ValueCount>,
    number_is_int: bool,
    saturated: bool,
}

impl FieldDescription {
    fn seed(first: &Literal) -> Self {
        FieldDescription {
            kind: FieldKind::Unknown,
            min: Some(first.clone()),
            max: Some(first.clone()),
            max_dp: 0,
            values: IndexMap::new(),
            number_is_int: false,
            saturated: false,
        }
    }

    fn process_value(&mut self, value: &Literal) {
        self.update_kind(value);
        self.update_values(value);
        self.update_num_boundaries(value);
    }

    fn update_kind(&mut self, value: &Literal) {
        match self.kind {
            FieldKind::Unknown => {
                if matches!(value, Literal::Int(_)) {
                    self.kind = FieldKind::Number;
                    self.number_is_int = true;
                } else if matches!(value, Literal::Float { .. }) {
                    self.kind = FieldKind::Number;
                    self.number_is_int = false;
                } else {
                    self.kind = FieldKind::String;
                }
            }
            FieldKind::Number if self.number_is_int => {
                if matches!(value, Literal::Int(_)) {
                    // stays int
                } else if matches!(value, Literal::Float { .. }) {
                    self.number_is_int = false;
                } else {
                    self.kind = FieldKind::String;
                }
            }
            FieldKind::Number => {
                if !value.is_numeric() {
                    self.kind = FieldKind::String;
                }
            }
            FieldKind::String | FieldKind::Ignore => {}
        }
    }

    fn update_values(&mut self, value: &Literal) {
        if matches!(self.kind, FieldKind::Ignore | FieldKind::Unknown) || self.saturated {
            return;
        }
        let key = value.to_display_string();
        if let Some(vc) = self.values.get_mut(&key) {
            vc.count += 1;
            return;
        }
        self.values.insert(key, ValueCount { literal: value.clone(), count: 1 });
        if self.values.len() > MAX_VALUES {
            if self.kind == FieldKind::String {
                self.kind = FieldKind::Ignore;
            }
            self.values.clear();
            self.saturated = true;
        }
    }

    fn update_num_boundaries(&mut self, value: &Literal) {
        if self.kind != FieldKind::Number {
            return;
        }
        if self.number_is_int {
            if let (Some(v), Some(mn), Some(mx)) =
                (value.as_int(), self.min.as_ref().and_then(|m| m.as_int()), self.max.as_ref().and_then(|m| m.as_int()))
            {
                self.min = Some(Literal::int(mn.min(v)));
                self.max = Some(Literal::int(mx.max(v)));
            }
        } else {
            if let (Some(v), Some(mn), Some(mx)) = (
                value.as_float(),
                self.min.as_ref().and_then(|m| m.as_float()),
                self.max.as_ref().and_then(|m| m.as_float()),
            ) {
                self.min = Some(Literal::float(mn.min(v)));
                self.max = Some(Literal::float(mx.max(v)));
            }
            let dp = decimal_places(&value.to_display_string());
            self.max_dp = self.max_dp.max(dp);
        }
    }

    pub fn is_number(&self) -> bool {
        self.kind == FieldKind::Number
    }

    pub fn is_string(&self) -> bool {
        self.kind == FieldKind::String
    }
}

/// `fields: map<name, FieldDescription>`, insertion-ordered by
/// first-record field appearance; immutable after the describe pass.
#[derive(Debug, Clone, Default)]
pub struct Description {
    pub fields: IndexMap<String, FieldDescription>,
}

impl Description {
    pub fn new() -> Self {
        Description { fields: IndexMap::new() }
    }

    /// Analyse one record, updating every field's running description.
    pub fn next_record(&mut self, record: &Record) {
        if self.fields.is_empty() {
            for (name, value) in record.0.iter() {
                self.fields.insert(name.clone(), FieldDescription::seed(value));
            }
        }
        for (name, value) in record.0.iter() {
            if let Some(fd) = self.fields.get_mut(name) {
                fd.process_value(value);
            }
        }
    }

    /// Run the describer over an entire record source from the start.
    pub fn describe(source: &mut dyn crate::source::RecordSource) -> Result<Description, crate::source::IoError> {
        source.rewind()?;
        let mut d = Description::new();
        let mut n = 0usize;
        while source.next() {
            let rec = source.read()?;
            d.next_record(&rec);
            n += 1;
        }
        tracing::debug!(records = n, fields = d.fields.len(), "describe pass complete");
        Ok(d)
    }

    /// Field numbering used by the generator to avoid emitting both
    /// `(A, B)` and `(B, A)` comparison pairs — insertion order gives a
    /// stable, deterministic index per field.
    pub fn field_num(&self, name: &str) -> Option<usize> {
        self.fields.get_index_of(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: &[(&str, &str)]) -> Record {
        let mut r = Record::new();
        for (k, v) in pairs {
            r.insert(*k, Literal::parse(v));
        }
        r
    }

    #[test]
    fn describer_infers_numeric_field_with_mixed_int_float() {
        let mut d = Description::new();
        for v in ["7", "7.3", "9", "14", "15.1"] {
            d.next_record(&rec(&[("x", v)]));
        }
        let fd = &d.fields["x"];
        assert_eq!(fd.kind, FieldKind::Number);
        assert_eq!(fd.min.as_ref().unwrap().as_float(), Some(7.0));
        assert_eq!(fd.max.as_ref().unwrap().as_float(), Some(15.1));
        assert_eq!(fd.max_dp, 1);
        assert_eq!(fd.values.len(), 5);
    }

    #[test]
    fn describer_demotes_to_string_on_non_numeric_value() {
        let mut d = Description::new();
        for v in ["9.9", "9.97", "10", "10.94", "9.9a", "9.9b"] {
            d.next_record(&rec(&[("y", v)]));
        }
        let fd = &d.fields["y"];
        assert_eq!(fd.kind, FieldKind::String);
        assert_eq!(fd.values.len(), 6);
    }

    #[test]
    fn kind_transitions_never_regress() {
        let mut d = Description::new();
        d.next_record(&rec(&[("z", "1")]));
        assert_eq!(d.fields["z"].kind, FieldKind::Number);
        d.next_record(&rec(&[("z", "1.5")]));
        assert_eq!(d.fields["z"].kind, FieldKind::Number);
        d.next_record(&rec(&[("z", "abc")]));
        assert_eq!(d.fields["z"].kind, FieldKind::String);
        // Further numeric-looking values do not revert a String field.
        d.next_record(&rec(&[("z", "2")]));
        assert_eq!(d.fields["z"].kind, FieldKind::String);
    }

    #[test]
    fn string_field_becomes_ignore_past_capacity() {
        let mut d = Description::new();
        for i in 0..40 {
            d.next_record(&rec(&[("code", &format!("v{i}"))]));
        }
        let fd = &d.fields["code"];
        assert_eq!(fd.kind, FieldKind::Ignore);
        assert!(fd.values.is_empty());
    }

    #[test]
    fn number_field_past_capacity_keeps_bounds_but_clears_values() {
        let mut d = Description::new();
        for i in 0..40 {
            d.next_record(&rec(&[("n", &i.to_string())]));
        }
        let fd = &d.fields["n"];
        assert_eq!(fd.kind, FieldKind::Number);
        assert!(fd.values.is_empty());
        assert_eq!(fd.max.as_ref().unwrap().as_int(), Some(39));
    }
}
