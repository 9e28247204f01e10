//! Schema alignment: reconciles an encoded record with the model's training schema.
//!
//! A model scores columns by position. If inference-time columns are missing,
//! extra, or ordered differently than at training time, the model still
//! returns a probability, just a meaningless one. Every feature vector handed
//! to a classifier is therefore built here, against the schema the classifier
//! itself declares.

use crate::derivation::DerivedFeatures;
use crate::encoding::Indicators;
use crate::errors::ScoringError;
use crate::models::CompletedProfile;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Ordered feature names a model was fit on.
///
/// Cheap to clone; all clones share the same name list.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSchema {
    names: Arc<[String]>,
}

impl TrainingSchema {
    /// Builds a schema, rejecting empty lists and duplicate names.
    pub fn new(names: Vec<String>) -> anyhow::Result<Self> {
        if names.is_empty() {
            anyhow::bail!("training schema must declare at least one feature");
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                anyhow::bail!("training schema declares feature '{}' more than once", name);
            }
        }

        Ok(Self {
            names: names.into(),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Column name to value map produced by the encoding stage.
///
/// Keeps insertion order so logs and debugging output read naturally; the
/// order carries no meaning for alignment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedRecord {
    columns: Vec<(String, f64)>,
}

impl EncodedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles the record from the typed outputs of the earlier stages.
    pub fn from_stages(
        profile: &CompletedProfile,
        derived: &DerivedFeatures,
        indicators: Indicators,
    ) -> Self {
        let mut record = Self::new();
        record.insert("tenure_months", f64::from(profile.tenure_months));
        record.insert("avg_customer_rating", profile.avg_customer_rating);
        record.insert("safety_score", profile.safety_score);
        record.insert("avg_weekly_earnings", profile.avg_weekly_earnings);
        record.insert("avg_weekly_trips", f64::from(profile.avg_weekly_trips));
        record.insert("acceptance_rate", profile.acceptance_rate);
        record.insert("cancellation_rate", profile.cancellation_rate);
        record.insert("peak_hour_percentage", profile.peak_hour_percentage);
        record.insert("grab_pay_usage_rate", profile.grab_pay_usage_rate);
        record.insert("earnings_stability_score", profile.earnings_stability_score);

        for (name, value) in derived.columns() {
            record.insert(name, value);
        }
        for (name, value) in indicators.into_columns() {
            record.insert(name, value);
        }

        record
    }

    /// Sets a column, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }
}

/// Numeric columns laid out exactly as a `TrainingSchema` prescribes.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: TrainingSchema,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn names(&self) -> &[String] {
        self.schema.names()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn schema(&self) -> &TrainingSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema.position(name).map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Aligns `record` to `schema`.
///
/// Schema columns missing from the record are zero-filled, record columns
/// unknown to the schema are discarded, and the result follows schema order.
/// A shape mismatch is never an error; a non-finite value in a kept column is.
pub fn align(record: &EncodedRecord, schema: &TrainingSchema) -> Result<FeatureVector, ScoringError> {
    let lookup: HashMap<&str, f64> = record
        .columns
        .iter()
        .map(|(name, value)| (name.as_str(), *value))
        .collect();

    let mut values = Vec::with_capacity(schema.len());
    let mut filled = Vec::new();

    for name in schema.names() {
        match lookup.get(name.as_str()) {
            Some(value) if value.is_finite() => values.push(*value),
            Some(value) => {
                return Err(ScoringError::InvalidFeatureValue {
                    column: name.clone(),
                    reason: format!("{} is not a finite number", value),
                })
            }
            None => {
                filled.push(name.as_str());
                values.push(0.0);
            }
        }
    }

    let known: HashSet<&str> = schema.names().iter().map(String::as_str).collect();
    let dropped: Vec<&str> = record.names().filter(|n| !known.contains(n)).collect();

    if !filled.is_empty() || !dropped.is_empty() {
        tracing::debug!(
            zero_filled = ?filled,
            dropped = ?dropped,
            "Aligned record to training schema ({} columns)",
            schema.len()
        );
    }

    Ok(FeatureVector {
        schema: schema.clone(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[&str]) -> TrainingSchema {
        TrainingSchema::new(names.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_missing_columns_zero_filled() {
        let mut record = EncodedRecord::new();
        record.insert("a", 1.5);

        let vector = align(&record, &schema(&["a", "b"])).unwrap();

        assert_eq!(vector.values(), &[1.5, 0.0]);
        assert_eq!(vector.names(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_extra_columns_dropped() {
        let mut record = EncodedRecord::new();
        record.insert("a", 1.0);
        record.insert("city_district_Central", 1.0);

        let vector = align(&record, &schema(&["a"])).unwrap();

        assert_eq!(vector.len(), 1);
        assert_eq!(vector.get("city_district_Central"), None);
    }

    #[test]
    fn test_order_follows_schema_not_record() {
        let mut record = EncodedRecord::new();
        record.insert("z", 3.0);
        record.insert("a", 1.0);
        record.insert("m", 2.0);

        let vector = align(&record, &schema(&["m", "z", "a"])).unwrap();

        assert_eq!(vector.values(), &[2.0, 3.0, 1.0]);
        let names: Vec<&str> = vector.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["m", "z", "a"]);
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let mut record = EncodedRecord::new();
        record.insert("rating_x_tenure", f64::INFINITY);

        let err = align(&record, &schema(&["rating_x_tenure"])).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::InvalidFeatureValue { ref column, .. } if column == "rating_x_tenure"
        ));
    }

    #[test]
    fn test_non_finite_value_outside_schema_ignored() {
        let mut record = EncodedRecord::new();
        record.insert("a", 1.0);
        record.insert("unused", f64::NAN);

        assert!(align(&record, &schema(&["a"])).is_ok());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut record = EncodedRecord::new();
        record.insert("a", 1.0);
        record.insert("b", 2.0);
        record.insert("a", 5.0);

        assert_eq!(record.len(), 2);
        assert_eq!(record.get("a"), Some(5.0));
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_schema_rejects_duplicates_and_empty() {
        assert!(TrainingSchema::new(vec![]).is_err());
        assert!(TrainingSchema::new(vec!["a".into(), "b".into(), "a".into()]).is_err());
    }
}
