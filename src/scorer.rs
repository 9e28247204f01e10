use crate::alignment::{FeatureVector, TrainingSchema};
use crate::classifier::{Classifier, RepaymentClass};
use crate::errors::ScoringError;
use crate::models::ScoreResult;
use std::sync::Arc;

/// Turns aligned feature vectors into Nova Scores with one loaded model.
///
/// The training schema and the repayment class index are fixed when the
/// scorer is built and never change afterwards.
#[derive(Clone)]
pub struct Scorer {
    model: Arc<dyn Classifier>,
    schema: TrainingSchema,
    repayment: RepaymentClass,
}

impl Scorer {
    /// Builds a scorer, resolving `repayment_label` against the model's classes.
    ///
    /// # Arguments
    ///
    /// * `model` - The loaded classifier.
    /// * `repayment_label` - Class label that means "repaid".
    ///
    /// # Returns
    ///
    /// * `anyhow::Result<Self>` - Fails if the schema is invalid or the label is unknown.
    pub fn new(model: Arc<dyn Classifier>, repayment_label: &str) -> anyhow::Result<Self> {
        let schema = TrainingSchema::new(model.feature_names().to_vec())?;
        let repayment = RepaymentClass::resolve(model.classes(), repayment_label)?;

        tracing::info!(
            features = schema.len(),
            repayment_label = %repayment.label,
            repayment_index = repayment.index,
            "Scorer ready"
        );

        Ok(Self {
            model,
            schema,
            repayment,
        })
    }

    pub fn schema(&self) -> &TrainingSchema {
        &self.schema
    }

    pub fn repayment_class(&self) -> &RepaymentClass {
        &self.repayment
    }

    pub fn classes(&self) -> &[String] {
        self.model.classes()
    }

    /// Scores one aligned feature vector.
    pub fn score(&self, features: &FeatureVector) -> Result<ScoreResult, ScoringError> {
        let proba = self
            .model
            .predict_proba(features)
            .map_err(|e| ScoringError::MalformedModelOutput(format!("{:#}", e)))?;

        let probability = proba.get(self.repayment.index).copied().ok_or_else(|| {
            ScoringError::MalformedModelOutput(format!(
                "expected a probability at class index {}, got {} values",
                self.repayment.index,
                proba.len()
            ))
        })?;

        if !probability.is_finite() {
            return Err(ScoringError::MalformedModelOutput(format!(
                "repayment probability {} is not finite",
                probability
            )));
        }

        Ok(ScoreResult::from_probability(probability))
    }
}
