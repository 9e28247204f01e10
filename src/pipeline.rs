//! The scoring pipeline shared by every entry point.
//!
//! Completion → derivation → encoding → alignment → scoring. The HTTP
//! handlers and the offline CLI both go through `ScoringPipeline`, so default
//! filling and column alignment cannot drift between callers.

use crate::alignment::{align, EncodedRecord, FeatureVector, TrainingSchema};
use crate::artifact::{LoadedModel, ModelMetadata};
use crate::completion::complete;
use crate::derivation::derive;
use crate::encoding::encode_district;
use crate::errors::ScoringError;
use crate::models::{PartnerProfile, ScoreResult};
use std::sync::Arc;

/// Runs stages one to four: everything short of calling the model.
pub fn build_feature_vector(
    profile: &PartnerProfile,
    schema: &TrainingSchema,
) -> Result<FeatureVector, ScoringError> {
    let completed = complete(profile);
    let derived = derive(&completed)?;
    let indicators = encode_district(&completed.city_district)?;
    let record = EncodedRecord::from_stages(&completed, &derived, indicators);
    align(&record, schema)
}

/// Entry point to scoring.
///
/// Holds the model published at startup, if any. Without one every scoring
/// call fails with `ModelUnavailable`.
#[derive(Clone, Default)]
pub struct ScoringPipeline {
    model: Option<Arc<LoadedModel>>,
}

impl ScoringPipeline {
    pub fn new(model: LoadedModel) -> Self {
        Self {
            model: Some(Arc::new(model)),
        }
    }

    /// A pipeline that refuses to score.
    pub fn unloaded() -> Self {
        Self { model: None }
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.model.as_deref().map(|m| &m.metadata)
    }

    fn loaded(&self) -> Result<&LoadedModel, ScoringError> {
        self.model.as_deref().ok_or(ScoringError::ModelUnavailable)
    }

    /// Builds the feature vector the loaded model would see for `profile`.
    pub fn prepare(&self, profile: &PartnerProfile) -> Result<FeatureVector, ScoringError> {
        let loaded = self.loaded()?;
        build_feature_vector(profile, loaded.scorer.schema())
    }

    /// Scores one profile.
    pub fn score(&self, profile: &PartnerProfile) -> Result<ScoreResult, ScoringError> {
        let loaded = self.loaded()?;
        let features = build_feature_vector(profile, loaded.scorer.schema())?;
        let result = loaded.scorer.score(&features)?;

        tracing::debug!(
            nova_score = result.nova_score,
            repayment_probability = result.repayment_probability,
            features = features.len(),
            "Profile scored"
        );

        Ok(result)
    }

    /// Scores every profile or none.
    ///
    /// The first failure aborts the batch and is returned with the index of
    /// the offending profile.
    pub fn score_batch(
        &self,
        profiles: &[PartnerProfile],
    ) -> Result<Vec<ScoreResult>, (usize, ScoringError)> {
        profiles
            .iter()
            .enumerate()
            .map(|(i, profile)| self.score(profile).map_err(|e| (i, e)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> TrainingSchema {
        TrainingSchema::new(
            [
                "tenure_months",
                "avg_customer_rating",
                "safety_score",
                "avg_weekly_trips",
                "earnings_per_trip",
                "city_district_North",
                "city_district_South",
                "city_district_West",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_unloaded_pipeline_refuses() {
        let pipeline = ScoringPipeline::unloaded();
        let profile = PartnerProfile::minimal(24, "East", 4.8, 15000.0, 80);

        assert!(!pipeline.is_ready());
        assert_eq!(pipeline.score(&profile), Err(ScoringError::ModelUnavailable));
        assert_eq!(pipeline.prepare(&profile), Err(ScoringError::ModelUnavailable));
        assert!(pipeline.metadata().is_none());
    }

    #[test]
    fn test_feature_vector_follows_schema() {
        let profile = PartnerProfile::minimal(12, "West", 4.9, 10000.0, 50);
        let vector = build_feature_vector(&profile, &schema()).unwrap();

        assert_eq!(vector.names(), schema().names());
        assert_eq!(
            vector.values(),
            &[12.0, 4.9, 85.0, 50.0, 200.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_stage_errors_propagate() {
        let zero_trips = PartnerProfile::minimal(12, "West", 4.9, 10000.0, 0);
        assert_eq!(
            build_feature_vector(&zero_trips, &schema()),
            Err(ScoringError::DivisionByZero)
        );

        let unknown = PartnerProfile::minimal(12, "Unknown", 4.9, 10000.0, 10);
        assert!(matches!(
            build_feature_vector(&unknown, &schema()),
            Err(ScoringError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_batch_on_unloaded_reports_first_index() {
        let pipeline = ScoringPipeline::unloaded();
        let profiles = vec![PartnerProfile::minimal(1, "North", 4.5, 5000.0, 20)];
        assert_eq!(
            pipeline.score_batch(&profiles),
            Err((0, ScoringError::ModelUnavailable))
        );
    }
}
