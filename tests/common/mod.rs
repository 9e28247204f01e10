//! Shared fixtures: a small boosted-stump model over the full training schema.
#![allow(dead_code)]

use nova_score_api::alignment::FeatureVector;
use nova_score_api::artifact::{class_labels, LoadedModel};
use nova_score_api::classifier::Classifier;
use nova_score_api::config::ModelSettings;
use nova_score_api::onnx::input_row;
use nova_score_api::pipeline::ScoringPipeline;
use std::sync::Arc;

/// Column order the fixture model was "trained" on.
pub const TRAINING_COLUMNS: [&str; 15] = [
    "tenure_months",
    "avg_customer_rating",
    "safety_score",
    "avg_weekly_trips",
    "grab_pay_usage_rate",
    "acceptance_rate",
    "cancellation_rate",
    "peak_hour_percentage",
    "avg_weekly_earnings",
    "earnings_stability_score",
    "earnings_per_trip",
    "rating_x_tenure",
    "city_district_North",
    "city_district_South",
    "city_district_West",
];

/// A split on one column: `left` when the value is below `threshold`.
struct Stump {
    feature: usize,
    threshold: f32,
    left: f64,
    right: f64,
}

/// Three stumps; margins are log-odds of default (second class):
/// - `safety_score < 80` → +0.5, else -0.5
/// - `city_district_South < 0.5` → -0.1, else +0.3
/// - `earnings_per_trip < 150` → +0.2, else -0.2
///
/// Rows are compared in `f32`, as ONNX Runtime does.
pub struct StumpModel {
    names: Vec<String>,
    classes: Vec<String>,
    stumps: Vec<Stump>,
}

impl StumpModel {
    pub fn new(classes: Vec<String>) -> Self {
        Self {
            names: TRAINING_COLUMNS.iter().map(|c| c.to_string()).collect(),
            classes,
            stumps: vec![
                Stump { feature: 2, threshold: 80.0, left: 0.5, right: -0.5 },
                Stump { feature: 13, threshold: 0.5, left: -0.1, right: 0.3 },
                Stump { feature: 10, threshold: 150.0, left: 0.2, right: -0.2 },
            ],
        }
    }

    fn margin(&self, row: &[f32]) -> f64 {
        self.stumps
            .iter()
            .map(|s| if row[s.feature] < s.threshold { s.left } else { s.right })
            .sum()
    }
}

impl Classifier for StumpModel {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, features: &FeatureVector) -> anyhow::Result<Vec<f64>> {
        if features.names() != self.names.as_slice() {
            anyhow::bail!("feature vector does not follow the model's training columns");
        }
        let p = 1.0 / (1.0 + (-self.margin(&input_row(features))).exp());
        Ok(vec![1.0 - p, p])
    }
}

/// Repayment probability for a given default margin.
pub fn repayment_for_margin(margin: f64) -> f64 {
    1.0 - 1.0 / (1.0 + (-margin).exp())
}

pub fn load_fixture_model(settings: ModelSettings) -> LoadedModel {
    let classes = class_labels(&settings, None).unwrap();
    LoadedModel::from_classifier(Arc::new(StumpModel::new(classes)), &settings, "0".repeat(64))
        .unwrap()
}

pub fn fixture_pipeline() -> ScoringPipeline {
    ScoringPipeline::new(load_fixture_model(ModelSettings::default()))
}
