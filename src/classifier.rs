//! The seam between the pipeline and a trained model.

use crate::alignment::FeatureVector;

/// A trained binary classifier.
///
/// Implementations are immutable once loaded and shared across requests.
pub trait Classifier: Send + Sync {
    /// Feature names in the order the model was fit on.
    fn feature_names(&self) -> &[String];

    /// Class labels, indexed the same way as `predict_proba` output.
    fn classes(&self) -> &[String];

    /// Per-class probabilities for one feature vector.
    fn predict_proba(&self, features: &FeatureVector) -> anyhow::Result<Vec<f64>>;
}

/// Position of the repayment class in `predict_proba` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepaymentClass {
    pub label: String,
    pub index: usize,
}

impl RepaymentClass {
    /// Looks `label` up in the model's class list.
    pub fn resolve(classes: &[String], label: &str) -> anyhow::Result<Self> {
        let index = classes
            .iter()
            .position(|c| c == label)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "repayment class label '{}' not found in model classes {:?}",
                    label,
                    classes
                )
            })?;

        Ok(Self {
            label: label.to_string(),
            index,
        })
    }
}
