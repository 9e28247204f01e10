//! ONNX Runtime classifier.
//!
//! Gradient-boosted models are exported to ONNX (for XGBoost via
//! `onnxmltools.convert_xgboost` with the zipmap disabled) and evaluated by
//! ONNX Runtime. The exported graph carries no column names, so the training
//! column order and class labels travel in a schema file read by `artifact`.

use crate::alignment::FeatureVector;
use crate::classifier::Classifier;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::{debug, info};

/// A binary classifier evaluated by ONNX Runtime.
pub struct OnnxClassifier {
    /// Sessions need exclusive access to run
    session: Mutex<Session>,
    /// Input name for the model
    input_name: String,
    /// Output name for probabilities
    output_name: String,
    feature_names: Vec<String>,
    classes: Vec<String>,
}

impl OnnxClassifier {
    /// Builds a session from the model bytes.
    ///
    /// The bytes are the ones that were fingerprinted, so the session runs
    /// exactly the artifact that was verified.
    ///
    /// # Arguments
    ///
    /// * `model` - Serialized ONNX graph.
    /// * `feature_names` - Training column order of the single input tensor.
    /// * `classes` - Class labels in the order of the probability output.
    /// * `threads` - Intra-op threads for ONNX Runtime.
    pub fn from_memory(
        model: &[u8],
        feature_names: Vec<String>,
        classes: Vec<String>,
        threads: usize,
    ) -> Result<Self> {
        ort::init().commit()?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_memory(model)
            .context("Failed to build ONNX Runtime session")?;

        if session.inputs.len() != 1 {
            anyhow::bail!(
                "expected a single input tensor, model declares {}",
                session.inputs.len()
            );
        }
        let input_name = session.inputs[0].name.clone();

        let outputs: Vec<&str> = session.outputs.iter().map(|o| o.name.as_str()).collect();
        let output_name = probability_output(&outputs)
            .ok_or_else(|| anyhow::anyhow!("no probability output among {:?}", outputs))?;

        info!(
            input = %input_name,
            output = %output_name,
            features = feature_names.len(),
            threads = threads,
            "ONNX session ready"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            feature_names,
            classes,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        if features.names() != self.feature_names.as_slice() {
            anyhow::bail!("feature vector does not follow the model's training columns");
        }

        let row = input_row(features);
        let shape = vec![1_i64, row.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, row)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| anyhow::anyhow!("model returned no '{}' output", self.output_name))?;
        let (_, data) = output.try_extract_tensor::<f32>().with_context(|| {
            format!(
                "output '{}' is not a float tensor (export without zipmap)",
                self.output_name
            )
        })?;

        let proba = probabilities(data, self.classes.len())?;
        debug!(proba = ?proba, "ONNX inference complete");
        Ok(proba)
    }
}

/// One input row as the runtime stores it.
///
/// ONNX tree ensembles take `float` inputs, so a value is compared against a
/// split threshold only after narrowing to `f32`.
pub fn input_row(features: &FeatureVector) -> Vec<f32> {
    features.values().iter().map(|&v| v as f32).collect()
}

/// Picks the probability output: a name mentioning `prob`, else the last
/// output that is not the predicted label.
fn probability_output(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find(|name| name.contains("prob"))
        .or_else(|| names.iter().rev().find(|name| !name.contains("label")))
        .map(|name| name.to_string())
}

/// Widens one row of class probabilities, checking it covers every class.
fn probabilities(data: &[f32], classes: usize) -> Result<Vec<f64>> {
    if data.len() != classes {
        anyhow::bail!(
            "expected {} class probabilities, model returned {}",
            classes,
            data.len()
        );
    }
    Ok(data.iter().map(|&p| f64::from(p)).collect())
}
