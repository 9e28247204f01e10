use crate::alignment::{align, EncodedRecord};
use crate::classifier::Classifier;
use crate::config::ModelSettings;
use crate::onnx::OnnxClassifier;
use crate::scorer::Scorer;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

/// Labels used when neither the schema file nor configuration names them.
pub const DEFAULT_CLASS_LABELS: [&str; 2] = ["0", "1"];

/// Model file contents together with their SHA-256 fingerprint.
///
/// The fingerprint identifies exactly which model produced a score and,
/// when a digest is pinned in configuration, stops a swapped or truncated
/// file from being served.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub bytes: Vec<u8>,
    /// SHA-256 of `bytes` (hex encoded)
    pub checksum: String,
}

impl ModelArtifact {
    pub fn new(bytes: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&bytes);
        Self { bytes, checksum }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read model file {}", path.display()))?;
        Ok(Self::new(bytes))
    }

    fn compute_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Checks the fingerprint against a pinned digest.
    pub fn verify(&self, expected: &str) -> anyhow::Result<()> {
        if !self.checksum.eq_ignore_ascii_case(expected.trim()) {
            tracing::warn!(
                "Model checksum mismatch. Expected: {}, Actual: {}, Size: {} bytes",
                expected,
                self.checksum,
                self.bytes.len()
            );
            anyhow::bail!("model checksum mismatch (expected {}, got {})", expected, self.checksum);
        }
        Ok(())
    }
}

/// Training columns and class labels shipped next to an ONNX model.
///
/// ```json
/// {"feature_names": ["tenure_months", "..."], "classes": [0, 1]}
/// ```
///
/// `classes` mirrors scikit-learn's `classes_`: numbers or strings, in the
/// order of the probability output.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSchema {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub classes: Option<Vec<serde_json::Value>>,
}

impl ModelSchema {
    pub fn from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        let schema: Self = serde_json::from_slice(bytes).context("Invalid model schema JSON")?;
        if schema.feature_names.is_empty() {
            anyhow::bail!("model schema lists no feature names");
        }
        Ok(schema)
    }

    pub fn read<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read model schema {}", path.display()))?;
        Self::from_slice(&bytes).with_context(|| format!("In {}", path.display()))
    }

    /// Declared class labels as text (`0` and `"0"` both read as `0`).
    pub fn class_labels(&self) -> Option<Vec<String>> {
        self.classes.as_ref().map(|classes| {
            classes
                .iter()
                .map(|c| match c {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
    }
}

/// Class labels in probability order: configuration wins over the labels the
/// model declares, which win over `["0", "1"]`.
pub fn class_labels(
    settings: &ModelSettings,
    declared: Option<Vec<String>>,
) -> anyhow::Result<Vec<String>> {
    let labels = settings
        .class_labels
        .clone()
        .or(declared)
        .unwrap_or_else(|| DEFAULT_CLASS_LABELS.iter().map(|l| l.to_string()).collect());

    if labels.len() != 2 {
        anyhow::bail!("a binary classifier needs exactly 2 class labels, got {:?}", labels);
    }
    if labels[0] == labels[1] {
        anyhow::bail!("class labels must be distinct, got {:?}", labels);
    }
    Ok(labels)
}

/// What was loaded, from where, and how classes are read.
#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadata {
    pub source: String,
    pub sha256: String,
    pub loaded_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub classes: Vec<String>,
    pub repayment_class_label: String,
    pub repayment_class_index: usize,
}

/// A scorer together with the metadata of the model behind it.
#[derive(Clone)]
pub struct LoadedModel {
    pub scorer: Scorer,
    pub metadata: ModelMetadata,
}

impl LoadedModel {
    /// Wraps a ready classifier: resolves the repayment class, runs one
    /// prediction on an all-zero row and records the metadata.
    ///
    /// # Arguments
    ///
    /// * `model` - The classifier, already carrying its labels.
    /// * `settings` - Model settings (source path and repayment label).
    /// * `sha256` - Fingerprint of the artifact the classifier was built from.
    pub fn from_classifier(
        model: Arc<dyn Classifier>,
        settings: &ModelSettings,
        sha256: String,
    ) -> anyhow::Result<Self> {
        let scorer = Scorer::new(model, &settings.repayment_class_label)?;

        let warmup = align(&EncodedRecord::new(), scorer.schema())?;
        scorer
            .score(&warmup)
            .context("Model failed a warm-up prediction")?;

        let metadata = ModelMetadata {
            source: settings.model_path.clone(),
            sha256,
            loaded_at: Utc::now(),
            feature_names: scorer.schema().names().to_vec(),
            classes: scorer.classes().to_vec(),
            repayment_class_label: scorer.repayment_class().label.clone(),
            repayment_class_index: scorer.repayment_class().index,
        };

        Ok(Self { scorer, metadata })
    }
}

/// Reads, verifies and opens the configured model.
pub fn load_model(settings: &ModelSettings) -> anyhow::Result<LoadedModel> {
    let schema_path = settings.schema_path();
    tracing::info!(
        path = %settings.model_path,
        schema = %schema_path.display(),
        "Loading model"
    );

    let artifact = ModelArtifact::read(&settings.model_path)?;
    if let Some(expected) = &settings.model_sha256 {
        artifact.verify(expected)?;
    }

    let schema = ModelSchema::read(&schema_path)?;
    let classes = class_labels(settings, schema.class_labels())?;

    let classifier = OnnxClassifier::from_memory(
        &artifact.bytes,
        schema.feature_names,
        classes,
        settings.onnx_threads,
    )
    .with_context(|| format!("Failed to load model from {}", settings.model_path))?;

    let loaded = LoadedModel::from_classifier(Arc::new(classifier), settings, artifact.checksum)?;

    tracing::info!(
        sha256 = %loaded.metadata.sha256,
        features = loaded.metadata.feature_names.len(),
        "Model loaded successfully"
    );

    Ok(loaded)
}
