use serde::Deserialize;
use std::path::PathBuf;

/// Where the model comes from and how its classes are interpreted.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    /// ONNX model file.
    pub model_path: String,
    /// Column order and class labels of the model. Defaults to
    /// `<model stem>.schema.json` next to the model.
    pub schema_path: Option<String>,
    /// Intra-op threads for ONNX Runtime.
    pub onnx_threads: usize,
    /// Expected SHA-256 of the model file (lowercase hex), if pinned.
    pub model_sha256: Option<String>,
    /// Overrides the class labels recorded in the model file.
    pub class_labels: Option<Vec<String>>,
    /// Class label meaning "repaid".
    pub repayment_class_label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub model: ModelSettings,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
    pub max_body_bytes: usize,
    pub request_timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_path: "model/nova_model.onnx".to_string(),
            schema_path: None,
            onnx_threads: 1,
            model_sha256: None,
            class_labels: None,
            repayment_class_label: "0".to_string(),
        }
    }
}

impl ModelSettings {
    /// Location of the schema file for this model.
    pub fn schema_path(&self) -> PathBuf {
        match &self.schema_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.model_path).with_extension("schema.json"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            model: ModelSettings::default(),
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
            max_body_bytes: 64 * 1024,
            request_timeout_secs: 10,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T, hint: &str) -> anyhow::Result<T> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be {}", name, hint)),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let config = Self {
            port: parse_var("PORT", defaults.port, "a valid number between 1-65535")?,
            model: ModelSettings {
                model_path: std::env::var("MODEL_PATH")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or(defaults.model.model_path),
                schema_path: std::env::var("MODEL_SCHEMA_PATH")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                onnx_threads: parse_var(
                    "MODEL_THREADS",
                    defaults.model.onnx_threads,
                    "a positive integer",
                )?,
                model_sha256: std::env::var("MODEL_SHA256")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .map(|digest| {
                        let digest = digest.trim().to_ascii_lowercase();
                        if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                            anyhow::bail!("MODEL_SHA256 must be 64 hex characters");
                        }
                        Ok(digest)
                    })
                    .transpose()?,
                class_labels: std::env::var("MODEL_CLASS_LABELS")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .map(|raw| {
                        let labels: Vec<String> =
                            raw.split(',').map(|l| l.trim().to_string()).collect();
                        if labels.len() != 2 || labels.iter().any(|l| l.is_empty()) {
                            anyhow::bail!("MODEL_CLASS_LABELS must list exactly 2 labels, e.g. \"0,1\"");
                        }
                        Ok(labels)
                    })
                    .transpose()?,
                repayment_class_label: std::env::var("REPAYMENT_CLASS_LABEL")
                    .ok()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .unwrap_or(defaults.model.repayment_class_label),
            },
            rate_limit_per_second: parse_var(
                "RATE_LIMIT_PER_SECOND",
                defaults.rate_limit_per_second,
                "a positive integer",
            )?,
            rate_limit_burst: parse_var(
                "RATE_LIMIT_BURST",
                defaults.rate_limit_burst,
                "a positive integer",
            )?,
            max_body_bytes: parse_var(
                "MAX_BODY_BYTES",
                defaults.max_body_bytes,
                "a number of bytes",
            )?,
            request_timeout_secs: parse_var(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
                "a number of seconds",
            )?,
        };

        if config.model.onnx_threads == 0 {
            anyhow::bail!("MODEL_THREADS must be greater than 0");
        }
        if config.rate_limit_per_second == 0 || config.rate_limit_burst == 0 {
            anyhow::bail!("RATE_LIMIT_PER_SECOND and RATE_LIMIT_BURST must be greater than 0");
        }

        tracing::debug!("Model path: {}", config.model.model_path);
        tracing::debug!("Model schema path: {}", config.model.schema_path().display());
        tracing::debug!("Repayment class label: {}", config.model.repayment_class_label);
        if config.model.model_sha256.is_some() {
            tracing::info!("Model checksum pinned");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
