//! Nova Score API Library
//!
//! Turns a partner's behavioral and financial attributes into a Nova Score
//! (300-850) and a repayment probability using a pre-trained binary
//! classifier, and exposes that pipeline over HTTP.
//!
//! # Modules
//!
//! - `api`: API-layer namespace.
//! - `core`: Pipeline stages namespace.
//! - `alignment`: Training schema, encoded records and schema alignment.
//! - `artifact`: Model file loading, fingerprinting and metadata.
//! - `classifier`: The `Classifier` seam and repayment class lookup.
//! - `completion`: Default filling for behavioral attributes.
//! - `config`: Configuration management.
//! - `derivation`: Derived features.
//! - `encoding`: Drop-first one-hot encoding of `city_district`.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Profile, score and API data models.
//! - `onnx`: ONNX Runtime classifier.
//! - `pipeline`: The scoring pipeline used by every entry point.
//! - `scorer`: Probability to Nova Score mapping.

pub mod api;
pub mod core;

pub mod alignment;
pub mod artifact;
pub mod classifier;
pub mod completion;
pub mod config;
pub mod derivation;
pub mod encoding;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod onnx;
pub mod pipeline;
pub mod scorer;

pub use errors::{AppError, ScoringError};
pub use models::{PartnerProfile, ScoreResult};
pub use pipeline::ScoringPipeline;
