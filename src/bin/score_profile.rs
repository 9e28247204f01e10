//! Scores partner profiles from a JSON file without starting the server.
//!
//! Usage: `score_profile <profile.json> [model.onnx]`
//!
//! The file holds one profile object or an array of them. The model path
//! defaults to `MODEL_PATH`, its schema file to `MODEL_SCHEMA_PATH` or the
//! `.schema.json` file next to it. Results are printed to stdout as JSON.

use anyhow::Context;
use nova_score_api::artifact::load_model;
use nova_score_api::config::Config;
use nova_score_api::models::{PartnerProfile, ScoreResponse};
use nova_score_api::pipeline::ScoringPipeline;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfileInput {
    One(PartnerProfile),
    Many(Vec<PartnerProfile>),
}

fn parse_input(raw: &str) -> anyhow::Result<ProfileInput> {
    let input = serde_json::from_str(raw)?;
    if let ProfileInput::Many(profiles) = &input {
        if profiles.is_empty() {
            anyhow::bail!("no profiles to score");
        }
    }
    Ok(input)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nova_score_api=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let profile_path = args
        .next()
        .context("usage: score_profile <profile.json> [model.onnx]")?;

    let mut config = Config::from_env()?;
    if let Some(model_path) = args.next() {
        config.model.model_path = model_path;
    }

    let pipeline = ScoringPipeline::new(load_model(&config.model)?);

    let raw = std::fs::read_to_string(&profile_path)
        .with_context(|| format!("Failed to read {}", profile_path))?;
    let input = parse_input(&raw).with_context(|| format!("Invalid profile JSON in {}", profile_path))?;

    let output = match input {
        ProfileInput::One(profile) => {
            let result = pipeline.score(&profile)?;
            serde_json::to_string_pretty(&ScoreResponse::from(result))?
        }
        ProfileInput::Many(profiles) => {
            let results = pipeline
                .score_batch(&profiles)
                .map_err(|(index, e)| anyhow::anyhow!("profile {}: {}", index, e))?;
            let responses: Vec<ScoreResponse> =
                results.into_iter().map(ScoreResponse::from).collect();
            serde_json::to_string_pretty(&responses)?
        }
    };

    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"{
        "tenure_months": 24,
        "city_district": "East",
        "avg_customer_rating": 4.8,
        "avg_weekly_earnings": 15000,
        "avg_weekly_trips": 80
    }"#;

    #[test]
    fn test_single_profile_object() {
        match parse_input(PROFILE).unwrap() {
            ProfileInput::One(profile) => {
                assert_eq!(profile.tenure_months, 24);
                assert_eq!(profile.city_district, "East");
                assert!(profile.safety_score.is_none());
            }
            other => panic!("expected one profile, got {:?}", other),
        }
    }

    #[test]
    fn test_profile_array() {
        let raw = format!("[{}, {}]", PROFILE, PROFILE);
        match parse_input(&raw).unwrap() {
            ProfileInput::Many(profiles) => assert_eq!(profiles.len(), 2),
            other => panic!("expected a profile list, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_empty_and_incomplete_input() {
        assert!(parse_input("[]").is_err());
        assert!(parse_input(r#"{"tenure_months": 24}"#).is_err());
        assert!(parse_input("not json").is_err());
    }
}
