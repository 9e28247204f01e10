/// Property-based tests using proptest
/// Invariants of the scoring pipeline that should hold for all valid profiles
mod common;

use common::{fixture_pipeline, TRAINING_COLUMNS};
use nova_score_api::alignment::{align, EncodedRecord, TrainingSchema};
use nova_score_api::models::{PartnerProfile, ScoreResult};
use proptest::prelude::*;

fn district() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["East", "North", "South", "West"])
}

prop_compose! {
    fn valid_profile()(
        tenure_months in 1u32..=120,
        city_district in district(),
        avg_customer_rating in 1.0f64..=5.0,
        avg_weekly_earnings in 1.0f64..50_000.0,
        avg_weekly_trips in 1u32..=500,
        safety_score in prop::option::of(0.0f64..=100.0),
        grab_pay_usage_rate in prop::option::of(0.0f64..=1.0),
        peak_hour_percentage in prop::option::of(0.0f64..=1.0),
        acceptance_rate in prop::option::of(0.0f64..=1.0),
        cancellation_rate in prop::option::of(0.0f64..=1.0),
        earnings_stability_score in prop::option::of(0.0f64..10_000.0),
    ) -> PartnerProfile {
        PartnerProfile {
            tenure_months,
            city_district: city_district.to_string(),
            avg_customer_rating,
            avg_weekly_earnings,
            avg_weekly_trips,
            safety_score,
            grab_pay_usage_rate,
            peak_hour_percentage,
            acceptance_rate,
            cancellation_rate,
            earnings_stability_score,
        }
    }
}

// Property: aligned vectors always match the training schema
proptest! {
    #[test]
    fn feature_vector_matches_schema(profile in valid_profile()) {
        let pipeline = fixture_pipeline();
        let vector = pipeline.prepare(&profile).unwrap();

        prop_assert_eq!(vector.len(), TRAINING_COLUMNS.len());
        for (i, name) in vector.names().iter().enumerate() {
            prop_assert_eq!(name.as_str(), TRAINING_COLUMNS[i]);
        }
        prop_assert!(vector.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn indicator_columns_are_binary_with_at_most_one_hot(profile in valid_profile()) {
        let pipeline = fixture_pipeline();
        let vector = pipeline.prepare(&profile).unwrap();

        let indicators: Vec<f64> = vector
            .iter()
            .filter(|(name, _)| name.starts_with("city_district_"))
            .map(|(_, v)| v)
            .collect();

        prop_assert_eq!(indicators.len(), 3);
        prop_assert!(indicators.iter().all(|v| *v == 0.0 || *v == 1.0));
        let hot = indicators.iter().filter(|v| **v == 1.0).count();
        prop_assert_eq!(hot, if profile.city_district == "East" { 0 } else { 1 });
    }
}

// Property: scores are bounded, consistent and deterministic
proptest! {
    #[test]
    fn score_in_range_and_consistent(profile in valid_profile()) {
        let pipeline = fixture_pipeline();
        let result = pipeline.score(&profile).unwrap();

        prop_assert!((300..=850).contains(&result.nova_score));
        prop_assert!((0.0..=1.0).contains(&result.repayment_probability));
        let expected = 300 + (result.repayment_probability * 550.0).round() as u16;
        prop_assert_eq!(result.nova_score, expected);
    }

    #[test]
    fn scoring_is_idempotent(profile in valid_profile()) {
        let pipeline = fixture_pipeline();
        let first = pipeline.score(&profile).unwrap();
        let second = pipeline.score(&profile.clone()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn probability_mapping_never_leaves_range(p in prop::num::f64::NORMAL | prop::num::f64::ZERO) {
        let result = ScoreResult::from_probability(p);
        prop_assert!((300..=850).contains(&result.nova_score));
        prop_assert_eq!(
            result.nova_score,
            300 + (result.repayment_probability * 550.0).round() as u16
        );
    }
}

// Property: alignment handles arbitrary record shapes
proptest! {
    #[test]
    fn alignment_is_total_over_shapes(
        present in prop::collection::vec(any::<bool>(), TRAINING_COLUMNS.len()),
        extras in prop::collection::vec("[a-z]{1,8}_extra", 0..5),
        values in prop::collection::vec(-1.0e6f64..1.0e6, TRAINING_COLUMNS.len()),
    ) {
        let schema = TrainingSchema::new(TRAINING_COLUMNS.iter().map(|s| s.to_string()).collect()).unwrap();

        // Insert in reverse to make sure order comes from the schema
        let mut record = EncodedRecord::new();
        for i in (0..TRAINING_COLUMNS.len()).rev() {
            if present[i] {
                record.insert(TRAINING_COLUMNS[i], values[i]);
            }
        }
        for extra in &extras {
            record.insert(extra.as_str(), 1.0);
        }

        let vector = align(&record, &schema).unwrap();

        prop_assert_eq!(vector.len(), schema.len());
        for i in 0..TRAINING_COLUMNS.len() {
            let expected = if present[i] { values[i] } else { 0.0 };
            prop_assert_eq!(vector.values()[i], expected);
        }
    }
}
