//! Feature completion: fills behavioral attributes the caller left out.
//!
//! The constants are population averages. Supplied values always win.

use crate::models::{CompletedProfile, PartnerProfile};

pub const DEFAULT_SAFETY_SCORE: f64 = 85.0;
pub const DEFAULT_GRAB_PAY_USAGE_RATE: f64 = 0.5;
pub const DEFAULT_PEAK_HOUR_PERCENTAGE: f64 = 0.5;
pub const DEFAULT_ACCEPTANCE_RATE: f64 = 0.95;
pub const DEFAULT_CANCELLATION_RATE: f64 = 0.05;
pub const DEFAULT_EARNINGS_STABILITY_SCORE: f64 = 2000.0;

/// Returns a fully-populated copy of `profile`.
pub fn complete(profile: &PartnerProfile) -> CompletedProfile {
    CompletedProfile {
        tenure_months: profile.tenure_months,
        city_district: profile.city_district.clone(),
        avg_customer_rating: profile.avg_customer_rating,
        avg_weekly_earnings: profile.avg_weekly_earnings,
        avg_weekly_trips: profile.avg_weekly_trips,
        safety_score: profile.safety_score.unwrap_or(DEFAULT_SAFETY_SCORE),
        grab_pay_usage_rate: profile
            .grab_pay_usage_rate
            .unwrap_or(DEFAULT_GRAB_PAY_USAGE_RATE),
        peak_hour_percentage: profile
            .peak_hour_percentage
            .unwrap_or(DEFAULT_PEAK_HOUR_PERCENTAGE),
        acceptance_rate: profile.acceptance_rate.unwrap_or(DEFAULT_ACCEPTANCE_RATE),
        cancellation_rate: profile
            .cancellation_rate
            .unwrap_or(DEFAULT_CANCELLATION_RATE),
        earnings_stability_score: profile
            .earnings_stability_score
            .unwrap_or(DEFAULT_EARNINGS_STABILITY_SCORE),
    }
}
