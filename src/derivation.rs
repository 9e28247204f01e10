//! Secondary features computed from the completed profile.

use crate::errors::ScoringError;
use crate::models::CompletedProfile;

pub const EARNINGS_PER_TRIP: &str = "earnings_per_trip";
pub const RATING_X_TENURE: &str = "rating_x_tenure";

/// Derived columns appended after the primary attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFeatures {
    pub earnings_per_trip: f64,
    pub rating_x_tenure: f64,
}

impl DerivedFeatures {
    /// Column name / value pairs in append order.
    pub fn columns(&self) -> [(&'static str, f64); 2] {
        [
            (EARNINGS_PER_TRIP, self.earnings_per_trip),
            (RATING_X_TENURE, self.rating_x_tenure),
        ]
    }
}

/// Computes `earnings_per_trip` and `rating_x_tenure`.
///
/// Input is externally supplied, so a zero trip count is guarded here even
/// though the domain requires at least one trip.
pub fn derive(profile: &CompletedProfile) -> Result<DerivedFeatures, ScoringError> {
    if profile.avg_weekly_trips == 0 {
        return Err(ScoringError::DivisionByZero);
    }

    Ok(DerivedFeatures {
        earnings_per_trip: profile.avg_weekly_earnings / f64::from(profile.avg_weekly_trips),
        rating_x_tenure: profile.avg_customer_rating * f64::from(profile.tenure_months),
    })
}
