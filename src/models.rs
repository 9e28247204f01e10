use serde::{Deserialize, Serialize};
use std::fmt;

// ============ Pipeline Input ============

/// Raw partner attributes as supplied by a caller.
///
/// The five identity/financial fields are mandatory. Behavioral fields are
/// optional at the boundary and get filled in by feature completion.
/// Rates are fractions in `[0, 1]`; callers working in percentages must
/// convert before building a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerProfile {
    /// Months since the partner joined (domain: >= 1).
    pub tenure_months: u32,
    /// Primary operating district. Kept as raw text so the encoder can
    /// reject values outside the declared categories.
    pub city_district: String,
    /// Average customer rating (domain: [1.0, 5.0]).
    pub avg_customer_rating: f64,
    /// Average weekly earnings (domain: > 0).
    pub avg_weekly_earnings: f64,
    /// Average weekly trips (domain: > 0).
    pub avg_weekly_trips: u32,
    /// Safety score (domain: [0, 100]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<f64>,
    /// Share of payments made through the in-app wallet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grab_pay_usage_rate: Option<f64>,
    /// Share of driving done during peak hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_hour_percentage: Option<f64>,
    /// Share of offered jobs accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_rate: Option<f64>,
    /// Share of accepted jobs cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_rate: Option<f64>,
    /// Earnings stability score (domain: >= 0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earnings_stability_score: Option<f64>,
}

impl PartnerProfile {
    /// Builds a profile carrying only the five mandatory attributes.
    pub fn minimal(
        tenure_months: u32,
        city_district: impl Into<String>,
        avg_customer_rating: f64,
        avg_weekly_earnings: f64,
        avg_weekly_trips: u32,
    ) -> Self {
        Self {
            tenure_months,
            city_district: city_district.into(),
            avg_customer_rating,
            avg_weekly_earnings,
            avg_weekly_trips,
            safety_score: None,
            grab_pay_usage_rate: None,
            peak_hour_percentage: None,
            acceptance_rate: None,
            cancellation_rate: None,
            earnings_stability_score: None,
        }
    }
}

/// Nominal values of `city_district`, in declared order.
///
/// The first variant is the reference category dropped by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CityDistrict {
    East,
    North,
    South,
    West,
}

impl CityDistrict {
    /// All categories in declared order.
    pub const ALL: [CityDistrict; 4] = [
        CityDistrict::East,
        CityDistrict::North,
        CityDistrict::South,
        CityDistrict::West,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CityDistrict::East => "East",
            CityDistrict::North => "North",
            CityDistrict::South => "South",
            CityDistrict::West => "West",
        }
    }

    /// Exact, case-sensitive lookup of a raw district value.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == value)
    }
}

impl fmt::Display for CityDistrict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A profile with every behavioral attribute populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedProfile {
    pub tenure_months: u32,
    pub city_district: String,
    pub avg_customer_rating: f64,
    pub avg_weekly_earnings: f64,
    pub avg_weekly_trips: u32,
    pub safety_score: f64,
    pub grab_pay_usage_rate: f64,
    pub peak_hour_percentage: f64,
    pub acceptance_rate: f64,
    pub cancellation_rate: f64,
    pub earnings_stability_score: f64,
}

// ============ Pipeline Output ============

/// Lowest Nova Score.
pub const NOVA_SCORE_MIN: u16 = 300;
/// Highest Nova Score.
pub const NOVA_SCORE_MAX: u16 = 850;

/// Final pipeline output.
///
/// `nova_score == 300 + round(repayment_probability * 550)` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub nova_score: u16,
    pub repayment_probability: f64,
}

impl ScoreResult {
    /// Maps a repayment probability onto the score range.
    ///
    /// The probability is clamped to `[0, 1]` first so the score stays in
    /// `[300, 850]`. Callers must reject non-finite probabilities.
    pub fn from_probability(probability: f64) -> Self {
        let repayment_probability = probability.clamp(0.0, 1.0);
        let span = f64::from(NOVA_SCORE_MAX - NOVA_SCORE_MIN);
        let nova_score = NOVA_SCORE_MIN + (repayment_probability * span).round() as u16;
        Self {
            nova_score,
            repayment_probability,
        }
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.nova_score)
    }

    /// Probability rendered the way the legacy API did, e.g. `"64.57%"`.
    pub fn repayment_percentage(&self) -> String {
        format!("{:.2}%", self.repayment_probability * 100.0)
    }
}

/// Coarse risk band shown on the score gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    /// 300..580
    Poor,
    /// 580..670
    Fair,
    /// 670..=850
    Good,
}

impl ScoreBand {
    pub fn from_score(score: u16) -> Self {
        match score {
            s if s < 580 => ScoreBand::Poor,
            s if s < 670 => ScoreBand::Fair,
            _ => ScoreBand::Good,
        }
    }
}

// ============ API Models ============

/// Response body for a scored profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub nova_score: u16,
    pub repayment_probability: f64,
    pub repayment_percentage: String,
    pub score_band: ScoreBand,
}

impl From<ScoreResult> for ScoreResponse {
    fn from(result: ScoreResult) -> Self {
        Self {
            nova_score: result.nova_score,
            repayment_probability: result.repayment_probability,
            repayment_percentage: result.repayment_percentage(),
            score_band: result.band(),
        }
    }
}

/// Request body for batch scoring.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchScoreRequest {
    pub profiles: Vec<PartnerProfile>,
}

/// Response body for batch scoring, in request order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchScoreResponse {
    pub results: Vec<ScoreResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_profile_deserializes() {
        let json = r#"
        {
            "tenure_months": 24,
            "city_district": "East",
            "avg_customer_rating": 4.8,
            "avg_weekly_earnings": 15000,
            "avg_weekly_trips": 80
        }
        "#;

        let profile: PartnerProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile, PartnerProfile::minimal(24, "East", 4.8, 15000.0, 80));
        assert!(profile.safety_score.is_none());
    }

    #[test]
    fn test_unknown_district_survives_deserialization() {
        let json = r#"{"tenure_months": 1, "city_district": "Unknown",
            "avg_customer_rating": 4.5, "avg_weekly_earnings": 9000, "avg_weekly_trips": 30}"#;

        let profile: PartnerProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.city_district, "Unknown");
        assert_eq!(CityDistrict::parse(&profile.city_district), None);
    }

    #[test]
    fn test_district_parse_is_exact() {
        assert_eq!(CityDistrict::parse("South"), Some(CityDistrict::South));
        assert_eq!(CityDistrict::parse("south"), None);
        assert_eq!(CityDistrict::parse(" South"), None);
    }

    #[test]
    fn test_score_bounds() {
        assert_eq!(ScoreResult::from_probability(0.0).nova_score, 300);
        assert_eq!(ScoreResult::from_probability(1.0).nova_score, 850);
        assert_eq!(ScoreResult::from_probability(0.5).nova_score, 575);
        assert_eq!(ScoreResult::from_probability(1.7).nova_score, 850);
        assert_eq!(ScoreResult::from_probability(-0.2).repayment_probability, 0.0);
    }

    #[test]
    fn test_score_rounds_to_nearest() {
        // 0.6456563 * 550 = 355.11
        assert_eq!(ScoreResult::from_probability(0.6456563062257954).nova_score, 655);
        // 0.4501660 * 550 = 247.59
        assert_eq!(ScoreResult::from_probability(0.45016600268752205).nova_score, 548);
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(ScoreBand::from_score(300), ScoreBand::Poor);
        assert_eq!(ScoreBand::from_score(579), ScoreBand::Poor);
        assert_eq!(ScoreBand::from_score(580), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(669), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(670), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(850), ScoreBand::Good);
    }

    #[test]
    fn test_response_renders_percentage() {
        let response = ScoreResponse::from(ScoreResult::from_probability(0.6456563062257954));
        assert_eq!(response.repayment_percentage, "64.57%");
        assert_eq!(response.score_band, ScoreBand::Fair);
    }
}
