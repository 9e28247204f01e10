//! Drop-first one-hot encoding of `city_district`.
//!
//! Indicator columns follow the `<field>_<value>` naming used when the model
//! was trained. The reference category (`East`) has no column of its own, so
//! an all-zero encoding means `East` and nothing else. Values outside the
//! declared categories are rejected instead of encoding to all zeros.

use crate::errors::ScoringError;
use crate::models::CityDistrict;

pub const CITY_DISTRICT: &str = "city_district";

/// Indicator columns for one categorical value.
#[derive(Debug, Clone, PartialEq)]
pub struct Indicators {
    columns: Vec<(String, f64)>,
}

impl Indicators {
    pub fn columns(&self) -> &[(String, f64)] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<(String, f64)> {
        self.columns
    }
}

/// Name of the indicator column for `district`.
pub fn indicator_name(district: CityDistrict) -> String {
    format!("{}_{}", CITY_DISTRICT, district.as_str())
}

/// Encodes a raw district value into `K - 1` indicator columns.
pub fn encode_district(value: &str) -> Result<Indicators, ScoringError> {
    let district = CityDistrict::parse(value).ok_or_else(|| ScoringError::UnknownCategory {
        field: CITY_DISTRICT.to_string(),
        value: value.to_string(),
    })?;

    let columns = CityDistrict::ALL
        .iter()
        .skip(1)
        .map(|candidate| {
            let hot = if *candidate == district { 1.0 } else { 0.0 };
            (indicator_name(*candidate), hot)
        })
        .collect();

    Ok(Indicators { columns })
}
