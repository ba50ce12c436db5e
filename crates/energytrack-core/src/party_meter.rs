//! Widmark-based estimate of how many drinks reach a target blood alcohol
//! concentration after a given number of hours.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, TrackerError};

/// g/100mL eliminated per hour.
pub const ELIMINATION_RATE: f64 = 0.015;
/// g/mL.
pub const ETHANOL_DENSITY: f64 = 0.789;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    /// Widmark body-water distribution coefficient.
    pub fn distribution_coefficient(self) -> f64 {
        match self {
            Sex::Male => 0.68,
            Sex::Female => 0.55,
        }
    }
}

impl FromStr for Sex {
    type Err = TrackerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            _ => Err(TrackerError::InvalidSex(s.to_string())),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyMeterInput {
    /// Target BAC, g/100mL.
    pub target_bac: f64,
    pub hours: f64,
    pub weight_kg: f64,
    pub sex: Sex,
    pub volume_ml: f64,
    pub abv_percent: f64,
}

impl PartyMeterInput {
    /// Check the inputs against the ranges the entry form accepts. The
    /// estimate itself does not call this.
    pub fn validate(&self) -> Result<()> {
        check_range("weight", self.weight_kg, 30.0, 200.0)?;
        check_range("alcohol percent", self.abv_percent, 1.0, 80.0)?;
        check_range("volume", self.volume_ml, 20.0, 1000.0)?;
        check_range("hours", self.hours, 1.0, 12.0)?;
        check_range("target level", self.target_bac, f64::MIN_POSITIVE, 0.5)?;
        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(TrackerError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

/// Grams of absorbed alcohol needed to sit at `target_bac` after `hours`.
pub fn grams_needed(input: &PartyMeterInput) -> f64 {
    let r = input.sex.distribution_coefficient();
    ((input.target_bac + ELIMINATION_RATE * input.hours) * (r * input.weight_kg)) / 0.1
}

pub fn grams_per_drink(volume_ml: f64, abv_percent: f64) -> f64 {
    volume_ml * (abv_percent / 100.0) * ETHANOL_DENSITY
}

/// Number of drinks of the given size and strength needed to reach the
/// target. Returns 0 when a drink carries no alcohol.
pub fn drinks_to_target(input: &PartyMeterInput) -> f64 {
    let per_drink = grams_per_drink(input.volume_ml, input.abv_percent);
    if per_drink == 0.0 {
        return 0.0;
    }
    grams_needed(input) / per_drink
}
