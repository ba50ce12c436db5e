#![deny(clippy::all)]

mod aggregator;
pub mod cache;
pub mod catalog;
pub mod chart;
mod error;
pub mod insights;
pub mod ledger;
pub mod level;
pub mod party_meter;
pub mod streak;

pub use aggregator::*;
pub use error::{Result, TrackerError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One logged drink inside a day. `drink_id` references the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrinkEntry {
    #[serde(rename = "id", alias = "drinkId")]
    pub drink_id: String,
    #[serde(default)]
    pub price: f64,
}

/// One calendar day with at least one logged drink, in the shape the
/// `/api/consumption` endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    pub date: String,
    #[serde(default)]
    pub drinks: Vec<DrinkEntry>,
    #[serde(default)]
    pub total_caffeine: f64,
    #[serde(default)]
    pub total_cost: f64,
}

impl DailyRecord {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            drinks: Vec::new(),
            total_caffeine: 0.0,
            total_cost: 0.0,
        }
    }

    /// The record's date, or `None` when the stored string is not a valid
    /// ISO date.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    pub fn drink_count(&self) -> usize {
        self.drinks.len()
    }

    pub fn safe_caffeine(&self) -> f64 {
        non_negative(self.total_caffeine)
    }

    pub fn safe_cost(&self) -> f64 {
        non_negative(self.total_cost)
    }
}

/// Daily caffeine goal as stored by the backend (`/api/goals`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goals {
    #[serde(default = "default_true")]
    pub enable_daily_limit: bool,
    #[serde(default = "default_daily_limit")]
    pub daily_limit: f64,
    #[serde(default = "default_limit_type")]
    pub limit_type: String,
    #[serde(default = "default_true")]
    pub enable_notifications: bool,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            enable_daily_limit: true,
            daily_limit: default_daily_limit(),
            limit_type: default_limit_type(),
            enable_notifications: true,
        }
    }
}

/// Display preferences as stored by the backend (`/api/settings`).
/// Not interpreted by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub dark_mode_contrast: String,
    pub animation_intensity: String,
    pub reduced_motion: bool,
    pub auto_refresh: bool,
    pub show_advanced_stats: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode_contrast: "normal".to_string(),
            animation_intensity: "normal".to_string(),
            reduced_motion: false,
            auto_refresh: true,
            show_advanced_stats: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_daily_limit() -> f64 {
    400.0
}

fn default_limit_type() -> String {
    "daily".to_string()
}

pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str, DATE_FORMAT).ok()
}

/// Like [`parse_date`], but reports the offending input.
pub fn parse_date_strict(date_str: &str) -> Result<NaiveDate> {
    parse_date(date_str.trim()).ok_or_else(|| TrackerError::InvalidDate(date_str.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Clamp to zero, treating NaN and infinities as zero.
pub(crate) fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parse a JSON array of daily records.
pub fn load_records(json: &str) -> Result<Vec<DailyRecord>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(json)?)
}

pub fn records_to_json(records: &[DailyRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_strict() {
        assert_eq!(
            parse_date_strict(" 2025-02-28 ").unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert!(matches!(
            parse_date_strict("2025-02-30"),
            Err(TrackerError::InvalidDate(s)) if s == "2025-02-30"
        ));
    }

    #[test]
    fn test_load_records_backend_shape() {
        let json = r#"[
            {"date": "2025-01-01", "drinks": [{"id": "1", "price": 2.99}, {"id": "2", "price": 3.29}],
             "totalCaffeine": 300, "totalCost": 6.28, "username": "alice"}
        ]"#;
        let records = load_records(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].drinks[1].drink_id, "2");
        assert_eq!(records[0].total_caffeine, 300.0);
        assert!((records[0].total_cost - 6.28).abs() < 1e-9);
    }

    #[test]
    fn test_load_records_missing_fields_default_to_zero() {
        let records = load_records(r#"[{"date": "2025-01-01"}]"#).unwrap();
        assert!(records[0].drinks.is_empty());
        assert_eq!(records[0].total_caffeine, 0.0);
        assert_eq!(records[0].total_cost, 0.0);
    }

    #[test]
    fn test_load_records_accepts_drink_id_alias() {
        let records =
            load_records(r#"[{"date": "2025-01-01", "drinks": [{"drinkId": "3"}]}]"#).unwrap();
        assert_eq!(records[0].drinks[0].drink_id, "3");
        assert_eq!(records[0].drinks[0].price, 0.0);
    }

    #[test]
    fn test_load_records_empty_input() {
        assert!(load_records("").unwrap().is_empty());
        assert!(load_records("[]").unwrap().is_empty());
    }

    #[test]
    fn test_load_records_malformed() {
        let err = load_records("{not json").unwrap_err();
        assert!(matches!(err, TrackerError::Json(_)));
    }

    #[test]
    fn test_records_serialize_with_backend_field_names() {
        let mut record = DailyRecord::new("2025-02-01");
        record.drinks.push(DrinkEntry {
            drink_id: "1".to_string(),
            price: 1.8,
        });
        let json = records_to_json(&[record]).unwrap();
        assert!(json.contains("\"totalCaffeine\""));
        assert!(json.contains("\"id\": \"1\""));
        assert!(!json.contains("drinkId"));
    }

    #[test]
    fn test_safe_values_clamp_negative_and_nan() {
        let mut record = DailyRecord::new("2025-01-01");
        record.total_caffeine = -40.0;
        record.total_cost = f64::NAN;
        assert_eq!(record.safe_caffeine(), 0.0);
        assert_eq!(record.safe_cost(), 0.0);
    }

    #[test]
    fn test_goals_defaults_match_backend() {
        let goals: Goals = serde_json::from_str("{}").unwrap();
        assert_eq!(goals, Goals::default());
        assert_eq!(goals.daily_limit, 400.0);
        assert_eq!(goals.limit_type, "daily");
    }

    #[test]
    fn test_settings_round_trip_camel_case() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains("\"darkModeContrast\":\"normal\""));
        assert!(json.contains("\"showAdvancedStats\":true"));
    }

    #[test]
    fn test_parsed_date_rejects_garbage() {
        assert!(DailyRecord::new("yesterday").parsed_date().is_none());
        assert_eq!(
            DailyRecord::new("2025-03-04").parsed_date(),
            NaiveDate::from_ymd_opt(2025, 3, 4)
        );
    }
}
