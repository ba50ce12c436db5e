//! Mutating the record list: logging and removing drinks, keeping each
//! day's totals consistent with its drink list.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::catalog::DrinkCatalog;
use crate::{format_date, non_negative, DailyRecord, DrinkEntry, Goals, Result, TrackerError};

/// Share of the daily limit at which a warning is raised.
pub const APPROACHING_LIMIT_PERCENT: f64 = 75.0;
pub const EXCEEDED_LIMIT_PERCENT: f64 = 100.0;

impl DailyRecord {
    /// Rebuild `total_caffeine` and `total_cost` from the drink list.
    /// Drinks missing from the catalog contribute no caffeine.
    pub fn recompute_totals<C: DrinkCatalog + ?Sized>(&mut self, catalog: &C) {
        let mut caffeine = 0.0;
        let mut cost = 0.0;
        for drink in &self.drinks {
            match catalog.find(&drink.drink_id) {
                Some(entry) => caffeine += non_negative(entry.caffeine),
                None => warn!(
                    date = %self.date,
                    drink_id = %drink.drink_id,
                    "drink not in catalog, counting 0mg caffeine"
                ),
            }
            cost += non_negative(drink.price);
        }
        self.total_caffeine = non_negative(caffeine);
        self.total_cost = non_negative(cost);
    }
}

/// Log `drink_id` on `date`, creating the day's record if needed. Returns
/// the updated record. `price` falls back to the catalog default.
pub fn add_drink<'a, C: DrinkCatalog + ?Sized>(
    records: &'a mut Vec<DailyRecord>,
    date: NaiveDate,
    drink_id: &str,
    price: Option<f64>,
    catalog: &C,
) -> Result<&'a DailyRecord> {
    let entry = catalog
        .find(drink_id)
        .ok_or_else(|| TrackerError::UnknownDrink(drink_id.to_string()))?;
    let price = non_negative(price.unwrap_or(entry.default_price));

    let date_str = format_date(date);
    let index = match records.iter().position(|r| r.date == date_str) {
        Some(index) => index,
        None => {
            records.push(DailyRecord::new(date_str));
            records.len() - 1
        }
    };

    let record = &mut records[index];
    record.drinks.push(DrinkEntry {
        drink_id: entry.id.to_string(),
        price,
    });
    record.recompute_totals(catalog);
    Ok(&records[index])
}

/// Remove the drink at `index` from `date`'s record. The record itself is
/// kept even when it ends up empty.
pub fn remove_drink<C: DrinkCatalog + ?Sized>(
    records: &mut [DailyRecord],
    date: NaiveDate,
    index: usize,
    catalog: &C,
) -> Result<DrinkEntry> {
    let date_str = format_date(date);
    let not_found = || TrackerError::DrinkNotFound {
        date: date_str.clone(),
        index,
    };

    let record = records
        .iter_mut()
        .find(|r| r.date == date_str)
        .ok_or_else(not_found)?;
    if index >= record.drinks.len() {
        return Err(not_found());
    }

    let removed = record.drinks.remove(index);
    record.recompute_totals(catalog);
    Ok(removed)
}

pub fn record_for(records: &[DailyRecord], date: NaiveDate) -> Option<&DailyRecord> {
    let date_str = format_date(date);
    records.iter().find(|r| r.date == date_str)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LimitStatus {
    Disabled,
    WithinLimit { percent: f64 },
    Approaching { percent: f64 },
    Exceeded { percent: f64 },
}

/// A limit that is not a positive finite number disables the check.
pub fn check_daily_limit(goals: &Goals, caffeine_today: f64) -> LimitStatus {
    let limit_usable = goals.daily_limit.is_finite() && goals.daily_limit > 0.0;
    if !goals.enable_daily_limit || !goals.enable_notifications || !limit_usable {
        return LimitStatus::Disabled;
    }

    let percent = non_negative(caffeine_today) / goals.daily_limit * 100.0;
    if percent >= EXCEEDED_LIMIT_PERCENT {
        LimitStatus::Exceeded { percent }
    } else if percent >= APPROACHING_LIMIT_PERCENT {
        LimitStatus::Approaching { percent }
    } else {
        LimitStatus::WithinLimit { percent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuiltinCatalog;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn test_add_drink_creates_record() {
        let mut records = Vec::new();
        let record = add_drink(&mut records, day(1), "1", None, &BuiltinCatalog).unwrap();
        assert_eq!(record.date, "2025-01-01");
        assert_eq!(record.total_caffeine, 160.0);
        assert!((record.total_cost - 1.80).abs() < 1e-9);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_add_drink_appends_to_existing_day() {
        let mut records = Vec::new();
        add_drink(&mut records, day(1), "1", Some(2.99), &BuiltinCatalog).unwrap();
        add_drink(&mut records, day(1), "2", Some(3.29), &BuiltinCatalog).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].drinks.len(), 2);
        assert_eq!(records[0].drinks[1].drink_id, "2");
        assert_eq!(records[0].total_caffeine, 300.0);
        assert!((records[0].total_cost - 6.28).abs() < 1e-9);
    }

    #[test]
    fn test_add_drink_negative_price_clamped() {
        let mut records = Vec::new();
        let record = add_drink(&mut records, day(1), "5", Some(-4.0), &BuiltinCatalog).unwrap();
        assert_eq!(record.drinks[0].price, 0.0);
        assert_eq!(record.total_cost, 0.0);
    }

    #[test]
    fn test_add_unknown_drink_fails() {
        let mut records = Vec::new();
        let err = add_drink(&mut records, day(1), "42", None, &BuiltinCatalog).unwrap_err();
        assert!(matches!(err, TrackerError::UnknownDrink(id) if id == "42"));
        assert!(records.is_empty());
    }

    #[test]
    fn test_remove_drink_recomputes_and_keeps_record() {
        let mut records = Vec::new();
        add_drink(&mut records, day(2), "1", Some(2.0), &BuiltinCatalog).unwrap();
        add_drink(&mut records, day(2), "2", Some(3.0), &BuiltinCatalog).unwrap();

        let removed = remove_drink(&mut records, day(2), 0, &BuiltinCatalog).unwrap();
        assert_eq!(removed.drink_id, "1");
        assert_eq!(records[0].total_caffeine, 140.0);
        assert!((records[0].total_cost - 3.0).abs() < 1e-9);

        remove_drink(&mut records, day(2), 0, &BuiltinCatalog).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].drinks.is_empty());
        assert_eq!(records[0].total_caffeine, 0.0);
        assert_eq!(records[0].total_cost, 0.0);
    }

    #[test]
    fn test_remove_repairs_corrupted_totals() {
        let mut records = vec![DailyRecord {
            date: "2025-01-03".to_string(),
            drinks: vec![
                DrinkEntry {
                    drink_id: "1".to_string(),
                    price: 1.0,
                },
                DrinkEntry {
                    drink_id: "3".to_string(),
                    price: 1.0,
                },
            ],
            total_caffeine: 10.0,
            total_cost: -5.0,
        }];
        remove_drink(&mut records, day(3), 1, &BuiltinCatalog).unwrap();
        assert_eq!(records[0].total_caffeine, 160.0);
        assert_eq!(records[0].total_cost, 1.0);
    }

    #[test]
    fn test_remove_drink_out_of_range() {
        let mut records = Vec::new();
        add_drink(&mut records, day(4), "1", None, &BuiltinCatalog).unwrap();
        assert!(matches!(
            remove_drink(&mut records, day(4), 3, &BuiltinCatalog),
            Err(TrackerError::DrinkNotFound { index: 3, .. })
        ));
        assert!(matches!(
            remove_drink(&mut records, day(5), 0, &BuiltinCatalog),
            Err(TrackerError::DrinkNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_catalog_id_counts_zero_caffeine() {
        let mut record = DailyRecord::new("2025-01-01");
        record.drinks.push(DrinkEntry {
            drink_id: "legacy".to_string(),
            price: 2.5,
        });
        record.recompute_totals(&BuiltinCatalog);
        assert_eq!(record.total_caffeine, 0.0);
        assert_eq!(record.total_cost, 2.5);
    }

    #[test]
    fn test_check_daily_limit_levels() {
        let goals = Goals::default();
        assert_eq!(
            check_daily_limit(&goals, 100.0),
            LimitStatus::WithinLimit { percent: 25.0 }
        );
        assert_eq!(
            check_daily_limit(&goals, 300.0),
            LimitStatus::Approaching { percent: 75.0 }
        );
        assert_eq!(
            check_daily_limit(&goals, 400.0),
            LimitStatus::Exceeded { percent: 100.0 }
        );
    }

    #[test]
    fn test_check_daily_limit_disabled() {
        let mut goals = Goals::default();
        goals.enable_notifications = false;
        assert_eq!(check_daily_limit(&goals, 900.0), LimitStatus::Disabled);

        let goals = Goals {
            daily_limit: 0.0,
            ..Goals::default()
        };
        assert_eq!(check_daily_limit(&goals, 900.0), LimitStatus::Disabled);
    }

    #[test]
    fn test_check_daily_limit_non_finite_limit_is_disabled() {
        for daily_limit in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -100.0] {
            let goals = Goals {
                daily_limit,
                ..Goals::default()
            };
            assert_eq!(check_daily_limit(&goals, 900.0), LimitStatus::Disabled);
        }
    }

    #[test]
    fn test_check_daily_limit_negative_caffeine() {
        assert_eq!(
            check_daily_limit(&Goals::default(), -50.0),
            LimitStatus::WithinLimit { percent: 0.0 }
        );
    }
}
