//! Totals over the record list, and folding a flat drink log back into
//! daily records.
//!
//! Uses rayon for the log fold/reduce.

use crate::catalog::DrinkCatalog;
use crate::{format_date, non_negative, parse_date, DailyRecord, DrinkEntry};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

pub fn total_caffeine(records: &[DailyRecord]) -> f64 {
    records.iter().map(DailyRecord::safe_caffeine).sum()
}

pub fn total_cost(records: &[DailyRecord]) -> f64 {
    records.iter().map(DailyRecord::safe_cost).sum()
}

pub fn total_drinks(records: &[DailyRecord]) -> usize {
    records.iter().map(DailyRecord::drink_count).sum()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSummary {
    pub total_caffeine: f64,
    pub total_cost: f64,
    pub total_drinks: usize,
    pub total_days: usize,
    pub active_days: usize,
    pub average_caffeine_per_day: f64,
    pub average_cost_per_drink: f64,
    pub max_caffeine_in_single_day: f64,
}

/// Calculate summary statistics
pub fn summarize(records: &[DailyRecord]) -> DataSummary {
    let total_caffeine = total_caffeine(records);
    let total_cost = total_cost(records);
    let total_drinks = total_drinks(records);
    let total_days = records.len();
    let active_days = records.iter().filter(|r| !r.drinks.is_empty()).count();

    let average_caffeine_per_day = if total_days > 0 {
        total_caffeine / total_days as f64
    } else {
        0.0
    };
    let average_cost_per_drink = if total_drinks > 0 {
        total_cost / total_drinks as f64
    } else {
        0.0
    };
    let max_caffeine_in_single_day = records
        .iter()
        .map(DailyRecord::safe_caffeine)
        .fold(0.0_f64, f64::max);

    DataSummary {
        total_caffeine,
        total_cost,
        total_drinks,
        total_days,
        active_days,
        average_caffeine_per_day,
        average_cost_per_drink,
        max_caffeine_in_single_day,
    }
}

/// One drink event from an exported log, before grouping by day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedDrink {
    pub date: String,
    #[serde(rename = "id", alias = "drinkId")]
    pub drink_id: String,
    /// Missing means the catalog's default price.
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Default)]
struct DayAccumulator {
    drinks: Vec<(usize, DrinkEntry)>,
}

impl DayAccumulator {
    fn merge(&mut self, other: DayAccumulator) {
        self.drinks.extend(other.drinks);
    }
}

/// Group a drink log into daily records with recomputed totals, sorted by
/// date. Entries with unparseable dates are dropped. Within a day, drinks
/// keep their log order. Unpriced entries take the catalog's default price,
/// or 0 for an unknown drink.
pub fn aggregate_log<C: DrinkCatalog + Sync + ?Sized>(
    entries: Vec<LoggedDrink>,
    catalog: &C,
) -> Vec<DailyRecord> {
    if entries.is_empty() {
        return Vec::new();
    }

    let day_map: HashMap<String, DayAccumulator> = entries
        .into_par_iter()
        .enumerate()
        .fold(HashMap::new, |mut acc: HashMap<String, DayAccumulator>, (seq, entry)| {
            let Some(date) = parse_date(&entry.date) else {
                warn!(date = %entry.date, "skipping log entry with invalid date");
                return acc;
            };
            let price = entry
                .price
                .or_else(|| catalog.find(&entry.drink_id).map(|d| d.default_price))
                .unwrap_or(0.0);
            acc.entry(format_date(date))
                .or_default()
                .drinks
                .push((
                    seq,
                    DrinkEntry {
                        drink_id: entry.drink_id,
                        price: non_negative(price),
                    },
                ));
            acc
        })
        .reduce(HashMap::new, |mut a, b| {
            for (date, acc) in b {
                a.entry(date).or_default().merge(acc);
            }
            a
        });

    let mut records: Vec<DailyRecord> = Vec::with_capacity(day_map.len());
    records.extend(day_map.into_iter().map(|(date, mut acc)| {
        acc.drinks.sort_by_key(|(seq, _)| *seq);
        let mut record = DailyRecord::new(date);
        record.drinks = acc.drinks.into_iter().map(|(_, d)| d).collect();
        record.recompute_totals(catalog);
        record
    }));

    records.sort_by(|a, b| a.date.cmp(&b.date));
    records
}

/// Merge freshly aggregated records into an existing list: drinks for a
/// date already present are appended, new dates are added.
pub fn merge_records<C: DrinkCatalog + ?Sized>(
    existing: &mut Vec<DailyRecord>,
    incoming: Vec<DailyRecord>,
    catalog: &C,
) {
    for record in incoming {
        match existing.iter_mut().find(|r| r.date == record.date) {
            Some(target) => {
                target.drinks.extend(record.drinks);
                target.recompute_totals(catalog);
            }
            None => existing.push(record),
        }
    }
    existing.sort_by(|a, b| a.date.cmp(&b.date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuiltinCatalog;

    fn mock_record(date: &str, drinks: usize, caffeine: f64, cost: f64) -> DailyRecord {
        DailyRecord {
            date: date.to_string(),
            drinks: (0..drinks)
                .map(|_| DrinkEntry {
                    drink_id: "1".to_string(),
                    price: 1.0,
                })
                .collect(),
            total_caffeine: caffeine,
            total_cost: cost,
        }
    }

    fn logged(date: &str, id: &str, price: f64) -> LoggedDrink {
        LoggedDrink {
            date: date.to_string(),
            drink_id: id.to_string(),
            price: Some(price),
        }
    }

    #[test]
    fn test_totals_empty() {
        assert_eq!(total_caffeine(&[]), 0.0);
        assert_eq!(total_cost(&[]), 0.0);
        assert_eq!(total_drinks(&[]), 0);
    }

    #[test]
    fn test_totals_sum_records() {
        let records = vec![
            mock_record("2025-01-01", 2, 300.0, 6.28),
            mock_record("2025-01-02", 1, 160.0, 2.99),
        ];
        assert_eq!(total_caffeine(&records), 460.0);
        assert!((total_cost(&records) - 9.27).abs() < 1e-9);
        assert_eq!(total_drinks(&records), 3);
    }

    #[test]
    fn test_totals_never_negative() {
        let records = vec![
            mock_record("2025-01-01", 1, -500.0, -10.0),
            mock_record("2025-01-02", 1, 100.0, 1.5),
            mock_record("2025-01-03", 0, f64::NAN, f64::NEG_INFINITY),
        ];
        assert_eq!(total_caffeine(&records), 100.0);
        assert_eq!(total_cost(&records), 1.5);

        let all_negative = vec![mock_record("2025-01-01", 0, -1.0, -1.0)];
        assert!(total_caffeine(&all_negative) >= 0.0);
        assert!(total_cost(&all_negative) >= 0.0);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary, DataSummary::default());
    }

    #[test]
    fn test_summarize_multiple_days() {
        let records = vec![
            mock_record("2025-01-01", 2, 300.0, 4.0),
            mock_record("2025-01-02", 0, 0.0, 0.0),
            mock_record("2025-01-03", 2, 460.0, 4.0),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.total_days, 3);
        assert_eq!(summary.active_days, 2);
        assert_eq!(summary.total_drinks, 4);
        assert!((summary.average_caffeine_per_day - 760.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.average_cost_per_drink, 2.0);
        assert_eq!(summary.max_caffeine_in_single_day, 460.0);
    }

    #[test]
    fn test_aggregate_log_empty() {
        assert!(aggregate_log(Vec::new(), &BuiltinCatalog).is_empty());
    }

    #[test]
    fn test_aggregate_log_groups_by_date() {
        let entries = vec![
            logged("2025-01-02", "1", 2.99),
            logged("2025-01-01", "2", 3.29),
            logged("2025-01-02", "3", 3.49),
        ];
        let records = aggregate_log(entries, &BuiltinCatalog);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, "2025-01-01");
        assert_eq!(records[0].total_caffeine, 140.0);
        assert_eq!(records[1].date, "2025-01-02");
        assert_eq!(records[1].drinks[0].drink_id, "1");
        assert_eq!(records[1].drinks[1].drink_id, "3");
        assert_eq!(records[1].total_caffeine, 320.0);
        assert!((records[1].total_cost - 6.48).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_log_skips_invalid_dates() {
        let entries = vec![logged("not-a-date", "1", 1.0), logged("2025-01-01", "1", 1.0)];
        let records = aggregate_log(entries, &BuiltinCatalog);
        assert_eq!(records.len(), 1);
        assert_eq!(total_drinks(&records), 1);
    }

    #[test]
    fn test_aggregate_log_unpriced_entries_use_catalog_price() {
        let entries: Vec<LoggedDrink> = serde_json::from_str(
            r#"[
                {"date": "2025-01-01", "id": "1"},
                {"date": "2025-01-01", "id": "1", "price": 2.5},
                {"date": "2025-01-01", "id": "unknown"}
            ]"#,
        )
        .unwrap();
        let records = aggregate_log(entries, &BuiltinCatalog);

        let prices: Vec<f64> = records[0].drinks.iter().map(|d| d.price).collect();
        assert!((prices[0] - 1.80).abs() < 1e-9);
        assert_eq!(prices[1], 2.5);
        assert_eq!(prices[2], 0.0);
        assert!((records[0].total_cost - 4.30).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_log_large_dataset_preserves_order() {
        let entries: Vec<LoggedDrink> = (0..1000)
            .map(|i| {
                let id = if i % 2 == 0 { "1" } else { "2" };
                logged(&format!("2025-03-{:02}", (i % 28) + 1), id, 1.0)
            })
            .collect();
        let records = aggregate_log(entries, &BuiltinCatalog);

        assert_eq!(records.len(), 28);
        assert_eq!(total_drinks(&records), 1000);
        // 0, 28, 56, ... land on day 1 and alternate between even ids.
        let first_day: Vec<&str> = records[0]
            .drinks
            .iter()
            .map(|d| d.drink_id.as_str())
            .collect();
        assert_eq!(&first_day[..3], &["1", "1", "1"]);
        assert_eq!(records[1].drinks[0].drink_id, "2");
    }

    #[test]
    fn test_merge_records_appends_same_date() {
        let mut existing = aggregate_log(vec![logged("2025-01-01", "1", 1.0)], &BuiltinCatalog);
        let incoming = aggregate_log(
            vec![logged("2025-01-01", "2", 1.0), logged("2024-12-31", "1", 1.0)],
            &BuiltinCatalog,
        );
        merge_records(&mut existing, incoming, &BuiltinCatalog);

        assert_eq!(existing.len(), 2);
        assert_eq!(existing[0].date, "2024-12-31");
        assert_eq!(existing[1].drinks.len(), 2);
        assert_eq!(existing[1].total_caffeine, 300.0);
    }
}
