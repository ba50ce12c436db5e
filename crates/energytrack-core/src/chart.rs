//! Fixed-length, chart-ready series: one bucket per day of the current
//! month or one per month of the current year.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::{format_date, non_negative, DailyRecord, TrackerError};

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartView {
    #[default]
    Daily,
    Annual,
}

impl FromStr for ChartView {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "annual" | "yearly" => Ok(Self::Annual),
            _ => Err(TrackerError::InvalidView(s.to_string())),
        }
    }
}

impl fmt::Display for ChartView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Annual => write!(f, "annual"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBucket {
    /// `YYYY-MM-DD` for daily buckets, `YYYY-MM` for monthly ones.
    pub key: String,
    pub label: String,
    pub drink_count: usize,
    pub caffeine: f64,
    pub cost: f64,
}

impl ChartBucket {
    fn empty(key: String, label: String) -> Self {
        Self {
            key,
            label,
            drink_count: 0,
            caffeine: 0.0,
            cost: 0.0,
        }
    }
}

pub fn chart_data(records: &[DailyRecord], view: ChartView, today: NaiveDate) -> Vec<ChartBucket> {
    match view {
        ChartView::Daily => daily_buckets(records, today),
        ChartView::Annual => annual_buckets(records, today.year()),
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

fn daily_buckets(records: &[DailyRecord], today: NaiveDate) -> Vec<ChartBucket> {
    let (year, month) = (today.year(), today.month());

    (1..=days_in_month(year, month))
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .map(|date| {
            let key = format_date(date);
            let label = date.day().to_string();
            match records.iter().find(|r| r.date == key) {
                Some(record) => ChartBucket {
                    key,
                    label,
                    drink_count: record.drink_count(),
                    caffeine: record.safe_caffeine(),
                    cost: record.safe_cost(),
                },
                None => ChartBucket::empty(key, label),
            }
        })
        .collect()
}

fn annual_buckets(records: &[DailyRecord], year: i32) -> Vec<ChartBucket> {
    let mut buckets: Vec<ChartBucket> = MONTH_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| ChartBucket::empty(format!("{year}-{:02}", i + 1), label.to_string()))
        .collect();

    for record in records {
        let Some(date) = record.parsed_date() else {
            continue;
        };
        if date.year() != year {
            continue;
        }
        let bucket = &mut buckets[date.month0() as usize];
        bucket.drink_count += record.drink_count();
        bucket.caffeine += record.safe_caffeine();
        bucket.cost += record.safe_cost();
    }

    for bucket in &mut buckets {
        bucket.caffeine = non_negative(bucket.caffeine);
        bucket.cost = non_negative(bucket.cost);
    }
    buckets
}
