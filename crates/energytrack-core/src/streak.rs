use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::DailyRecord;

/// How the current streak walks back from today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StreakRule {
    /// Strictly consecutive calendar days ending today, or ending yesterday
    /// when nothing has been logged yet today.
    #[default]
    Consecutive,
    /// Walk dates newest-first, accepting each one while its distance from
    /// the previously accepted date is at most `streak + 1` days. Short
    /// gaps do not break the streak under this rule.
    GapTolerant,
}

impl FromStr for StreakRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "consecutive" | "strict" => Ok(Self::Consecutive),
            "gap-tolerant" | "gap_tolerant" | "lenient" => Ok(Self::GapTolerant),
            other => Err(format!("unknown streak rule '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakStats {
    pub current: u32,
    pub best: u32,
    pub active_days: u32,
}

/// Dates with at least one drink. A record emptied by deletions does not
/// count toward any streak.
fn distinct_dates(records: &[DailyRecord]) -> BTreeSet<NaiveDate> {
    records
        .iter()
        .filter(|r| !r.drinks.is_empty())
        .filter_map(DailyRecord::parsed_date)
        .collect()
}

pub fn current_streak(records: &[DailyRecord], today: NaiveDate, rule: StreakRule) -> u32 {
    let dates = distinct_dates(records);
    if dates.is_empty() {
        return 0;
    }

    match rule {
        StreakRule::Consecutive => consecutive_from(&dates, today),
        StreakRule::GapTolerant => gap_tolerant_from(&dates, today),
    }
}

fn consecutive_from(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut check_date = if dates.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0u32;
    while dates.contains(&check_date) {
        streak += 1;
        check_date -= Duration::days(1);
    }
    streak
}

fn gap_tolerant_from(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0u32;
    let mut anchor = today;

    for &date in dates.iter().rev() {
        let diff = (anchor - date).num_days().unsigned_abs();
        if diff <= u64::from(streak) + 1 {
            streak += 1;
            anchor = date;
        } else {
            break;
        }
    }
    streak
}

/// Longest run of consecutive calendar days anywhere in the history.
pub fn best_streak(records: &[DailyRecord]) -> u32 {
    let dates = distinct_dates(records);

    let mut best = 0u32;
    let mut streak = 0u32;
    let mut prev_date: Option<NaiveDate> = None;

    for date in dates {
        streak = match prev_date {
            Some(prev) if date == prev + Duration::days(1) => streak + 1,
            _ => 1,
        };
        best = best.max(streak);
        prev_date = Some(date);
    }
    best
}

pub fn streak_stats(records: &[DailyRecord], today: NaiveDate, rule: StreakRule) -> StreakStats {
    StreakStats {
        current: current_streak(records, today, rule),
        best: best_streak(records),
        active_days: distinct_dates(records).len() as u32,
    }
}
