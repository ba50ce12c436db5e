//! Rule-based consumption insights: tolerance, spending, streak outlook,
//! weekday trends, goal suggestions and anomaly detection.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::cache::{cache_key, memoize, ComputationCache};
use crate::{non_negative, total_caffeine, total_cost, total_drinks, DailyRecord};

/// Every cut-off the insight rules use. `Default` holds the stock values;
/// the CLI lets users override any of them from its config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightThresholds {
    /// Average daily mg above which tolerance is Moderate.
    pub tolerance_moderate: f64,
    /// Average daily mg above which tolerance is High.
    pub tolerance_high: f64,
    pub risk_medium: f64,
    pub risk_high: f64,
    /// Average price per drink above which promotions are suggested.
    pub savings_promotions: f64,
    /// Average price per drink above which bulk buying is suggested.
    pub savings_bulk: f64,
    /// Percent change in drinks per day that counts as an anomaly.
    pub anomaly_percent: f64,
    /// Days in the recent window; also the minimum historical length.
    pub anomaly_window: usize,
    /// Most recent records the streak outlook measures consistency over.
    pub consistency_window: usize,
    pub consistency_medium: f64,
    pub consistency_high: f64,
    pub trend_increasing: f64,
    pub trend_decreasing: f64,
    pub reduction_floor: f64,
    pub reduction_step: f64,
    pub streak_challenge_days: u32,
    pub cost_target: f64,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            tolerance_moderate: 200.0,
            tolerance_high: 400.0,
            risk_medium: 300.0,
            risk_high: 500.0,
            savings_promotions: 3.0,
            savings_bulk: 3.5,
            anomaly_percent: 50.0,
            anomaly_window: 7,
            consistency_window: 7,
            consistency_medium: 0.5,
            consistency_high: 0.8,
            trend_increasing: 2.0,
            trend_decreasing: 1.0,
            reduction_floor: 300.0,
            reduction_step: 50.0,
            streak_challenge_days: 30,
            cost_target: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToleranceLevel {
    Low,
    Moderate,
    High,
}

impl ToleranceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }

    fn recommendation(self) -> &'static str {
        match self {
            Self::Low => "Maintain current levels",
            Self::Moderate => "Good balance, monitor for side effects",
            Self::High => "Consider reducing intake gradually",
        }
    }
}

/// Shared by risk level and streak likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Low,
    Medium,
    High,
}

impl Rating {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    fn from_thresholds(value: f64, medium: f64, high: f64) -> Self {
        if value > high {
            Self::High
        } else if value > medium {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TolerancePattern {
    pub level: ToleranceLevel,
    pub average_daily: f64,
    pub recommendation: String,
    pub risk_level: Rating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingHabits {
    pub total_spent: f64,
    pub average_per_drink: f64,
    pub monthly_projection: f64,
    pub annual_projection: f64,
    pub savings_opportunity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakOutlook {
    pub likelihood: Rating,
    /// Share of the last seven logged days that had a drink, 0–100.
    pub consistency_percent: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trend {
    Neutral,
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayTrend {
    pub day: String,
    pub average: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionPatterns {
    pub weekly_trends: Vec<WeekdayTrend>,
    pub tolerance: TolerancePattern,
    pub spending: SpendingHabits,
    pub streak_outlook: StreakOutlook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionKind {
    Reduction,
    Streak,
    Savings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSuggestion {
    pub kind: SuggestionKind,
    pub title: String,
    pub description: String,
    pub target_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnomalyDirection {
    Increase,
    Decrease,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub direction: AnomalyDirection,
    pub magnitude_percent: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub level: Rating,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub patterns: ConsumptionPatterns,
    pub personalized_quote: String,
    pub goal_suggestions: Vec<GoalSuggestion>,
    pub risk_assessment: RiskAssessment,
    pub anomaly: Option<Anomaly>,
}

const HIGH_QUOTES: [&str; 3] = [
    "Your energy mastery is legendary! Channel that power wisely.",
    "You've unlocked the monster within - use this strength to conquer your goals!",
    "Peak energy warrior detected! Your dedication is inspiring.",
];

const MODERATE_QUOTES: [&str; 3] = [
    "You're building momentum! Every sip fuels your journey to greatness.",
    "Your energy discipline is growing stronger each day!",
    "Steady progress, monster warrior! Keep climbing those levels.",
];

const LOW_QUOTES: [&str; 3] = [
    "Every legend starts with a single sip. Your journey begins now!",
    "Small steps lead to monster leaps. Keep tracking, keep growing!",
    "The path to energy mastery starts here. Stay consistent!",
];

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Records ordered by date, oldest first. ISO dates sort lexically.
fn sorted_by_date(records: &[DailyRecord]) -> Vec<&DailyRecord> {
    let mut sorted: Vec<&DailyRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date));
    sorted
}

pub fn tolerance_pattern(records: &[DailyRecord], thresholds: &InsightThresholds) -> TolerancePattern {
    let average_daily = average_daily_caffeine(records);

    let level = if average_daily > thresholds.tolerance_high {
        ToleranceLevel::High
    } else if average_daily > thresholds.tolerance_moderate {
        ToleranceLevel::Moderate
    } else {
        ToleranceLevel::Low
    };

    TolerancePattern {
        level,
        average_daily,
        recommendation: level.recommendation().to_string(),
        risk_level: Rating::from_thresholds(
            average_daily,
            thresholds.risk_medium,
            thresholds.risk_high,
        ),
    }
}

pub fn spending_habits(records: &[DailyRecord], thresholds: &InsightThresholds) -> SpendingHabits {
    let total_spent = total_cost(records);
    let drinks = total_drinks(records);
    let average_per_drink = if drinks > 0 {
        total_spent / drinks as f64
    } else {
        0.0
    };
    let monthly_projection = if records.is_empty() {
        0.0
    } else {
        total_spent / records.len() as f64 * 30.0
    };

    let savings_opportunity = if average_per_drink > thresholds.savings_bulk {
        "Consider buying in bulk for savings"
    } else if average_per_drink > thresholds.savings_promotions {
        "Look for promotions and discounts"
    } else {
        "You're getting good value!"
    };

    SpendingHabits {
        total_spent,
        average_per_drink,
        monthly_projection,
        annual_projection: monthly_projection * 12.0,
        savings_opportunity: savings_opportunity.to_string(),
    }
}

/// Consistency over the `consistency_window` most recent records. Days
/// without a record are not counted, only records whose drinks were all
/// removed.
pub fn streak_outlook(records: &[DailyRecord], thresholds: &InsightThresholds) -> StreakOutlook {
    let window = thresholds.consistency_window.max(1);
    let sorted = sorted_by_date(records);
    let recent = &sorted[sorted.len().saturating_sub(window)..];
    let consistency =
        recent.iter().filter(|r| !r.drinks.is_empty()).count() as f64 / window as f64;

    let likelihood = Rating::from_thresholds(
        consistency,
        thresholds.consistency_medium,
        thresholds.consistency_high,
    );
    let recommendation = match likelihood {
        Rating::High => "Great consistency! Keep it up!",
        Rating::Medium => "Try to maintain daily tracking",
        Rating::Low => "Set reminders to improve consistency",
    };

    StreakOutlook {
        likelihood,
        consistency_percent: consistency * 100.0,
        recommendation: recommendation.to_string(),
    }
}

/// Average drinks per logged day for each weekday, Monday first.
pub fn weekly_trends(records: &[DailyRecord], thresholds: &InsightThresholds) -> Vec<WeekdayTrend> {
    let mut totals = [(0usize, 0usize); 7];
    for record in records {
        let Some(date) = record.parsed_date() else {
            continue;
        };
        let slot = &mut totals[date.weekday().num_days_from_monday() as usize];
        slot.0 += record.drink_count();
        slot.1 += 1;
    }

    WEEKDAYS
        .iter()
        .zip(totals)
        .map(|(&day, (drinks, days))| {
            let average = if days > 0 {
                drinks as f64 / days as f64
            } else {
                0.0
            };
            let trend = if days < 2 {
                Trend::Neutral
            } else if average > thresholds.trend_increasing {
                Trend::Increasing
            } else if average < thresholds.trend_decreasing {
                Trend::Decreasing
            } else {
                Trend::Stable
            };
            WeekdayTrend {
                day: weekday_name(day).to_string(),
                average,
                trend,
            }
        })
        .collect()
}

pub fn analyze_patterns(records: &[DailyRecord], thresholds: &InsightThresholds) -> ConsumptionPatterns {
    ConsumptionPatterns {
        weekly_trends: weekly_trends(records, thresholds),
        tolerance: tolerance_pattern(records, thresholds),
        spending: spending_habits(records, thresholds),
        streak_outlook: streak_outlook(records, thresholds),
    }
}

pub fn analyze_patterns_cached(
    cache: &mut dyn ComputationCache,
    records: &[DailyRecord],
    thresholds: &InsightThresholds,
) -> ConsumptionPatterns {
    let key = cache_key("patterns", &(records, thresholds));
    memoize(cache, &key, || analyze_patterns(records, thresholds))
}

pub fn personalized_quote(level: ToleranceLevel, today: NaiveDate) -> &'static str {
    let quotes = match level {
        ToleranceLevel::High => &HIGH_QUOTES,
        ToleranceLevel::Moderate => &MODERATE_QUOTES,
        ToleranceLevel::Low => &LOW_QUOTES,
    };
    quotes[today.day() as usize % quotes.len()]
}

pub fn suggest_goals(patterns: &ConsumptionPatterns, thresholds: &InsightThresholds) -> Vec<GoalSuggestion> {
    let mut suggestions = Vec::new();
    let tolerance = &patterns.tolerance;

    if tolerance.level == ToleranceLevel::High && tolerance.risk_level == Rating::High {
        suggestions.push(GoalSuggestion {
            kind: SuggestionKind::Reduction,
            title: "Gradual Reduction Recommended".to_string(),
            description: format!(
                "Consider reducing daily intake by {}mg to improve tolerance",
                thresholds.reduction_step
            ),
            target_value: thresholds
                .reduction_floor
                .max(tolerance.average_daily - thresholds.reduction_step),
        });
    }

    if patterns.streak_outlook.likelihood == Rating::High {
        suggestions.push(GoalSuggestion {
            kind: SuggestionKind::Streak,
            title: "Streak Challenge".to_string(),
            description: format!(
                "You're on fire! Challenge yourself to reach {} days",
                thresholds.streak_challenge_days
            ),
            target_value: f64::from(thresholds.streak_challenge_days),
        });
    }

    if patterns.spending.average_per_drink > thresholds.savings_bulk {
        suggestions.push(GoalSuggestion {
            kind: SuggestionKind::Savings,
            title: "Cost Optimization".to_string(),
            description: "Try bulk purchases to reduce cost per drink".to_string(),
            target_value: thresholds.cost_target,
        });
    }

    suggestions
}

/// Compare drinks per day in the most recent window against everything
/// before it. Needs at least a full window of history; a history that
/// averages zero drinks has no meaningful percent change.
pub fn detect_anomaly(records: &[DailyRecord], thresholds: &InsightThresholds) -> Option<Anomaly> {
    let window = thresholds.anomaly_window.max(1);
    let sorted = sorted_by_date(records);
    let split = sorted.len().saturating_sub(window);
    let (historical, recent) = sorted.split_at(split);

    if historical.len() < window || recent.is_empty() {
        return None;
    }

    let avg = |days: &[&DailyRecord]| {
        days.iter().map(|r| r.drink_count()).sum::<usize>() as f64 / days.len() as f64
    };
    let recent_avg = avg(recent);
    let historical_avg = avg(historical);
    if historical_avg == 0.0 {
        return None;
    }

    let change = (recent_avg - historical_avg) / historical_avg * 100.0;
    if change.abs() <= thresholds.anomaly_percent {
        return None;
    }

    let (direction, recommendation) = if change > 0.0 {
        (
            AnomalyDirection::Increase,
            "Significant increase detected. Monitor for side effects.",
        )
    } else {
        (
            AnomalyDirection::Decrease,
            "Significant decrease detected. Ensure adequate energy levels.",
        )
    };

    Some(Anomaly {
        direction,
        magnitude_percent: change.abs(),
        recommendation: recommendation.to_string(),
    })
}

pub fn build_insights(
    records: &[DailyRecord],
    today: NaiveDate,
    thresholds: &InsightThresholds,
) -> Insights {
    let patterns = analyze_patterns(records, thresholds);
    let goal_suggestions = suggest_goals(&patterns, thresholds);
    let risk_assessment = RiskAssessment {
        level: patterns.tolerance.risk_level,
        recommendation: patterns.tolerance.recommendation.clone(),
    };

    Insights {
        personalized_quote: personalized_quote(patterns.tolerance.level, today).to_string(),
        goal_suggestions,
        risk_assessment,
        anomaly: detect_anomaly(records, thresholds),
        patterns,
    }
}

pub fn build_insights_cached(
    cache: &mut dyn ComputationCache,
    records: &[DailyRecord],
    today: NaiveDate,
    thresholds: &InsightThresholds,
) -> Insights {
    let key = cache_key("insights", &(records, today, thresholds));
    memoize(cache, &key, || build_insights(records, today, thresholds))
}

/// Total caffeine divided across records, clamped.
pub fn average_daily_caffeine(records: &[DailyRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    non_negative(total_caffeine(records) / records.len() as f64)
}
