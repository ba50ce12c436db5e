use serde::Serialize;

use crate::catalog::{LevelTier, LEVEL_TIERS};
use crate::non_negative;

/// Tier whose `[min, max]` range contains the caffeine total, or the lowest
/// tier when none does (fractional totals between two tiers' bounds).
/// Negative or non-finite totals count as zero.
pub fn level_for(caffeine: f64) -> &'static LevelTier {
    level_in(LEVEL_TIERS, caffeine)
}

fn level_in(tiers: &'static [LevelTier], caffeine: f64) -> &'static LevelTier {
    let value = non_negative(caffeine);
    tiers
        .iter()
        .find(|tier| tier.min_caffeine <= value && value <= tier.max_caffeine)
        .unwrap_or(&tiers[0])
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub current: &'static LevelTier,
    pub next: Option<&'static LevelTier>,
    /// Caffeine still needed to enter the next tier; 0 at the top tier.
    pub remaining_to_next: f64,
    /// How far through the current tier's range the total sits, 0–100.
    pub percent_through_tier: f64,
}

pub fn level_progress(caffeine: f64) -> LevelProgress {
    let value = non_negative(caffeine);
    let current = level_for(value);
    let next = LEVEL_TIERS.iter().find(|t| t.level == current.level + 1);

    let remaining_to_next = next
        .map(|n| (n.min_caffeine - value).max(0.0))
        .unwrap_or(0.0);

    let percent_through_tier = match next {
        Some(n) => {
            let span = n.min_caffeine - current.min_caffeine;
            if span > 0.0 {
                ((value - current.min_caffeine) / span * 100.0).clamp(0.0, 100.0)
            } else {
                0.0
            }
        }
        None => 100.0,
    };

    LevelProgress {
        current,
        next,
        remaining_to_next,
        percent_through_tier,
    }
}
