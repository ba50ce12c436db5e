//! Compiled-in reference tables: drinks, level tiers, quotes and the
//! party-meter presets.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrinkCatalogEntry {
    pub id: &'static str,
    pub name: &'static str,
    /// Caffeine per can, in mg.
    pub caffeine: f64,
    pub calories: u32,
    /// Sugar per can, in g.
    pub sugar: u32,
    pub size: &'static str,
    pub default_price: f64,
    pub category: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelTier {
    pub level: u8,
    pub name: &'static str,
    pub min_caffeine: f64,
    pub max_caffeine: f64,
    pub badge: &'static str,
}

pub const DRINKS: &[DrinkCatalogEntry] = &[
    DrinkCatalogEntry {
        id: "1",
        name: "Monster Energy Original",
        caffeine: 160.0,
        calories: 210,
        sugar: 54,
        size: "16 fl oz",
        default_price: 1.80,
        category: "Original",
    },
    DrinkCatalogEntry {
        id: "2",
        name: "Monster Energy Zero Ultra",
        caffeine: 140.0,
        calories: 10,
        sugar: 0,
        size: "16 fl oz",
        default_price: 1.80,
        category: "Zero Sugar",
    },
    DrinkCatalogEntry {
        id: "3",
        name: "Monster Energy Mango Loco",
        caffeine: 160.0,
        calories: 25,
        sugar: 6,
        size: "15.5 fl oz",
        default_price: 1.80,
        category: "Juice",
    },
    DrinkCatalogEntry {
        id: "4",
        name: "Monster Energy Pipeline Punch",
        caffeine: 160.0,
        calories: 210,
        sugar: 51,
        size: "16 fl oz",
        default_price: 1.80,
        category: "Juice",
    },
    DrinkCatalogEntry {
        id: "5",
        name: "Monster Energy Ultra Red",
        caffeine: 140.0,
        calories: 10,
        sugar: 0,
        size: "16 fl oz",
        default_price: 1.80,
        category: "Ultra",
    },
    DrinkCatalogEntry {
        id: "6",
        name: "Monster Energy Ultra Paradise",
        caffeine: 140.0,
        calories: 10,
        sugar: 0,
        size: "16 fl oz",
        default_price: 1.80,
        category: "Ultra",
    },
];

/// Ordered, non-overlapping integer ranges over `[0, ∞)`; see [`crate::level::level_for`].
pub const LEVEL_TIERS: &[LevelTier] = &[
    LevelTier {
        level: 1,
        name: "Energy Rookie",
        min_caffeine: 0.0,
        max_caffeine: 160.0,
        badge: "🟢",
    },
    LevelTier {
        level: 2,
        name: "Monster Warrior",
        min_caffeine: 161.0,
        max_caffeine: 320.0,
        badge: "🟡",
    },
    LevelTier {
        level: 3,
        name: "Caffeine Champion",
        min_caffeine: 321.0,
        max_caffeine: 480.0,
        badge: "🟠",
    },
    LevelTier {
        level: 4,
        name: "Energy Master",
        min_caffeine: 481.0,
        max_caffeine: 640.0,
        badge: "🔴",
    },
    LevelTier {
        level: 5,
        name: "Monster Legend",
        min_caffeine: 641.0,
        max_caffeine: f64::INFINITY,
        badge: "🟣",
    },
];

pub const QUOTES: &[&str] = &[
    "Unleash the beast within!",
    "Energy is life, life is energy!",
    "Push your limits, break your barriers!",
    "Fuel your passion, ignite your dreams!",
    "Be legendary, be unstoppable!",
    "Transform energy into victory!",
    "Rise above, stay energized!",
    "Power through every challenge!",
    "Your potential is limitless!",
    "Energize your journey to greatness!",
];

static DRINK_INDEX: Lazy<HashMap<&'static str, &'static DrinkCatalogEntry>> =
    Lazy::new(|| DRINKS.iter().map(|d| (d.id, d)).collect());

/// Lookup seam for drink metadata, so the ledger and aggregator can run
/// against a custom table in tests.
pub trait DrinkCatalog {
    fn find(&self, drink_id: &str) -> Option<&DrinkCatalogEntry>;
}

/// The compiled-in catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl DrinkCatalog for BuiltinCatalog {
    fn find(&self, drink_id: &str) -> Option<&DrinkCatalogEntry> {
        DRINK_INDEX.get(drink_id).copied()
    }
}

impl DrinkCatalog for [DrinkCatalogEntry] {
    fn find(&self, drink_id: &str) -> Option<&DrinkCatalogEntry> {
        self.iter().find(|d| d.id == drink_id)
    }
}

pub fn find_drink(drink_id: &str) -> Option<&'static DrinkCatalogEntry> {
    DRINK_INDEX.get(drink_id).copied()
}

pub fn quote_of_the_day(today: NaiveDate) -> &'static str {
    QUOTES[today.day() as usize % QUOTES.len()]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrinkPreset {
    pub name: &'static str,
    pub abv_percent: f64,
    pub volume_ml: f64,
}

pub const PARTY_DRINKS: &[DrinkPreset] = &[
    DrinkPreset {
        name: "Mixed drink",
        abv_percent: 10.0,
        volume_ml: 500.0,
    },
    DrinkPreset {
        name: "Beer",
        abv_percent: 5.0,
        volume_ml: 330.0,
    },
    DrinkPreset {
        name: "Wine",
        abv_percent: 12.0,
        volume_ml: 500.0,
    },
    DrinkPreset {
        name: "Whisky",
        abv_percent: 40.0,
        volume_ml: 10.0,
    },
    DrinkPreset {
        name: "Vodka",
        abv_percent: 40.0,
        volume_ml: 10.0,
    },
    DrinkPreset {
        name: "Rum",
        abv_percent: 40.0,
        volume_ml: 10.0,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetPreset {
    pub label: &'static str,
    /// Target blood alcohol concentration, g/100mL.
    pub bac: f64,
}

pub const PARTY_TARGETS: &[TargetPreset] = &[
    TargetPreset {
        label: "Light",
        bac: 0.03,
    },
    TargetPreset {
        label: "Medium",
        bac: 0.07,
    },
    TargetPreset {
        label: "Extreme",
        bac: 0.12,
    },
];

pub fn find_party_drink(name: &str) -> Option<&'static DrinkPreset> {
    PARTY_DRINKS
        .iter()
        .find(|d| d.name.eq_ignore_ascii_case(name))
}

pub fn find_party_target(label: &str) -> Option<&'static TargetPreset> {
    PARTY_TARGETS
        .iter()
        .find(|t| t.label.eq_ignore_ascii_case(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique() {
        assert_eq!(DRINK_INDEX.len(), DRINKS.len());
    }

    #[test]
    fn test_find_drink() {
        let drink = find_drink("3").unwrap();
        assert_eq!(drink.name, "Monster Energy Mango Loco");
        assert_eq!(drink.caffeine, 160.0);
        assert!(find_drink("99").is_none());
    }

    #[test]
    fn test_slice_catalog_lookup() {
        let custom = [DrinkCatalogEntry {
            id: "x",
            name: "Test Can",
            caffeine: 80.0,
            calories: 0,
            sugar: 0,
            size: "8 fl oz",
            default_price: 1.0,
            category: "Test",
        }];
        assert_eq!(custom[..].find("x").unwrap().caffeine, 80.0);
        assert!(custom[..].find("1").is_none());
    }

    #[test]
    fn test_level_tiers_partition_without_gaps() {
        assert_eq!(LEVEL_TIERS[0].min_caffeine, 0.0);
        for pair in LEVEL_TIERS.windows(2) {
            assert_eq!(pair[1].min_caffeine, pair[0].max_caffeine + 1.0);
            assert_eq!(pair[1].level, pair[0].level + 1);
        }
        assert!(LEVEL_TIERS.last().unwrap().max_caffeine.is_infinite());
    }

    #[test]
    fn test_quote_of_the_day_uses_day_of_month() {
        let d10 = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let d3 = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        assert_eq!(quote_of_the_day(d10), QUOTES[0]);
        assert_eq!(quote_of_the_day(d3), QUOTES[3]);
    }

    #[test]
    fn test_party_presets_lookup_is_case_insensitive() {
        assert_eq!(find_party_drink("beer").unwrap().volume_ml, 330.0);
        assert_eq!(find_party_target("MEDIUM").unwrap().bac, 0.07);
        assert!(find_party_drink("lemonade").is_none());
    }
}
