mod cache;
mod config;
mod store;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use energytrack_core::catalog::{
    find_drink, find_party_drink, find_party_target, quote_of_the_day, BuiltinCatalog, DRINKS, LEVEL_TIERS,
    PARTY_DRINKS, PARTY_TARGETS,
};
use energytrack_core::chart::{chart_data, ChartView};
use energytrack_core::insights::{build_insights, build_insights_cached, Insights};
use energytrack_core::ledger::{add_drink, check_daily_limit, record_for, remove_drink, LimitStatus};
use energytrack_core::level::{level_for, level_progress};
use energytrack_core::party_meter::{drinks_to_target, grams_needed, PartyMeterInput, Sex};
use energytrack_core::streak::{streak_stats, StreakRule};
use energytrack_core::{
    aggregate_log, format_date, merge_records, parse_date_strict, summarize, DailyRecord,
    LoggedDrink, TrackerError,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cache::DiskCache;
use crate::config::EnergyTrackConfig;

#[derive(Parser)]
#[command(name = "energytrack")]
#[command(author, version, about = "Energy drink consumption tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Data file (default: $ENERGYTRACK_DATA or the user data dir)")]
    data: Option<PathBuf>,

    #[arg(long, global = true, help = "Config file (default: ~/.energytrack.toml)")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Treat this date as today (YYYY-MM-DD)")]
    today: Option<String>,

    #[arg(long, global = true, help = "Output as JSON")]
    json: bool,

    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Show totals, streaks and today's level")]
    Summary,
    #[command(about = "Log a drink")]
    Add {
        #[arg(help = "Drink id from the catalog")]
        drink_id: String,
        #[arg(long, help = "Price paid (default: catalog price)")]
        price: Option<f64>,
        #[arg(long, help = "Date (YYYY-MM-DD, default: today)")]
        date: Option<String>,
    },
    #[command(about = "Remove a logged drink")]
    Remove {
        #[arg(help = "Position of the drink within the day, starting at 1")]
        position: usize,
        #[arg(long, help = "Date (YYYY-MM-DD, default: today)")]
        date: Option<String>,
    },
    #[command(about = "Show current and best streak")]
    Streak {
        #[arg(
            long,
            default_value = "consecutive",
            help = "Current streak rule: consecutive or gap-tolerant"
        )]
        rule: StreakRule,
        #[arg(
            long,
            conflicts_with = "rule",
            help = "Shorthand for --rule gap-tolerant"
        )]
        gap_tolerant: bool,
    },
    #[command(about = "Show the caffeine level tier")]
    Level {
        #[arg(long, help = "Caffeine in mg (default: today's total)")]
        caffeine: Option<f64>,
    },
    #[command(about = "Show chart buckets for this month or year")]
    Chart {
        #[arg(long, default_value = "daily", help = "daily or annual")]
        view: String,
    },
    #[command(about = "Estimate drinks needed to reach a target blood alcohol level")]
    Party {
        #[arg(long, help = "Body weight in kg (default: profile.weight_kg)")]
        weight: Option<f64>,
        #[arg(long, help = "male or female (default: profile.sex)")]
        sex: Option<String>,
        #[arg(long, default_value = "Beer", help = "Drink preset name")]
        drink: String,
        #[arg(long, help = "Alcohol percent (overrides the preset)")]
        percent: Option<f64>,
        #[arg(long, help = "Volume per drink in ml (overrides the preset)")]
        volume: Option<f64>,
        #[arg(long, default_value = "1", help = "Hours of drinking")]
        hours: f64,
        #[arg(long, default_value = "Medium", help = "Light, Medium, Extreme or a level in g/100mL")]
        target: String,
    },
    #[command(about = "Show consumption patterns and suggestions")]
    Insights {
        #[arg(long, help = "Skip the on-disk computation cache")]
        no_cache: bool,
    },
    #[command(about = "List drinks and level tiers")]
    Catalog,
    #[command(about = "Merge a flat drink log (JSON array of {date, id, price?}) into the data file")]
    Import {
        #[arg(help = "Path to the log file")]
        file: PathBuf,
    },
}

struct RunContext {
    data_path: PathBuf,
    today: NaiveDate,
    json: bool,
    config: &'static EnergyTrackConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let today = match cli.today.as_deref() {
        Some(s) => parse_date_strict(s)?,
        None => Local::now().date_naive(),
    };
    let ctx = RunContext {
        data_path: store::resolve_data_path(cli.data.as_deref())?,
        today,
        json: cli.json,
        config: EnergyTrackConfig::load(cli.config.as_deref())?,
    };
    debug!(data = %ctx.data_path.display(), %today, "starting");

    match cli.command {
        Commands::Summary => run_summary(&ctx),
        Commands::Add {
            drink_id,
            price,
            date,
        } => run_add(&ctx, &drink_id, price, date.as_deref()),
        Commands::Remove { position, date } => run_remove(&ctx, position, date.as_deref()),
        Commands::Streak { rule, gap_tolerant } => {
            let rule = if gap_tolerant {
                StreakRule::GapTolerant
            } else {
                rule
            };
            run_streak(&ctx, rule)
        }
        Commands::Level { caffeine } => run_level(&ctx, caffeine),
        Commands::Chart { view } => run_chart(&ctx, &view),
        Commands::Party {
            weight,
            sex,
            drink,
            percent,
            volume,
            hours,
            target,
        } => run_party(
            &ctx,
            PartyArgs {
                weight,
                sex,
                drink,
                percent,
                volume,
                hours,
                target,
            },
        ),
        Commands::Insights { no_cache } => run_insights(&ctx, no_cache),
        Commands::Catalog => run_catalog(&ctx),
        Commands::Import { file } => run_import(&ctx, &file),
    }
}

/// `--debug` forces debug output; otherwise `RUST_LOG`, falling back to warnings only.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_date(ctx: &RunContext, date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => Ok(parse_date_strict(s)?),
        None => Ok(ctx.today),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn today_caffeine(records: &[DailyRecord], today: NaiveDate) -> f64 {
    record_for(records, today)
        .map(DailyRecord::safe_caffeine)
        .unwrap_or(0.0)
}

fn drink_name(drink_id: &str) -> String {
    find_drink(drink_id)
        .map(|d| d.name.to_string())
        .unwrap_or_else(|| format!("unknown ({drink_id})"))
}

fn print_limit_status(status: LimitStatus) {
    match status {
        LimitStatus::Exceeded { percent } => println!(
            "{}",
            format!("  Daily caffeine limit exceeded ({percent:.0}% of limit)").red()
        ),
        LimitStatus::Approaching { percent } => println!(
            "{}",
            format!("  Approaching daily caffeine limit ({percent:.0}% of limit)").yellow()
        ),
        LimitStatus::WithinLimit { .. } | LimitStatus::Disabled => {}
    }
}

fn run_summary(ctx: &RunContext) -> Result<()> {
    let records = store::load(&ctx.data_path)?;
    let summary = summarize(&records);
    let streak = streak_stats(&records, ctx.today, StreakRule::default());
    let caffeine_today = today_caffeine(&records, ctx.today);
    let level = level_for(caffeine_today);
    let limit = check_daily_limit(&ctx.config.goals.to_goals(), caffeine_today);
    let quote = quote_of_the_day(ctx.today);

    if ctx.json {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct SummaryJson<'a> {
            today: String,
            summary: &'a energytrack_core::DataSummary,
            streak: energytrack_core::streak::StreakStats,
            caffeine_today: f64,
            level: &'static energytrack_core::catalog::LevelTier,
            limit: LimitStatus,
            quote: &'static str,
        }

        return print_json(&SummaryJson {
            today: format_date(ctx.today),
            summary: &summary,
            streak,
            caffeine_today,
            level,
            limit,
            quote,
        });
    }

    let mut table = new_table();
    table.set_header(vec!["", "Value"]);
    table.add_row(vec!["Total drinks".to_string(), summary.total_drinks.to_string()]);
    table.add_row(vec!["Total caffeine".to_string(), format_mg(summary.total_caffeine)]);
    table.add_row(vec!["Total spent".to_string(), format_currency(summary.total_cost)]);
    table.add_row(vec!["Active days".to_string(), summary.active_days.to_string()]);
    table.add_row(vec![
        "Avg caffeine / day".to_string(),
        format_mg(summary.average_caffeine_per_day),
    ]);
    table.add_row(vec![
        "Avg cost / drink".to_string(),
        format_currency(summary.average_cost_per_drink),
    ]);
    table.add_row(vec!["Current streak".to_string(), format_days(streak.current)]);
    table.add_row(vec!["Best streak".to_string(), format_days(streak.best)]);
    println!("{table}");

    println!(
        "\n  Today ({}): {} | Level {} {} {}",
        format_date(ctx.today),
        format_mg(caffeine_today),
        level.level,
        level.badge,
        level.name.bold()
    );
    print_limit_status(limit);

    if let Some(record) = record_for(&records, ctx.today) {
        if !record.drinks.is_empty() {
            let mut drinks = new_table();
            drinks.set_header(vec!["#", "Drink", "Price"]);
            for (i, drink) in record.drinks.iter().enumerate() {
                drinks.add_row(vec![
                    (i + 1).to_string(),
                    drink_name(&drink.drink_id),
                    format_currency(drink.price),
                ]);
            }
            println!("{drinks}");
        }
    }

    println!("\n  {}", format!("\"{quote}\"").italic().bright_black());
    Ok(())
}

fn run_add(ctx: &RunContext, drink_id: &str, price: Option<f64>, date: Option<&str>) -> Result<()> {
    let date = resolve_date(ctx, date)?;
    let mut records = store::load(&ctx.data_path)?;
    let record = add_drink(&mut records, date, drink_id, price, &BuiltinCatalog)?.clone();
    store::save(&ctx.data_path, &records)?;
    debug!(date = %record.date, drinks = record.drink_count(), "drink added");

    let limit = check_daily_limit(&ctx.config.goals.to_goals(), record.safe_caffeine());

    if ctx.json {
        #[derive(Serialize)]
        struct AddJson<'a> {
            record: &'a DailyRecord,
            limit: LimitStatus,
        }
        return print_json(&AddJson {
            record: &record,
            limit,
        });
    }

    println!(
        "  {} {} on {}",
        "Added".green(),
        drink_name(drink_id),
        record.date
    );
    println!(
        "{}",
        format!(
            "  Day total: {} drinks, {}, {}",
            record.drink_count(),
            format_mg(record.safe_caffeine()),
            format_currency(record.safe_cost())
        )
        .bright_black()
    );
    print_limit_status(limit);
    Ok(())
}

fn run_remove(ctx: &RunContext, position: usize, date: Option<&str>) -> Result<()> {
    let Some(index) = position.checked_sub(1) else {
        bail!("Drink positions start at 1");
    };
    let date = resolve_date(ctx, date)?;
    let mut records = store::load(&ctx.data_path)?;
    let removed = remove_drink(&mut records, date, index, &BuiltinCatalog).map_err(|e| match e {
        TrackerError::DrinkNotFound { date, .. } => anyhow!("No drink #{position} on {date}"),
        other => other.into(),
    })?;
    store::save(&ctx.data_path, &records)?;

    if ctx.json {
        return print_json(&removed);
    }

    println!(
        "  {} {} from {}",
        "Removed".yellow(),
        drink_name(&removed.drink_id),
        format_date(date)
    );
    Ok(())
}

fn run_streak(ctx: &RunContext, rule: StreakRule) -> Result<()> {
    let records = store::load(&ctx.data_path)?;
    let stats = streak_stats(&records, ctx.today, rule);

    if ctx.json {
        return print_json(&stats);
    }

    println!("  Current streak: {}", format_days(stats.current).bold());
    println!("  Best streak:    {}", format_days(stats.best));
    println!(
        "{}",
        format!("  Active days: {}", stats.active_days).bright_black()
    );
    Ok(())
}

fn run_level(ctx: &RunContext, caffeine: Option<f64>) -> Result<()> {
    let caffeine = match caffeine {
        Some(mg) => mg,
        None => today_caffeine(&store::load(&ctx.data_path)?, ctx.today),
    };
    let progress = level_progress(caffeine);

    if ctx.json {
        return print_json(&progress);
    }

    let tier = progress.current;
    println!(
        "  {} Level {}: {} ({})",
        tier.badge,
        tier.level,
        tier.name.bold(),
        format_mg(caffeine)
    );
    match progress.next {
        Some(next) => println!(
            "{}",
            format!(
                "  {} to {} ({:.0}% through this level)",
                format_mg(progress.remaining_to_next),
                next.name,
                progress.percent_through_tier
            )
            .bright_black()
        ),
        None => println!("{}", "  Top level reached".bright_black()),
    }
    Ok(())
}

fn run_chart(ctx: &RunContext, view: &str) -> Result<()> {
    let view: ChartView = view.parse()?;
    let records = store::load(&ctx.data_path)?;
    let buckets = chart_data(&records, view, ctx.today);

    if ctx.json {
        return print_json(&buckets);
    }

    let mut table = new_table();
    let first_column = match view {
        ChartView::Daily => "Day",
        ChartView::Annual => "Month",
    };
    table.set_header(vec![first_column, "Drinks", "Caffeine", "Cost"]);
    for bucket in &buckets {
        table.add_row(vec![
            bucket.label.clone(),
            bucket.drink_count.to_string(),
            format_mg(bucket.caffeine),
            format_currency(bucket.cost),
        ]);
    }
    println!("{table}");
    Ok(())
}

struct PartyArgs {
    weight: Option<f64>,
    sex: Option<String>,
    drink: String,
    percent: Option<f64>,
    volume: Option<f64>,
    hours: f64,
    target: String,
}

fn run_party(ctx: &RunContext, args: PartyArgs) -> Result<()> {
    let profile = &ctx.config.profile;
    let weight_kg = args
        .weight
        .or(profile.weight_kg)
        .context("Weight is required: pass --weight or set profile.weight_kg in the config")?;
    let sex = match args.sex.as_deref() {
        Some(s) => s.parse::<Sex>()?,
        None => profile.sex.unwrap_or_default(),
    };

    let preset = find_party_drink(&args.drink).with_context(|| {
        let names: Vec<&str> = PARTY_DRINKS.iter().map(|d| d.name).collect();
        format!("Unknown drink '{}' (expected one of: {})", args.drink, names.join(", "))
    })?;
    let target_bac = match args.target.parse::<f64>() {
        Ok(bac) => bac,
        Err(_) => {
            find_party_target(&args.target)
                .with_context(|| format!("Unknown target '{}'", args.target))?
                .bac
        }
    };

    let input = PartyMeterInput {
        target_bac,
        hours: args.hours,
        weight_kg,
        sex,
        volume_ml: args.volume.unwrap_or(preset.volume_ml),
        abv_percent: args.percent.unwrap_or(preset.abv_percent),
    };
    input.validate()?;
    let drinks = drinks_to_target(&input);

    if ctx.json {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct PartyJson<'a> {
            input: &'a PartyMeterInput,
            grams_needed: f64,
            drinks: f64,
        }
        return print_json(&PartyJson {
            input: &input,
            grams_needed: grams_needed(&input),
            drinks,
        });
    }

    println!(
        "  {} drinks of {} ({}%, {}ml) to reach {} g/100mL after {}h",
        format!("{drinks:.1}").bold(),
        preset.name,
        input.abv_percent,
        input.volume_ml,
        input.target_bac,
        input.hours
    );
    println!(
        "{}",
        "  Estimate only. Never drink and drive.".bright_black()
    );
    Ok(())
}

fn run_insights(ctx: &RunContext, no_cache: bool) -> Result<()> {
    let records = store::load(&ctx.data_path)?;
    let thresholds = &ctx.config.thresholds;
    let insights = if no_cache {
        build_insights(&records, ctx.today, thresholds)
    } else {
        let mut cache = DiskCache::open();
        build_insights_cached(&mut cache, &records, ctx.today, thresholds)
    };

    if ctx.json {
        return print_json(&insights);
    }

    print_insights(&insights);
    Ok(())
}

fn print_insights(insights: &Insights) {
    let patterns = &insights.patterns;
    let tolerance = &patterns.tolerance;
    let spending = &patterns.spending;
    let outlook = &patterns.streak_outlook;

    println!("\n  {}", "Caffeine tolerance".bold());
    println!(
        "  {} ({} avg/day, {} risk): {}",
        tolerance.level.as_str(),
        format_mg(tolerance.average_daily),
        tolerance.risk_level.as_str(),
        tolerance.recommendation
    );

    println!("\n  {}", "Spending".bold());
    println!(
        "  {} total, {} per drink, {} / month, {} / year",
        format_currency(spending.total_spent),
        format_currency(spending.average_per_drink),
        format_currency(spending.monthly_projection),
        format_currency(spending.annual_projection)
    );
    println!("{}", format!("  {}", spending.savings_opportunity).bright_black());

    println!("\n  {}", "Streak outlook".bold());
    println!(
        "  {} ({:.1}% consistency): {}",
        outlook.likelihood.as_str(),
        outlook.consistency_percent,
        outlook.recommendation
    );

    let mut table = new_table();
    table.set_header(vec!["Weekday", "Avg drinks", "Trend"]);
    for day in &patterns.weekly_trends {
        table.add_row(vec![
            day.day.clone(),
            format!("{:.1}", day.average),
            day.trend.as_str().to_string(),
        ]);
    }
    println!("{table}");

    if !insights.goal_suggestions.is_empty() {
        println!("\n  {}", "Suggested goals".bold());
        for suggestion in &insights.goal_suggestions {
            println!(
                "  - {}: {} (target {})",
                suggestion.title, suggestion.description, suggestion.target_value
            );
        }
    }

    if let Some(anomaly) = &insights.anomaly {
        println!(
            "\n  {}",
            format!(
                "{:.1}% change in recent consumption. {}",
                anomaly.magnitude_percent, anomaly.recommendation
            )
            .yellow()
        );
    }

    println!(
        "\n  {}",
        format!("\"{}\"", insights.personalized_quote).italic().bright_black()
    );
}

fn run_catalog(ctx: &RunContext) -> Result<()> {
    if ctx.json {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct CatalogJson {
            drinks: &'static [energytrack_core::catalog::DrinkCatalogEntry],
            levels: &'static [energytrack_core::catalog::LevelTier],
            party_drinks: &'static [energytrack_core::catalog::DrinkPreset],
            party_targets: &'static [energytrack_core::catalog::TargetPreset],
        }
        return print_json(&CatalogJson {
            drinks: DRINKS,
            levels: LEVEL_TIERS,
            party_drinks: PARTY_DRINKS,
            party_targets: PARTY_TARGETS,
        });
    }

    let mut drinks = new_table();
    drinks.set_header(vec!["Id", "Name", "Caffeine", "Calories", "Sugar", "Size", "Price"]);
    for drink in DRINKS {
        drinks.add_row(vec![
            drink.id.to_string(),
            drink.name.to_string(),
            format_mg(drink.caffeine),
            drink.calories.to_string(),
            format!("{}g", drink.sugar),
            drink.size.to_string(),
            format_currency(drink.default_price),
        ]);
    }
    println!("{drinks}");

    let mut levels = new_table();
    levels.set_header(vec!["Level", "Name", "Range"]);
    for tier in LEVEL_TIERS {
        let range = if tier.max_caffeine.is_finite() {
            format!("{}-{}mg", tier.min_caffeine, tier.max_caffeine)
        } else {
            format!("{}mg+", tier.min_caffeine)
        };
        levels.add_row(vec![
            format!("{} {}", tier.badge, tier.level),
            tier.name.to_string(),
            range,
        ]);
    }
    println!("{levels}");
    Ok(())
}

fn run_import(ctx: &RunContext, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let entries: Vec<LoggedDrink> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse drink log {}", file.display()))?;
    let logged = entries.len();

    let incoming = aggregate_log(entries, &BuiltinCatalog);
    let days = incoming.len();
    let mut records = store::load(&ctx.data_path)?;
    merge_records(&mut records, incoming, &BuiltinCatalog);
    store::save(&ctx.data_path, &records)?;

    if ctx.json {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct ImportJson {
            logged: usize,
            days: usize,
            total_days: usize,
        }
        return print_json(&ImportJson {
            logged,
            days,
            total_days: records.len(),
        });
    }

    println!(
        "  {} {} drinks across {} days",
        "Imported".green(),
        logged,
        days
    );
    Ok(())
}

fn format_currency(n: f64) -> String {
    if n >= 1000.0 {
        format!("${:.2}K", n / 1000.0)
    } else {
        format!("${:.2}", n)
    }
}

fn format_mg(n: f64) -> String {
    format!("{n:.0}mg")
}

fn format_days(n: u32) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{n} days")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(3.5), "$3.50");
        assert_eq!(format_currency(1234.0), "$1.23K");
    }

    #[test]
    fn test_format_days() {
        assert_eq!(format_days(0), "0 days");
        assert_eq!(format_days(1), "1 day");
        assert_eq!(format_days(5), "5 days");
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "energytrack",
            "streak",
            "--gap-tolerant",
            "--today",
            "2025-01-05",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.today.as_deref(), Some("2025-01-05"));
        assert!(matches!(
            cli.command,
            Commands::Streak {
                gap_tolerant: true,
                ..
            }
        ));
    }

    #[test]
    fn test_cli_parses_streak_rule() {
        let cli = Cli::try_parse_from(["energytrack", "streak", "--rule", "lenient"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Streak {
                rule: StreakRule::GapTolerant,
                gap_tolerant: false,
            }
        ));

        let cli = Cli::try_parse_from(["energytrack", "streak"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Streak {
                rule: StreakRule::Consecutive,
                ..
            }
        ));

        assert!(Cli::try_parse_from(["energytrack", "streak", "--rule", "sometimes"]).is_err());
    }
}
