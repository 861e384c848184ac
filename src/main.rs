// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use ton_city::{
    count_plots, daily_withdrawal_rate, first_treasury_snapshot_time, insert_businesses, insert_plots,
    insert_treasury_snapshot, load_plots_csv, quote_plot, revenue_report, setup_database,
    tax_tier, BusinessType, EconomyConfig,
};

const DEFAULT_DB_PATH: &str = "ton_city.db";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = EconomyConfig::from_env()?;
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("import") => run_import(&args, &config)?,
        Some("import-businesses") => run_import_businesses(&args, &config)?,
        Some("price") => run_price(&args, &config)?,
        Some("income") => run_income(&args, &config)?,
        Some("tax") => run_tax(&args)?,
        Some("treasury") => run_treasury(&args, &config)?,
        Some("help") | Some("--help") | Some("-h") => print_usage(),
        Some(other) => {
            print_usage();
            bail!("Unknown command: {}", other);
        }
        // UI mode (default)
        None => run_ui_mode(&config)?,
    }

    Ok(())
}

fn print_usage() {
    println!("ton-city {}", ton_city::VERSION);
    println!();
    println!("Usage:");
    println!("  ton-city                                    Open the dashboard");
    println!("  ton-city import <plots.csv>                 Import a plot snapshot");
    println!("  ton-city import-businesses <json>           Import a business snapshot");
    println!("  ton-city price <x> <y>                      Quote a plot");
    println!("  ton-city income <type> <level> <conns>      Daily income breakdown");
    println!("  ton-city tax <market_share_percent>         Tax tier for a seller");
    println!("  ton-city treasury <stats.json>              Record and assess treasury stats");
}

fn db_path() -> String {
    env::var("TON_CITY_DB").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string())
}

fn open_database() -> Result<Connection> {
    let path = db_path();
    let conn = Connection::open(&path).with_context(|| format!("Failed to open database {}", path))?;
    setup_database(&conn)?;
    Ok(conn)
}

fn arg<'a>(args: &'a [String], i: usize, name: &str) -> Result<&'a str> {
    args.get(i)
        .map(String::as_str)
        .with_context(|| format!("Missing argument <{}>", name))
}

fn parse_arg<T: std::str::FromStr>(args: &[String], i: usize, name: &str) -> Result<T> {
    let raw = arg(args, i, name)?;
    raw.parse::<T>()
        .map_err(|_| anyhow::anyhow!("Invalid <{}>: {}", name, raw))
}

fn run_import(args: &[String], config: &EconomyConfig) -> Result<()> {
    let csv_path = Path::new(arg(args, 2, "plots.csv")?);

    // 1. Load CSV
    let plots = load_plots_csv(csv_path, &config.grid)?;

    // 2. Validate (fails closed: nothing is stored on error)
    if let Err(errors) = config.validator().validate_plots(&plots) {
        for e in &errors {
            tracing::error!(%e, "invalid plot");
        }
        bail!("Import rejected: {} validation errors", errors.len());
    }

    // 3. Store
    let conn = open_database()?;
    let changed = insert_plots(&conn, &plots)?;
    let count = count_plots(&conn)?;

    println!("✓ Imported {} plots ({} new or changed)", plots.len(), changed);
    println!("✓ Database contains {} plots", count);

    Ok(())
}

fn run_import_businesses(args: &[String], config: &EconomyConfig) -> Result<()> {
    let path = arg(args, 2, "businesses.json")?;
    let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;

    // Fails closed: one invalid business rejects the file
    let businesses = config.validator().decode_businesses(&json)?;

    let conn = open_database()?;
    let stored = insert_businesses(&conn, &businesses)?;

    let model = config.income_model();
    let daily: f64 = businesses.iter().map(|b| b.daily_income(&model)).sum();

    println!("✓ Imported {} businesses", stored);
    println!("✓ Combined gross income: {:.2} TON/day", daily);

    Ok(())
}

fn run_price(args: &[String], config: &EconomyConfig) -> Result<()> {
    let x: i32 = parse_arg(args, 2, "x")?;
    let y: i32 = parse_arg(args, 3, "y")?;

    if !config.grid.contains(x, y) {
        bail!("({}, {}) is outside the {}x{} grid", x, y, config.grid.size, config.grid.size);
    }

    let quote = quote_plot(x, y, &config.grid);
    println!("{}", serde_json::to_string_pretty(&quote)?);

    Ok(())
}

fn run_income(args: &[String], config: &EconomyConfig) -> Result<()> {
    let business_type: BusinessType = arg(args, 2, "type")?.parse()?;
    let level: i64 = parse_arg(args, 3, "level")?;
    let connections: i64 = parse_arg(args, 4, "connections")?;

    let breakdown = config
        .income_model()
        .breakdown(business_type, level, connections);

    println!("{} L{} with {} connections (per day)", business_type, level, connections);
    println!("{}", serde_json::to_string_pretty(&breakdown)?);

    Ok(())
}

fn run_tax(args: &[String]) -> Result<()> {
    let share: f64 = parse_arg(args, 2, "market_share_percent")?;
    let tier = tax_tier(share);

    println!("{}: {:.0}%", tier, tier.rate() * 100.0);

    Ok(())
}

fn run_treasury(args: &[String], config: &EconomyConfig) -> Result<()> {
    let path = arg(args, 2, "stats.json")?;
    let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let stats = config.validator().decode_treasury(&json)?;

    let conn = open_database()?;
    let now = Utc::now();
    insert_treasury_snapshot(&conn, &stats, now)?;

    let avg = daily_withdrawal_rate(&stats, first_treasury_snapshot_time(&conn)?, now);

    let health = config.treasury_engine().assess(&stats, Some(avg));
    println!("{}", health.summary());

    let report = revenue_report(&stats);
    for line in &report.lines {
        println!("  {:<16} {:>12.2} TON", line.source.label(), line.amount);
    }
    println!("  {:<16} {:>12.2} TON", "Total", report.total_revenue);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &EconomyConfig) -> Result<()> {
    use ton_city::{get_all_plots, latest_treasury_snapshot, PlotIndex};

    let conn = open_database()?;

    let plots = get_all_plots(&conn)?;
    tracing::info!(count = plots.len(), "loaded plot snapshot");

    let now = Utc::now();
    let treasury = match latest_treasury_snapshot(&conn)? {
        Some((_, stats)) => {
            let avg = daily_withdrawal_rate(&stats, first_treasury_snapshot_time(&conn)?, now);
            Some((stats, Some(avg)))
        }
        None => None,
    };

    let viewer = env::var("TON_CITY_WALLET").ok();

    let mut app = ui::App::new(PlotIndex::new(plots), config.clone(), treasury, viewer);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &EconomyConfig) -> Result<()> {
    print_usage();
    bail!("Dashboard not available: rebuild with --features tui");
}
