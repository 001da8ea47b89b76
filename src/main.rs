use std::path::PathBuf;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use clap::Parser;
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

use lunar_almanac::table::{EclipseTag, ROW_FORMAT};
use lunar_almanac::{
    loader, AlmanacConfig, Eclipse, EventTime, ParallelPhaseCalculator, PhaseReading,
    ViewPreferences,
};

const LOCALE_DATE_FORMAT: &str = "%c";

/// Moon phase, age and upcoming eclipses from tabulated lunar events
#[derive(Parser, Debug)]
#[command(name = "lunar_almanac")]
#[command(about = "Print today's Moon information from the reference tables")]
struct Args {
    /// Query instant in UTC, "YYYY-MM-DD HH:MM" (default: now)
    #[arg(long, value_parser = parse_utc)]
    at: Option<DateTime<Utc>>,

    /// Reference table file (default: bundled 2018-2024 table)
    #[arg(long)]
    table: Option<PathBuf>,

    /// View preferences file
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Switch between northern and southern hemisphere view
    #[arg(long)]
    toggle_hemisphere: bool,

    /// Switch the selenographic grid on or off
    #[arg(long)]
    toggle_grid: bool,

    /// Also print a daily listing for this many days
    #[arg(long)]
    days: Option<usize>,
}

fn parse_utc(raw: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(raw.trim(), ROW_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("expected \"YYYY-MM-DD HH:MM\": {}", e))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();

    let mut config = AlmanacConfig::from_env();
    if let Some(table) = args.table {
        config.table_path = Some(table);
    }
    if let Some(prefs) = args.prefs {
        config.prefs_path = prefs;
    }

    let calculator =
        ParallelPhaseCalculator::with_capacity(loader::from_config(&config)?, config.cache_capacity);
    let coverage = calculator.ephemeris().coverage();
    info!("Table covers {} .. {}", coverage.start, coverage.end);

    let mut prefs = ViewPreferences::load_or_default(&config.prefs_path);
    if args.toggle_hemisphere {
        prefs.toggle_hemisphere();
    }
    if args.toggle_grid {
        prefs.toggle_grid();
    }
    if args.toggle_hemisphere || args.toggle_grid {
        if let Err(e) = prefs.save(&config.prefs_path) {
            error!("Could not save preferences to {}: {}", config.prefs_path.display(), e);
        }
    }

    let reading = match args.at {
        Some(at) => calculator.reading_at(at)?,
        None => calculator.now()?,
    };

    print!("{}", information_panel(&reading));
    println!(
        "View: {:?} hemisphere, grid {} ({})",
        prefs.hemisphere_view,
        if prefs.show_grid { "on" } else { "off" },
        prefs.compass_labels()
    );

    if let Some(days) = args.days {
        let available = ((coverage.end - reading.instant).num_days() + 1).max(0) as usize;
        let count = days.min(available);
        if count < days {
            info!("Listing truncated to {} days by table coverage", count);
        }
        let listing = calculator.calculate_range(reading.instant, Duration::days(1), count)?;
        println!();
        for day in &listing {
            println!(
                "{}  {:<16} {:>3.0}%  age {}d",
                day.instant.format("%Y-%m-%d"),
                day.phase_name().label(),
                day.illuminated * 100.0,
                day.age.days
            );
        }
    }

    debug!("{}", calculator.metrics().report());
    Ok(())
}

fn information_panel(reading: &PhaseReading) -> String {
    let mut out = String::from("Today's Moon Information\n\n");
    out += &format!("Phase: {}\n\n", reading.phase_name());
    out += &format!("Julian Date:\n{:.2} (astronomical)\n\n", reading.julian_date);
    out += &format!(
        "Age: {} days, {} hours, {} minutes\n\n",
        reading.age.days, reading.age.hours, reading.age.minutes
    );
    out += &format!(
        "Lunation:\n{:.2}% through lunation {}\n\n",
        reading.phase * 100.0,
        reading.lunation
    );
    out += &format!(
        "Surface Visibility: {:.0}% (estimated)\n",
        reading.illuminated * 100.0
    );
    if reading.in_lunar_eclipse_window() {
        out += "Lunar eclipse in progress\n";
    }
    out += "\n";
    out += &format!(
        "Selenographic Terminator Longitude:\n{}\n\n",
        reading.terminator
    );
    out += &event_line("Next Full Moon", &reading.next_full_moon);
    out += &event_line("Next New Moon", &reading.next_new_moon);
    out += &eclipse_line("Lunar", reading.next_lunar_eclipse.as_ref());
    out += &eclipse_line("Solar", reading.next_solar_eclipse.as_ref());
    out
}

fn event_line(title: &str, event: &EventTime) -> String {
    format!(
        "{}:\n{} in {:.0} days\n\n",
        title,
        event.local.format(LOCALE_DATE_FORMAT),
        event.days_until()
    )
}

fn eclipse_line<T: EclipseTag>(body: &str, eclipse: Option<&Eclipse<T>>) -> String {
    match eclipse {
        Some(e) => event_line(
            &format!("Next ({}) {} eclipse", e.kind.label(), body),
            &e.time,
        ),
        None => format!("Next {} eclipse:\nbeyond the end of the table\n\n", body),
    }
}
