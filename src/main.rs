use std::collections::BTreeSet;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use ev_dashboard::app::DashboardApp;
use ev_dashboard::data::filter::{FilterSpec, YearRange};
use ev_dashboard::data::loader::{Source, TableCache, DEFAULT_SOURCE};
use ev_dashboard::data::model::{CanonicalTable, VehicleType};
use ev_dashboard::state::DashboardState;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(name = "ev-dashboard", about, version)]
struct Args {
    /// CSV, JSON or Parquet registration data: a local path or an http(s) URL.
    #[clap(default_value = DEFAULT_SOURCE)]
    source: String,

    /// First model year (clamped into the data's years).
    #[clap(long)]
    from_year: Option<i32>,

    /// Last model year (clamped into the data's years).
    #[clap(long)]
    to_year: Option<i32>,

    /// Vehicle type to include, BEV or PHEV. Repeatable; defaults to both.
    #[clap(long = "type", value_name = "TYPE")]
    types: Vec<String>,

    /// Select no vehicle type at all.
    #[clap(long, conflicts_with = "types")]
    no_types: bool,

    /// County to restrict to. Repeatable; dropped if it would empty the view.
    #[clap(long = "county", value_name = "COUNTY")]
    counties: Vec<String>,

    /// Output format.
    #[clap(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Increase output logging verbosity.
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    let cache = TableCache::new(Source::parse(&args.source));
    let table = cache.get().context("loading registration data")?;

    let filters = filters_from_args(&args, table)?;
    let app = DashboardApp::new(DashboardState::with_filters(table, filters));

    let rendered = match args.format {
        OutputFormat::Text => app.render_text().context("rendering dashboard")?,
        OutputFormat::Json => app.render_json().context("serializing dashboard")?,
    };
    println!("{rendered}");
    Ok(())
}

/// Start from the dashboard defaults and apply whatever the user supplied.
fn filters_from_args(args: &Args, table: &CanonicalTable) -> Result<FilterSpec> {
    let defaults = FilterSpec::dashboard_default(table);

    let min = args.from_year.unwrap_or(defaults.year_range.min());
    let max = args.to_year.unwrap_or(defaults.year_range.max());
    let year_range = YearRange::within(min, max, table.year_bounds())?;

    let vehicle_types: BTreeSet<VehicleType> = if args.no_types {
        BTreeSet::new()
    } else if args.types.is_empty() {
        defaults.vehicle_types
    } else {
        args.types
            .iter()
            .map(|t| t.parse::<VehicleType>())
            .collect::<Result<BTreeSet<_>, _>>()?
    };

    Ok(FilterSpec::new(
        year_range,
        vehicle_types,
        args.counties.iter().cloned().collect(),
    ))
}
