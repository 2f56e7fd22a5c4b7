//! Crime Dashboard - command line front end
//!
//! Every dashboard control is a flag: date range, crime types and
//! neighborhoods. Omitted filters mean "everything".

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use crime_dashboard::charts::StaticChartRenderer;
use crime_dashboard::config::Config;
use crime_dashboard::data::{ensure_dataset, DataCleaner, DownloadOutcome, FilterParams, TableCache};
use crime_dashboard::nobel::{count_prizes_by_category, load_nobel_data, prizes_over_time};
use crime_dashboard::report::{print_options, DashboardSnapshot, ReportOptions};
use crime_dashboard::stats::{Density, Period};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crime_dashboard", about = "Crime in Los Angeles - data dashboard")]
struct Cli {
    /// JSON config file; fields not given take their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the crime CSV unless it is already present
    Download {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the available filter values: date range, crime types, neighborhoods
    Options {
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Filter, aggregate and print the dashboard; write charts and summary.json
    Report {
        #[arg(long)]
        data: Option<PathBuf>,
        /// First day included (YYYY-MM-DD); defaults to the earliest date
        #[arg(long, value_parser = parse_date)]
        from: Option<NaiveDate>,
        /// Last day included (YYYY-MM-DD); defaults to the latest date
        #[arg(long, value_parser = parse_date)]
        to: Option<NaiveDate>,
        /// Crime type to keep; repeat for several
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Neighborhood to keep; repeat for several
        #[arg(long = "area")]
        areas: Vec<String>,
        #[arg(long)]
        top_n: Option<usize>,
        #[arg(long, value_enum)]
        period: Option<Period>,
        /// Emit empty periods with a zero count
        #[arg(long)]
        dense: bool,
        /// Output directory for charts and summary.json
        #[arg(long)]
        out: Option<PathBuf>,
        /// Skip chart rendering
        #[arg(long)]
        no_charts: bool,
    },
    /// Nobel prize counts by category and by year
    Nobel {
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    DataCleaner::parse_date(value).ok_or_else(|| format!("expected YYYY-MM-DD, got '{value}'"))
}

fn main() -> Result<()> {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    let mut cache = TableCache::new();

    match cli.command {
        Commands::Download { url, path } => {
            let url = url.unwrap_or(config.source_url);
            let path = path.unwrap_or(config.data_path);
            if let DownloadOutcome::Failed(reason) = ensure_dataset(&url, &path) {
                bail!("Download failed: {reason}");
            }
        }
        Commands::Options { data } => {
            let path = data.unwrap_or(config.data_path);
            let table = cache
                .get_or_load(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?;

            print_options(&table, &mut std::io::stdout().lock())?;
        }
        Commands::Report {
            data,
            from,
            to,
            categories,
            areas,
            top_n,
            period,
            dense,
            out,
            no_charts,
        } => {
            if let Some(top_n) = top_n {
                config.top_n = top_n;
            }
            if let Some(period) = period {
                config.period = period;
            }
            if dense {
                config.density = Density::Dense;
            }
            config.validate()?;

            let path = data.unwrap_or(config.data_path);
            let table = cache
                .get_or_load(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?;

            if table.is_empty() {
                log::warn!("No rows with a valid date in {}", path.display());
            }
            let filter = FilterParams::covering(&table, from, to)
                .with_categories(categories)
                .with_regions(areas);

            let options = ReportOptions {
                top_n: config.top_n,
                period: config.period,
                density: config.density,
            };
            let snapshot = DashboardSnapshot::build(&table, &filter, &options);
            snapshot.print(&mut std::io::stdout().lock())?;

            let out_dir = out.unwrap_or(config.output_dir);
            let renderer = StaticChartRenderer::new(config.chart_width, config.chart_height);
            let renderer = if no_charts { None } else { Some(&renderer) };
            snapshot
                .write_artifacts(&out_dir, renderer)
                .with_context(|| format!("Failed to write report to {}", out_dir.display()))?;
        }
        Commands::Nobel { data } => {
            let path = data.unwrap_or(config.nobel_path);
            let prizes = load_nobel_data(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?;

            let mut out = std::io::stdout().lock();
            writeln!(out, "Prizes by category")?;
            writeln!(out, "{}", count_prizes_by_category(&prizes).to_dataframe()?)?;
            writeln!(out, "\nPrizes over time")?;
            writeln!(out, "{}", prizes_over_time(&prizes).to_dataframe()?)?;
        }
    }

    Ok(())
}
