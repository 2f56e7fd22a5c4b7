//! Dashboard Report
//! Builds every dashboard panel for one filter selection, then prints the
//! panels as tables, renders them as charts and writes a JSON summary.

use crate::charts::{ChartJob, ChartKind, StaticChartRenderer};
use crate::data::{DataLoader, FilterParams, IncidentColumn, IncidentTable};
use crate::stats::{AggregateError, Aggregator, CountTable, CrossTab, Density, Metrics, Period};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Aggregation settings for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub top_n: usize,
    pub period: Period,
    pub density: Density,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            period: Period::Month,
            density: Density::Sparse,
        }
    }
}

/// Filter echo plus every computed panel. Panels whose source column is
/// missing are `None` and named in `skipped`.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub selected_categories: Vec<String>,
    pub selected_regions: Vec<String>,
    pub metrics: Metrics,
    pub trend: CountTable,
    pub top_crime_types: Option<CountTable>,
    pub neighborhoods: Option<CountTable>,
    pub hours: Option<CountTable>,
    pub age_groups: Option<CountTable>,
    pub victim_sex: Option<CountTable>,
    pub ethnicities: Option<CountTable>,
    pub weapons: Option<CountTable>,
    pub pivot: Option<CrossTab>,
    pub skipped: Vec<String>,
}

impl DashboardSnapshot {
    /// Filter the cleaned table and compute all panels.
    pub fn build(table: &IncidentTable, filter: &FilterParams, options: &ReportOptions) -> Self {
        let filtered = filter.apply(table);
        let mut skipped = Vec::new();

        let top_crime_types = panel(
            "top crime types",
            Aggregator::top_categories(&filtered, options.top_n),
            &mut skipped,
        );
        let neighborhoods = panel(
            "crimes by neighborhood",
            Aggregator::by_region(&filtered),
            &mut skipped,
        );
        let hours = panel("crimes by hour", Aggregator::by_hour(&filtered), &mut skipped);
        let age_groups = panel(
            "victim age groups",
            Aggregator::by_age_bucket(&filtered),
            &mut skipped,
        );
        let victim_sex = panel("victim sex", Aggregator::by_sex(&filtered), &mut skipped);
        let ethnicities = panel(
            "victim ethnicity",
            Aggregator::by_ethnicity(&filtered),
            &mut skipped,
        );
        let weapons = panel(
            "top weapons",
            Aggregator::top_weapons(&filtered, options.top_n),
            &mut skipped,
        );
        let pivot = panel(
            "monthly pivot",
            Aggregator::crosstab_month_region(&filtered),
            &mut skipped,
        );

        Self {
            start: filter.start,
            end: filter.end,
            selected_categories: filter.categories.iter().cloned().collect(),
            selected_regions: filter.regions.iter().cloned().collect(),
            metrics: Aggregator::metrics(&filtered),
            trend: Aggregator::by_period(&filtered, options.period, options.density)
                .with_count_label("Number of Crimes"),
            top_crime_types,
            neighborhoods,
            hours,
            age_groups,
            victim_sex,
            ethnicities,
            weapons,
            pivot,
            skipped,
        }
    }

    /// Charts for every available panel.
    pub fn chart_jobs(&self) -> Vec<ChartJob> {
        let mut jobs = vec![ChartJob::counts(
            "crime_trend.png",
            "Crime Counts Over Time",
            ChartKind::Line,
            self.trend.clone(),
        )];

        // (panel, file, title, kind, accent)
        let optional = [
            (
                &self.top_crime_types,
                "top_crime_types.png",
                "Top Crime Types",
                ChartKind::HorizontalBar,
                false,
            ),
            (
                &self.hours,
                "crimes_by_hour.png",
                "Crime Distribution by Hour",
                ChartKind::Bar,
                true,
            ),
            (
                &self.age_groups,
                "victim_age_groups.png",
                "Victim Age Groups",
                ChartKind::Bar,
                false,
            ),
            (
                &self.victim_sex,
                "victim_sex.png",
                "Victim Sex",
                ChartKind::Bar,
                false,
            ),
            (
                &self.ethnicities,
                "victim_ethnicity.png",
                "Victim Ethnicity",
                ChartKind::HorizontalBar,
                false,
            ),
            (
                &self.weapons,
                "top_weapons.png",
                "Top Weapons",
                ChartKind::HorizontalBar,
                false,
            ),
        ];
        for (data, file_name, title, kind, accent) in optional {
            if let Some(data) = data {
                let job = ChartJob::counts(file_name, title, kind, data.clone());
                jobs.push(if accent { job.accented() } else { job });
            }
        }

        if let Some(pivot) = &self.pivot {
            jobs.push(ChartJob::Heatmap {
                file_name: "monthly_pivot.png".to_string(),
                title: "Monthly Crime Distribution".to_string(),
                data: pivot.clone(),
            });
        }

        jobs
    }

    /// Print metrics and panel tables.
    pub fn print(&self, out: &mut impl Write) -> Result<(), ReportError> {
        writeln!(out, "Crime in Los Angeles: {} to {}", self.start, self.end)?;
        if !self.selected_categories.is_empty() {
            writeln!(out, "Crime types: {}", self.selected_categories.join(", "))?;
        }
        if !self.selected_regions.is_empty() {
            writeln!(out, "Neighborhoods: {}", self.selected_regions.join(", "))?;
        }

        writeln!(out, "\nKey Metrics")?;
        writeln!(
            out,
            "  Total Crimes: {}",
            with_thousands(self.metrics.total_incidents)
        )?;
        writeln!(out, "  Unique Crime Types: {}", self.metrics.unique_categories)?;
        writeln!(out, "  Unique Neighborhoods: {}", self.metrics.unique_regions)?;

        write_table(out, "Crime Trend Over Time", &self.trend.to_dataframe()?)?;
        let tables = [
            ("Top Crime Types", &self.top_crime_types, false),
            ("Crime Counts by Neighborhood", &self.neighborhoods, true),
            ("Crime Counts by Hour of Day", &self.hours, false),
            ("Victim Age Groups", &self.age_groups, false),
            ("Victim Sex", &self.victim_sex, false),
            ("Victim Ethnicity", &self.ethnicities, false),
            ("Top Weapons", &self.weapons, false),
        ];
        for (title, table, indexed) in tables {
            if let Some(table) = table {
                let df = if indexed {
                    table.to_indexed_dataframe()?
                } else {
                    table.to_dataframe()?
                };
                write_table(out, title, &df)?;
            }
        }
        if let Some(pivot) = &self.pivot {
            write_table(
                out,
                "Monthly Crime Distribution (Pivot Table)",
                &pivot.to_dataframe()?,
            )?;
        }

        for name in &self.skipped {
            writeln!(out, "\n(skipped {name}: column not available)")?;
        }
        Ok(())
    }

    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Write `summary.json` and, when a renderer is given, every chart.
    /// Chart failures are logged and do not fail the report.
    pub fn write_artifacts(
        &self,
        out_dir: &Path,
        renderer: Option<&StaticChartRenderer>,
    ) -> Result<Vec<PathBuf>, ReportError> {
        fs::create_dir_all(out_dir)?;
        let summary = out_dir.join(SUMMARY_FILE);
        self.write_json(&summary)?;
        let mut written = vec![summary];

        if let Some(renderer) = renderer {
            for (name, result) in renderer.render_all(&self.chart_jobs(), out_dir) {
                match result {
                    Ok(path) => written.push(path),
                    Err(e) => log::warn!("Chart {name} not written: {e}"),
                }
            }
        }

        log::info!("Wrote {} files to {}", written.len(), out_dir.display());
        Ok(written)
    }
}

/// Print the filter choices a table offers: its columns, date range, crime
/// types and neighborhoods.
pub fn print_options(table: &IncidentTable, out: &mut impl Write) -> Result<(), ReportError> {
    let df = table.to_dataframe()?;
    writeln!(out, "Columns: {}", DataLoader::column_names(&df).join(", "))?;
    match table.date_range() {
        Some((start, end)) => writeln!(out, "Date range: {start} to {end}")?,
        None => writeln!(out, "Date range: (no rows)")?,
    }

    let lists = [
        ("Crime Types", IncidentColumn::Category),
        ("Neighborhoods", IncidentColumn::Area),
    ];
    for (title, column) in lists {
        writeln!(out, "\n{title}:")?;
        for value in DataLoader::unique_values(&df, column.column_name()) {
            writeln!(out, "  {value}")?;
        }
    }
    Ok(())
}

fn panel<T>(
    name: &str,
    result: Result<T, AggregateError>,
    skipped: &mut Vec<String>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Skipping {name}: {e}");
            skipped.push(name.to_string());
            None
        }
    }
}

fn write_table(out: &mut impl Write, title: &str, df: &DataFrame) -> Result<(), ReportError> {
    writeln!(out, "\n{title}")?;
    writeln!(out, "{df}")?;
    Ok(())
}

/// `1234567` -> `"1,234,567"`.
pub fn with_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataCleaner;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const CSV: &str = "DATE OCC,CRM CD DESC,AREA NAME,TIME OCC\n\
                       2020-01-05,THEFT,Hollywood,1230\n\
                       2020-01-06,THEFT,Hollywood,0845\n\
                       2020-02-01,ASSAULT,Rampart,2200\n\
                       not-a-date,ASSAULT,Rampart,2200\n";

    fn table(dir: &TempDir) -> IncidentTable {
        let path = dir.path().join("crimes.csv");
        fs::write(&path, CSV).unwrap();
        DataCleaner::clean(&DataLoader::load_csv(&path).unwrap()).unwrap()
    }

    #[test]
    fn snapshot_computes_available_panels_and_skips_the_rest() {
        let dir = TempDir::new().unwrap();
        let table = table(&dir);
        let filter = FilterParams::full_range(&table).unwrap();

        let snapshot = DashboardSnapshot::build(&table, &filter, &ReportOptions::default());
        assert_eq!(snapshot.metrics.total_incidents, 3);
        assert_eq!(snapshot.trend.get("2020-01"), Some(2));
        assert_eq!(snapshot.hours.as_ref().and_then(|h| h.get("8")), Some(1));
        assert!(snapshot.age_groups.is_none());
        assert_eq!(
            snapshot.skipped,
            vec!["victim age groups", "victim sex", "victim ethnicity", "top weapons"]
        );

        // trend, top crime types, hours, pivot
        assert_eq!(snapshot.chart_jobs().len(), 4);
    }

    #[test]
    fn filtered_snapshot_reflects_selection() {
        let dir = TempDir::new().unwrap();
        let table = table(&dir);
        let filter = FilterParams::full_range(&table)
            .unwrap()
            .with_regions(["Rampart"]);

        let snapshot = DashboardSnapshot::build(&table, &filter, &ReportOptions::default());
        assert_eq!(snapshot.metrics.total_incidents, 1);
        assert_eq!(snapshot.selected_regions, vec!["Rampart"]);
        let pivot = snapshot.pivot.unwrap();
        assert_eq!(pivot.regions, vec!["Rampart"]);
        assert_eq!(pivot.months, vec!["2020-02"]);
    }

    #[test]
    fn prints_metrics_and_tables() {
        let dir = TempDir::new().unwrap();
        let table = table(&dir);
        let filter = FilterParams::full_range(&table).unwrap();
        let snapshot = DashboardSnapshot::build(&table, &filter, &ReportOptions::default());

        let mut out = Vec::new();
        snapshot.print(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Total Crimes: 3"));
        assert!(text.contains("Crime Counts by Neighborhood"));
        assert!(text.contains("Hollywood"));
        assert!(text.contains("skipped top weapons"));
    }

    #[test]
    fn writes_summary_json() {
        let dir = TempDir::new().unwrap();
        let table = table(&dir);
        let filter = FilterParams::full_range(&table).unwrap();
        let snapshot = DashboardSnapshot::build(&table, &filter, &ReportOptions::default());

        let out_dir = dir.path().join("out");
        let written = snapshot.write_artifacts(&out_dir, None).unwrap();
        assert_eq!(written, vec![out_dir.join(SUMMARY_FILE)]);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert_eq!(json["metrics"]["total_incidents"], 3);
        assert_eq!(json["start"], "2020-01-05");
        assert_eq!(json["neighborhoods"]["key_label"], "Neighborhood");
        assert!(json["weapons"].is_null());
    }

    #[test]
    fn only_the_hour_chart_is_accented() {
        let dir = TempDir::new().unwrap();
        let table = table(&dir);
        let filter = FilterParams::full_range(&table).unwrap();
        let snapshot = DashboardSnapshot::build(&table, &filter, &ReportOptions::default());

        let jobs = snapshot.chart_jobs();
        let accented: Vec<&str> = jobs
            .iter()
            .filter(|job| matches!(job, ChartJob::Counts { accent: true, .. }))
            .map(ChartJob::file_name)
            .collect();
        assert_eq!(accented, vec!["crimes_by_hour.png"]);
    }

    #[test]
    fn writes_charts_next_to_summary() {
        let dir = TempDir::new().unwrap();
        let table = table(&dir);
        let filter = FilterParams::full_range(&table).unwrap();
        let snapshot = DashboardSnapshot::build(&table, &filter, &ReportOptions::default());

        let out_dir = dir.path().join("out");
        let renderer = StaticChartRenderer::new(600, 400);
        let written = snapshot.write_artifacts(&out_dir, Some(&renderer)).unwrap();

        assert_eq!(written[0], out_dir.join(SUMMARY_FILE));
        for name in [
            "crime_trend.png",
            "top_crime_types.png",
            "crimes_by_hour.png",
            "monthly_pivot.png",
        ] {
            let path = out_dir.join(name);
            assert!(written.contains(&path), "{name} not reported");
            assert!(fs::metadata(&path).unwrap().len() > 0, "{name} is empty");
        }
        assert_eq!(written.len(), 5);
    }

    #[test]
    fn empty_table_gives_zero_metrics_and_no_charts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();
        let table = DataCleaner::clean(&DataLoader::load_csv(&path).unwrap()).unwrap();
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let filter = FilterParams::covering(&table, Some(day), None);

        let snapshot = DashboardSnapshot::build(&table, &filter, &ReportOptions::default());
        assert_eq!(snapshot.metrics.total_incidents, 0);
        assert!(snapshot.trend.is_empty());
        assert_eq!(snapshot.skipped.len(), 8);

        let mut out = Vec::new();
        snapshot.print(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Total Crimes: 0"));

        let out_dir = dir.path().join("out");
        let renderer = StaticChartRenderer::new(600, 400);
        let written = snapshot.write_artifacts(&out_dir, Some(&renderer)).unwrap();
        assert_eq!(written, vec![out_dir.join(SUMMARY_FILE)]);
    }

    #[test]
    fn options_list_columns_and_choices() {
        let dir = TempDir::new().unwrap();
        let table = table(&dir);

        let mut out = Vec::new();
        print_options(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Columns: date_occ, time_occ, crm_cd_desc, area_name\n\
             Date range: 2020-01-05 to 2020-02-01\n\
             \nCrime Types:\n  ASSAULT\n  THEFT\n\
             \nNeighborhoods:\n  Hollywood\n  Rampart\n"
        );
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(with_thousands(0), "0");
        assert_eq!(with_thousands(999), "999");
        assert_eq!(with_thousands(1000), "1,000");
        assert_eq!(with_thousands(1234567), "1,234,567");
    }
}
