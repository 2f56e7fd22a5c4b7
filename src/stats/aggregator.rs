//! Aggregation Module
//! Grouped counts, top-N rankings and cross tabulation over incident tables.
//!
//! Every operation is a pure function of its input table. Operations that
//! need an optional column check for it first and return
//! [`AggregateError::MissingColumn`] so callers can skip that panel.

use crate::data::{IncidentColumn, IncidentTable};
use crate::stats::codes::ethnicity_label;
use chrono::{Datelike, Days, Months, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

/// Right-inclusive victim age bins. Age 0 belongs to the first bin.
pub const AGE_BINS: [(i64, i64); 6] = [(0, 12), (13, 18), (19, 25), (26, 40), (41, 60), (61, 120)];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AggregateError {
    #[error("Column '{0}' is not present in the data")]
    MissingColumn(&'static str),
}

/// Calendar period used for time bucketing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    /// Weeks ending on Sunday, labelled by that Sunday.
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    /// Canonical date of the period containing `date`.
    pub fn bucket(self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Day => date,
            Period::Week => {
                let to_sunday = 6 - u64::from(date.weekday().num_days_from_monday());
                date.checked_add_days(Days::new(to_sunday)).unwrap_or(date)
            }
            Period::Month => date.with_day(1).unwrap_or(date),
            Period::Year => date.with_ordinal(1).unwrap_or(date),
        }
    }

    /// Canonical date of the period after `bucket`.
    pub fn next(self, bucket: NaiveDate) -> Option<NaiveDate> {
        match self {
            Period::Day => bucket.checked_add_days(Days::new(1)),
            Period::Week => bucket.checked_add_days(Days::new(7)),
            Period::Month => bucket.checked_add_months(Months::new(1)),
            Period::Year => bucket.checked_add_months(Months::new(12)),
        }
    }

    pub fn label(self, bucket: NaiveDate) -> String {
        match self {
            Period::Day | Period::Week => bucket.format("%Y-%m-%d").to_string(),
            Period::Month => bucket.format("%Y-%m").to_string(),
            Period::Year => bucket.format("%Y").to_string(),
        }
    }
}

/// Whether empty periods between the first and last populated period are
/// emitted with a zero count.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    #[default]
    Sparse,
    Dense,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow {
    pub key: String,
    pub count: u64,
}

/// Ordered `(key, count)` rows with display labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountTable {
    pub key_label: String,
    pub count_label: String,
    pub rows: Vec<CountRow>,
}

impl CountTable {
    pub fn new(key_label: &str, rows: Vec<CountRow>) -> Self {
        Self {
            key_label: key_label.to_string(),
            count_label: "Count".to_string(),
            rows,
        }
    }

    pub fn with_count_label(mut self, label: &str) -> Self {
        self.count_label = label.to_string();
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.rows.iter().find(|r| r.key == key).map(|r| r.count)
    }

    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }

    pub fn max_count(&self) -> u64 {
        self.rows.iter().map(|r| r.count).max().unwrap_or(0)
    }

    /// The `n` highest counts, descending. Ties keep their current order.
    pub fn top_n(mut self, n: usize) -> Self {
        self.rows.sort_by(|a, b| b.count.cmp(&a.count));
        self.rows.truncate(n);
        self
    }

    /// Two-column frame: key, count.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let keys: Vec<&str> = self.rows.iter().map(|r| r.key.as_str()).collect();
        let counts: Vec<u64> = self.rows.iter().map(|r| r.count).collect();
        DataFrame::new(vec![
            Column::new(self.key_label.as_str().into(), keys),
            Column::new(self.count_label.as_str().into(), counts),
        ])
    }

    /// Same as [`Self::to_dataframe`] with a leading zero-based `index` column.
    pub fn to_indexed_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut df = self.to_dataframe()?;
        let index: Vec<u32> = (0..self.rows.len() as u32).collect();
        df.insert_column(0, Column::new("index".into(), index))?;
        Ok(df)
    }
}

/// Dense month x region grid, zero-filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossTab {
    pub months: Vec<String>,
    pub regions: Vec<String>,
    /// `counts[month][region]`
    pub counts: Vec<Vec<u64>>,
}

impl CrossTab {
    pub fn get(&self, month: &str, region: &str) -> Option<u64> {
        let i = self.months.iter().position(|m| m == month)?;
        let j = self.regions.iter().position(|r| r == region)?;
        Some(self.counts[i][j])
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Pivot frame: `year_month` then one column per region.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = vec![Column::new("year_month".into(), self.months.clone())];
        for (j, region) in self.regions.iter().enumerate() {
            let values: Vec<u64> = self.counts.iter().map(|row| row[j]).collect();
            columns.push(Column::new(region.as_str().into(), values));
        }
        DataFrame::new(columns)
    }
}

/// Headline numbers for the filtered selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub total_incidents: usize,
    pub unique_categories: usize,
    pub unique_regions: usize,
}

/// Grouped counting over incident tables.
pub struct Aggregator;

impl Aggregator {
    /// Count occurrences, descending by count, ties in first-seen order.
    pub fn value_counts<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<CountRow> {
        let mut index: HashMap<&'a str, usize> = HashMap::new();
        let mut rows: Vec<CountRow> = Vec::new();

        for value in values {
            match index.get(value) {
                Some(&i) => rows[i].count += 1,
                None => {
                    index.insert(value, rows.len());
                    rows.push(CountRow {
                        key: value.to_string(),
                        count: 1,
                    });
                }
            }
        }

        // Stable sort keeps first-seen order among ties
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        rows
    }

    fn require(table: &IncidentTable, column: IncidentColumn) -> Result<(), AggregateError> {
        if table.has_column(column) {
            Ok(())
        } else {
            Err(AggregateError::MissingColumn(column.column_name()))
        }
    }

    pub fn metrics(table: &IncidentTable) -> Metrics {
        Metrics {
            total_incidents: table.len(),
            unique_categories: table.categories().len(),
            unique_regions: table.regions().len(),
        }
    }

    pub fn by_category(table: &IncidentTable) -> Result<CountTable, AggregateError> {
        Self::require(table, IncidentColumn::Category)?;
        let rows = Self::value_counts(table.records().iter().filter_map(|r| r.category.as_deref()));
        Ok(CountTable::new("Crime Type", rows))
    }

    pub fn top_categories(table: &IncidentTable, n: usize) -> Result<CountTable, AggregateError> {
        Ok(Self::by_category(table)?.top_n(n))
    }

    /// Incident counts per calendar period, ascending.
    pub fn by_period(table: &IncidentTable, period: Period, density: Density) -> CountTable {
        let mut counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for record in table.records() {
            *counts.entry(period.bucket(record.date_occ)).or_default() += 1;
        }

        let rows = match (density, counts.keys().next(), counts.keys().next_back()) {
            (Density::Dense, Some(&first), Some(&last)) => {
                let mut rows = Vec::new();
                let mut bucket = Some(first);
                while let Some(b) = bucket.filter(|b| *b <= last) {
                    rows.push(CountRow {
                        key: period.label(b),
                        count: counts.get(&b).copied().unwrap_or(0),
                    });
                    bucket = period.next(b);
                }
                rows
            }
            _ => counts
                .iter()
                .map(|(b, &count)| CountRow {
                    key: period.label(*b),
                    count,
                })
                .collect(),
        };

        CountTable::new("Period", rows)
    }

    /// Counts per area, labelled for the neighborhood table.
    pub fn by_region(table: &IncidentTable) -> Result<CountTable, AggregateError> {
        Self::require(table, IncidentColumn::Area)?;
        let rows = Self::value_counts(table.records().iter().filter_map(|r| r.area.as_deref()));
        Ok(CountTable::new("Neighborhood", rows))
    }

    /// Hour of day from the first two digits of the zero-padded HHMM time.
    pub fn hour_of(time_occ: i64) -> Option<u32> {
        if time_occ < 0 {
            return None;
        }
        let padded = format!("{time_occ:04}");
        padded
            .get(..2)
            .and_then(|h| h.parse::<u32>().ok())
            .filter(|h| *h < 24)
    }

    /// Counts per hour, ascending. Hours with no incidents are absent.
    pub fn by_hour(table: &IncidentTable) -> Result<CountTable, AggregateError> {
        Self::require(table, IncidentColumn::TimeOcc)?;
        let mut counts: BTreeMap<u32, u64> = BTreeMap::new();
        for hour in table
            .records()
            .iter()
            .filter_map(|r| r.time_occ.and_then(Self::hour_of))
        {
            *counts.entry(hour).or_default() += 1;
        }

        let rows = counts
            .into_iter()
            .map(|(hour, count)| CountRow {
                key: hour.to_string(),
                count,
            })
            .collect();
        Ok(CountTable::new("Hour", rows))
    }

    /// Index into [`AGE_BINS`] for an age, `None` outside 0..=120.
    pub fn age_bucket(age: i64) -> Option<usize> {
        AGE_BINS
            .iter()
            .position(|&(low, high)| age >= low && age <= high)
    }

    /// Counts per age bin, every bin present in bin order.
    pub fn by_age_bucket(table: &IncidentTable) -> Result<CountTable, AggregateError> {
        Self::require(table, IncidentColumn::VictimAge)?;
        let mut counts = [0u64; AGE_BINS.len()];
        for bucket in table
            .records()
            .iter()
            .filter_map(|r| r.victim_age.and_then(Self::age_bucket))
        {
            counts[bucket] += 1;
        }

        let rows = AGE_BINS
            .iter()
            .zip(counts)
            .map(|((low, high), count)| CountRow {
                key: format!("{low}-{high}"),
                count,
            })
            .collect();
        Ok(CountTable::new("Age Group", rows))
    }

    pub fn by_sex(table: &IncidentTable) -> Result<CountTable, AggregateError> {
        Self::require(table, IncidentColumn::VictimSex)?;
        let rows =
            Self::value_counts(table.records().iter().filter_map(|r| r.victim_sex.as_deref()));
        Ok(CountTable::new("Sex", rows))
    }

    /// Counts per descent label. Codes sharing a label are merged.
    pub fn by_ethnicity(table: &IncidentTable) -> Result<CountTable, AggregateError> {
        Self::require(table, IncidentColumn::VictimDescent)?;
        let rows = Self::value_counts(
            table
                .records()
                .iter()
                .filter_map(|r| r.victim_descent.as_deref())
                .map(ethnicity_label),
        );
        Ok(CountTable::new("Ethnicity", rows))
    }

    pub fn top_weapons(table: &IncidentTable, n: usize) -> Result<CountTable, AggregateError> {
        Self::require(table, IncidentColumn::Weapon)?;
        let rows = Self::value_counts(table.records().iter().filter_map(|r| r.weapon.as_deref()));
        Ok(CountTable::new("Weapon", rows).top_n(n))
    }

    /// Month x area counts. Rows without an area are ignored.
    pub fn crosstab_month_region(table: &IncidentTable) -> Result<CrossTab, AggregateError> {
        Self::require(table, IncidentColumn::Area)?;
        let mut cells: HashMap<(NaiveDate, &str), u64> = HashMap::new();
        let mut months: BTreeSet<NaiveDate> = BTreeSet::new();
        let mut regions: BTreeSet<&str> = BTreeSet::new();

        for record in table.records() {
            let Some(area) = record.area.as_deref() else {
                continue;
            };
            let month = Period::Month.bucket(record.date_occ);
            months.insert(month);
            regions.insert(area);
            *cells.entry((month, area)).or_default() += 1;
        }

        let counts = months
            .iter()
            .map(|&m| {
                regions
                    .iter()
                    .map(|&r| cells.get(&(m, r)).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        Ok(CrossTab {
            months: months.into_iter().map(|m| Period::Month.label(m)).collect(),
            regions: regions.into_iter().map(str::to_string).collect(),
            counts,
        })
    }
}
