//! Data Cleaner Module
//! Normalizes raw incident frames and materializes typed rows.

use crate::data::table::{Incident, IncidentColumn, IncidentTable};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeSet;
use thiserror::Error;

/// Fixed occurrence-date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_OCC: &str = "date_occ";
const DATE_RPTD: &str = "date_rptd";

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Handles column normalization and type coercion.
pub struct DataCleaner;

impl DataCleaner {
    /// `"DATE OCC"` -> `"date_occ"`.
    pub fn normalize_column_name(name: &str) -> String {
        name.trim().to_lowercase().replace(' ', "_")
    }

    /// Rename every column to its normalized form.
    pub fn normalize_columns(df: &DataFrame) -> Result<DataFrame, CleanError> {
        let columns: Vec<Column> = df
            .get_columns()
            .iter()
            .map(|col| {
                let mut series = col.as_materialized_series().clone();
                series.rename(Self::normalize_column_name(col.name()).into());
                Column::from(series)
            })
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    /// Parse a date with [`DATE_FORMAT`]; anything else is `None`.
    pub fn parse_date(value: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
    }

    /// Clean a raw incident frame.
    ///
    /// Rows without a parseable occurrence date are dropped. Numeric fields
    /// that fail to parse become `None` and the row is kept.
    pub fn clean(raw: &DataFrame) -> Result<IncidentTable, CleanError> {
        let df = Self::normalize_columns(raw)?;

        let date_col = if df.column(DATE_OCC).is_ok() {
            DATE_OCC
        } else {
            log::warn!("No {DATE_OCC} column, falling back to {DATE_RPTD}");
            DATE_RPTD
        };
        let dates: Vec<Option<NaiveDate>> = match Self::text_values(&df, date_col)? {
            Some(values) => values
                .iter()
                .map(|v| v.as_deref().and_then(Self::parse_date))
                .collect(),
            None => vec![None; df.height()],
        };

        let time_occ = Self::numeric_values(&df, IncidentColumn::TimeOcc.column_name(), f64::trunc)?;
        let victim_age = Self::numeric_values(&df, IncidentColumn::VictimAge.column_name(), round_age)?;
        let category = Self::text_values(&df, IncidentColumn::Category.column_name())?;
        let area = Self::text_values(&df, IncidentColumn::Area.column_name())?;
        let victim_sex = Self::text_values(&df, IncidentColumn::VictimSex.column_name())?;
        let victim_descent = Self::text_values(&df, IncidentColumn::VictimDescent.column_name())?;
        let weapon = Self::text_values(&df, IncidentColumn::Weapon.column_name())?;

        let columns: BTreeSet<IncidentColumn> = IncidentColumn::ALL
            .into_iter()
            .filter(|c| df.column(c.column_name()).is_ok())
            .collect();

        let records: Vec<Incident> = dates
            .iter()
            .enumerate()
            .filter_map(|(i, date)| {
                Some(Incident {
                    date_occ: (*date)?,
                    time_occ: at(&time_occ, i),
                    category: at(&category, i),
                    area: at(&area, i),
                    victim_age: at(&victim_age, i),
                    victim_sex: at(&victim_sex, i),
                    victim_descent: at(&victim_descent, i),
                    weapon: at(&weapon, i),
                })
            })
            .collect();

        log::info!(
            "Cleaned {} of {} rows ({} dropped without a valid date)",
            records.len(),
            df.height(),
            df.height() - records.len()
        );

        Ok(IncidentTable::new(records, columns))
    }

    /// Trimmed string values of a column; blanks become `None`.
    /// Returns `Ok(None)` when the column does not exist.
    pub fn text_values(
        df: &DataFrame,
        name: &str,
    ) -> Result<Option<Vec<Option<String>>>, CleanError> {
        let Ok(col) = df.column(name) else {
            return Ok(None);
        };
        let series = col.as_materialized_series().cast(&DataType::String)?;
        let values = series
            .str()?
            .into_iter()
            .map(|v| {
                v.map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .collect();
        Ok(Some(values))
    }

    /// Integer values of a column. Values are trimmed, cast to Float64
    /// non-strictly so garbage becomes `None`, then rounded with `round`.
    pub fn numeric_values(
        df: &DataFrame,
        name: &str,
        round: fn(f64) -> f64,
    ) -> Result<Option<Vec<Option<i64>>>, CleanError> {
        let Some(trimmed) = Self::text_values(df, name)? else {
            return Ok(None);
        };
        let value_f64 = Series::new(name.into(), trimmed).cast(&DataType::Float64)?;
        let values = value_f64
            .f64()?
            .into_iter()
            .map(|v| v.filter(|f| f.is_finite()).map(|f| round(f) as i64))
            .collect();
        Ok(Some(values))
    }
}

/// Ages round away from zero so right-inclusive bins hold: 12.5 is past 12.
fn round_age(age: f64) -> f64 {
    if age < 0.0 {
        age.floor()
    } else {
        age.ceil()
    }
}

fn at<T: Clone>(values: &Option<Vec<Option<T>>>, i: usize) -> Option<T> {
    values.as_ref().and_then(|v| v.get(i).cloned().flatten())
}
