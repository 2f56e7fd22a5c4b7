//! Nobel Prize Dataset
//! Loading, cleaning and counting for the companion laureate dataset.

use crate::data::{CleanError, DataCleaner, DataLoader, LoaderError};
use crate::stats::{Aggregator, CountRow, CountTable};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NobelError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error(transparent)]
    Clean(#[from] CleanError),
}

/// One prize award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NobelPrize {
    pub year: i32,
    pub category: String,
    pub birth_country: String,
    pub full_name: Option<String>,
}

pub fn load_nobel_data(path: &Path) -> Result<Vec<NobelPrize>, NobelError> {
    let raw = DataLoader::load_csv(path)?;
    Ok(clean_nobel_data(&raw)?)
}

/// Keep rows that have a year, a category and a birth country.
pub fn clean_nobel_data(raw: &DataFrame) -> Result<Vec<NobelPrize>, CleanError> {
    let df = DataCleaner::normalize_columns(raw)?;

    let years = DataCleaner::numeric_values(&df, "year", f64::trunc)?;
    let categories = DataCleaner::text_values(&df, "category")?;
    let countries = DataCleaner::text_values(&df, "birth_country")?;
    let names = DataCleaner::text_values(&df, "full_name")?;

    let (Some(years), Some(categories), Some(countries)) = (years, categories, countries) else {
        log::warn!("Nobel data lacks one of year, category, birth_country");
        return Ok(Vec::new());
    };

    let prizes: Vec<NobelPrize> = years
        .into_iter()
        .zip(categories)
        .zip(countries)
        .enumerate()
        .filter_map(|(i, ((year, category), country))| {
            Some(NobelPrize {
                year: i32::try_from(year?).ok()?,
                category: category?,
                birth_country: country?,
                full_name: names.as_ref().and_then(|n| n.get(i).cloned().flatten()),
            })
        })
        .collect();

    log::info!("Cleaned {} of {} Nobel rows", prizes.len(), df.height());
    Ok(prizes)
}

/// Prizes per category, most frequent first.
pub fn count_prizes_by_category(prizes: &[NobelPrize]) -> CountTable {
    let rows = Aggregator::value_counts(prizes.iter().map(|p| p.category.as_str()));
    CountTable::new("Category", rows).with_count_label("Prizes")
}

/// Prizes per award year, ascending.
pub fn prizes_over_time(prizes: &[NobelPrize]) -> CountTable {
    let mut counts: BTreeMap<i32, u64> = BTreeMap::new();
    for prize in prizes {
        *counts.entry(prize.year).or_default() += 1;
    }
    let rows = counts
        .into_iter()
        .map(|(year, count)| CountRow {
            key: year.to_string(),
            count,
        })
        .collect();
    CountTable::new("Year", rows).with_count_label("Prizes")
}
