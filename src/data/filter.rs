//! Filter Stage
//! Narrows a cleaned table by date range, category and area.

use crate::data::table::IncidentTable;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// User-selected filters. Empty sets mean "no filtering on that dimension".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParams {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub categories: BTreeSet<String>,
    pub regions: BTreeSet<String>,
}

impl FilterParams {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            categories: BTreeSet::new(),
            regions: BTreeSet::new(),
        }
    }

    /// Reset filters: the table's full date range, no category/area selection.
    /// Returns `None` for an empty table.
    pub fn full_range(table: &IncidentTable) -> Option<Self> {
        let (start, end) = table.date_range()?;
        Some(Self::new(start, end))
    }

    /// The table's date range narrowed by `from`/`to` when given. An empty
    /// table has no range, so both bounds collapse onto `from`, `to` or today.
    pub fn covering(
        table: &IncidentTable,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Self {
        let (first, last) = table.date_range().unwrap_or_else(|| {
            let day = from
                .or(to)
                .unwrap_or_else(|| chrono::Local::now().date_naive());
            (day, day)
        });
        Self::new(from.unwrap_or(first), to.unwrap_or(last))
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    /// Apply to a table, producing a new derived table.
    pub fn apply(&self, table: &IncidentTable) -> IncidentTable {
        let records = table
            .records()
            .iter()
            .filter(|r| r.date_occ >= self.start && r.date_occ <= self.end)
            .filter(|r| Self::allows(&self.categories, r.category.as_deref()))
            .filter(|r| Self::allows(&self.regions, r.area.as_deref()))
            .cloned()
            .collect::<Vec<_>>();

        log::debug!(
            "Filter {}..={} ({} categories, {} areas): {} -> {} rows",
            self.start,
            self.end,
            self.categories.len(),
            self.regions.len(),
            table.len(),
            records.len()
        );

        table.derive(records)
    }

    fn allows(selected: &BTreeSet<String>, value: Option<&str>) -> bool {
        selected.is_empty() || value.is_some_and(|v| selected.contains(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::{Incident, IncidentColumn};
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(d: NaiveDate, category: &str, area: &str) -> Incident {
        let mut r = Incident::on(d);
        r.category = Some(category.into());
        r.area = Some(area.into());
        r
    }

    fn sample() -> IncidentTable {
        let mut missing = Incident::on(date(2020, 1, 20));
        missing.category = Some("THEFT".into());
        IncidentTable::new(
            vec![
                row(date(2020, 1, 5), "THEFT", "Hollywood"),
                row(date(2020, 1, 6), "THEFT", "Hollywood"),
                row(date(2020, 2, 1), "ASSAULT", "Rampart"),
                row(date(2020, 3, 15), "BURGLARY", "Central"),
                missing,
            ],
            BTreeSet::from([IncidentColumn::Category, IncidentColumn::Area]),
        )
    }

    #[test]
    fn full_range_keeps_every_row() {
        let table = sample();
        let params = FilterParams::full_range(&table).unwrap();
        assert_eq!(params.start, date(2020, 1, 5));
        assert_eq!(params.end, date(2020, 3, 15));
        assert_eq!(params.apply(&table).len(), table.len());
        assert!(FilterParams::full_range(&IncidentTable::default()).is_none());
    }

    #[test]
    fn covering_narrows_only_given_bounds() {
        let table = sample();
        let params = FilterParams::covering(&table, Some(date(2020, 2, 1)), None);
        assert_eq!(params.start, date(2020, 2, 1));
        assert_eq!(params.end, date(2020, 3, 15));
        assert_eq!(
            FilterParams::covering(&table, None, None),
            FilterParams::full_range(&table).unwrap()
        );

        let empty = IncidentTable::default();
        let params = FilterParams::covering(&empty, None, Some(date(2021, 6, 1)));
        assert_eq!((params.start, params.end), (date(2021, 6, 1), date(2021, 6, 1)));
        assert!(params.apply(&empty).is_empty());
    }

    #[test]
    fn date_range_is_inclusive() {
        let table = sample();
        let filtered = FilterParams::new(date(2020, 1, 6), date(2020, 2, 1)).apply(&table);
        let dates: Vec<NaiveDate> = filtered.records().iter().map(|r| r.date_occ).collect();
        assert_eq!(dates, vec![date(2020, 1, 6), date(2020, 2, 1), date(2020, 1, 20)]);
    }

    #[test]
    fn category_and_region_sets_combine() {
        let table = sample();
        let params = FilterParams::full_range(&table)
            .unwrap()
            .with_categories(["THEFT", "ASSAULT"]);
        assert_eq!(params.apply(&table).len(), 4);

        let params = params.with_regions(["Hollywood"]);
        let filtered = params.apply(&table);
        assert_eq!(filtered.len(), 2);
        assert!(filtered
            .records()
            .iter()
            .all(|r| r.area.as_deref() == Some("Hollywood")));
        assert!(filtered.has_column(IncidentColumn::Area));
    }

    #[test]
    fn null_values_never_match_a_selection() {
        let table = sample();
        let params = FilterParams::full_range(&table)
            .unwrap()
            .with_regions(["Hollywood", "Rampart", "Central"]);
        assert_eq!(params.apply(&table).len(), 4);
    }

    #[test]
    fn inverted_range_is_empty() {
        let table = sample();
        let filtered = FilterParams::new(date(2020, 3, 1), date(2020, 1, 1)).apply(&table);
        assert!(filtered.is_empty());
    }
}
