//! Incident Table Module
//! Typed, immutable view of cleaned incident rows.

use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeSet;

/// Optional source columns. The occurrence date is mandatory and not listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IncidentColumn {
    TimeOcc,
    Category,
    Area,
    VictimAge,
    VictimSex,
    VictimDescent,
    Weapon,
}

impl IncidentColumn {
    pub const ALL: [IncidentColumn; 7] = [
        IncidentColumn::TimeOcc,
        IncidentColumn::Category,
        IncidentColumn::Area,
        IncidentColumn::VictimAge,
        IncidentColumn::VictimSex,
        IncidentColumn::VictimDescent,
        IncidentColumn::Weapon,
    ];

    /// Column name after normalization.
    pub fn column_name(self) -> &'static str {
        match self {
            IncidentColumn::TimeOcc => "time_occ",
            IncidentColumn::Category => "crm_cd_desc",
            IncidentColumn::Area => "area_name",
            IncidentColumn::VictimAge => "vict_age",
            IncidentColumn::VictimSex => "vict_sex",
            IncidentColumn::VictimDescent => "vict_descent",
            IncidentColumn::Weapon => "weapon_desc",
        }
    }
}

/// One reported crime event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incident {
    pub date_occ: NaiveDate,
    /// HHMM encoded as an integer, e.g. 1230 for 12:30.
    pub time_occ: Option<i64>,
    pub category: Option<String>,
    pub area: Option<String>,
    pub victim_age: Option<i64>,
    pub victim_sex: Option<String>,
    pub victim_descent: Option<String>,
    pub weapon: Option<String>,
}

impl Incident {
    /// Minimal record with only a date; used by tests and builders.
    pub fn on(date_occ: NaiveDate) -> Self {
        Self {
            date_occ,
            time_occ: None,
            category: None,
            area: None,
            victim_age: None,
            victim_sex: None,
            victim_descent: None,
            weapon: None,
        }
    }
}

/// Cleaned incidents plus the set of optional columns the source carried.
///
/// Every record has an occurrence date. Tables are never mutated; filtering
/// derives a new table with the same column set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentTable {
    records: Vec<Incident>,
    columns: BTreeSet<IncidentColumn>,
}

impl IncidentTable {
    pub fn new(records: Vec<Incident>, columns: BTreeSet<IncidentColumn>) -> Self {
        Self { records, columns }
    }

    /// New table over a subset of rows, keeping this table's column set.
    pub fn derive(&self, records: Vec<Incident>) -> Self {
        Self {
            records,
            columns: self.columns.clone(),
        }
    }

    pub fn records(&self) -> &[Incident] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: IncidentColumn) -> bool {
        self.columns.contains(&column)
    }

    /// Earliest and latest occurrence date, `None` when empty.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date_occ).min()?;
        let max = self.records.iter().map(|r| r.date_occ).max()?;
        Some((min, max))
    }

    /// Sorted distinct crime categories.
    pub fn categories(&self) -> Vec<String> {
        Self::distinct(self.records.iter().map(|r| r.category.as_deref()))
    }

    /// Sorted distinct area names.
    pub fn regions(&self) -> Vec<String> {
        Self::distinct(self.records.iter().map(|r| r.area.as_deref()))
    }

    fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
        values
            .flatten()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Convert back to a DataFrame with the normalized column names.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
        let days: Vec<i32> = self
            .records
            .iter()
            .map(|r| (r.date_occ - epoch).num_days() as i32)
            .collect();

        let mut columns = vec![Column::new("date_occ".into(), days).cast(&DataType::Date)?];

        for column in IncidentColumn::ALL {
            if !self.has_column(column) {
                continue;
            }
            let name = column.column_name().into();
            let col = match column {
                IncidentColumn::TimeOcc => Column::new(name, self.ints(|r| r.time_occ)),
                IncidentColumn::VictimAge => Column::new(name, self.ints(|r| r.victim_age)),
                IncidentColumn::Category => Column::new(name, self.texts(|r| &r.category)),
                IncidentColumn::Area => Column::new(name, self.texts(|r| &r.area)),
                IncidentColumn::VictimSex => Column::new(name, self.texts(|r| &r.victim_sex)),
                IncidentColumn::VictimDescent => {
                    Column::new(name, self.texts(|r| &r.victim_descent))
                }
                IncidentColumn::Weapon => Column::new(name, self.texts(|r| &r.weapon)),
            };
            columns.push(col);
        }

        DataFrame::new(columns)
    }

    fn ints(&self, f: impl Fn(&Incident) -> Option<i64>) -> Vec<Option<i64>> {
        self.records.iter().map(f).collect()
    }

    fn texts(&self, f: impl Fn(&Incident) -> &Option<String>) -> Vec<Option<String>> {
        self.records.iter().map(|r| f(r).clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_and_distinct_values() {
        let mut a = Incident::on(date(2020, 3, 1));
        a.area = Some("Rampart".into());
        let mut b = Incident::on(date(2020, 1, 2));
        b.area = Some("Hollywood".into());
        let mut c = Incident::on(date(2020, 2, 9));
        c.area = Some("Rampart".into());

        let table = IncidentTable::new(vec![a, b, c], BTreeSet::from([IncidentColumn::Area]));
        assert_eq!(table.date_range(), Some((date(2020, 1, 2), date(2020, 3, 1))));
        assert_eq!(table.regions(), vec!["Hollywood".to_string(), "Rampart".to_string()]);
        assert!(table.categories().is_empty());
        assert_eq!(IncidentTable::default().date_range(), None);
    }

    #[test]
    fn dataframe_keeps_only_present_columns() {
        let mut row = Incident::on(date(2021, 6, 30));
        row.category = Some("THEFT".into());
        row.victim_age = Some(40);
        let table = IncidentTable::new(
            vec![row],
            BTreeSet::from([IncidentColumn::Category, IncidentColumn::VictimAge]),
        );

        let df = table.to_dataframe().unwrap();
        assert_eq!(df.height(), 1);
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["date_occ", "crm_cd_desc", "vict_age"]);
        assert_eq!(df.column("date_occ").unwrap().dtype(), &DataType::Date);
    }
}
