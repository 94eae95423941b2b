use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::model::{SalesDataset, SalesRecord};
use crate::config::FilterField;

/// Label of the "no constraint" entry in every filter drop-down.
pub const ALL_LABEL: &str = "All";

// ---------------------------------------------------------------------------
// Filter predicate: one choice per categorical field plus a date range
// ---------------------------------------------------------------------------

/// Choice for a single categorical field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// `"All"` maps to [`Selection::All`], anything else to that exact value.
    /// A leading `=` forces an exact match, so `=All` selects a value named "All".
    pub fn parse(raw: &str) -> Self {
        if let Some(exact) = raw.strip_prefix('=') {
            Selection::Only(exact.to_string())
        } else if raw == ALL_LABEL {
            Selection::All
        } else {
            Selection::Only(raw.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL_LABEL),
            Selection::Only(v) => f.write_str(v),
        }
    }
}

/// Inclusive order-date window. `start > end` selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The dataset's own min..=max, or unbounded when it has no valid date.
    pub fn full(dataset: &SalesDataset) -> Self {
        match dataset.date_bounds {
            Some((start, end)) => Self { start, end },
            None => Self {
                start: NaiveDate::MIN,
                end: NaiveDate::MAX,
            },
        }
    }

    /// Null dates never fall inside a range.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        date.is_some_and(|d| self.start <= d && d <= self.end)
    }
}

/// Everything the user picked in the filter panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    /// Fields absent from the map are unconstrained.
    pub choices: BTreeMap<FilterField, Selection>,
    pub date_range: DateRange,
}

impl FilterSelection {
    /// "All" for every field and the dataset's full date range.
    pub fn full(dataset: &SalesDataset, fields: &[FilterField]) -> Self {
        Self {
            choices: fields.iter().map(|&f| (f, Selection::All)).collect(),
            date_range: DateRange::full(dataset),
        }
    }

    pub fn choice(&self, field: FilterField) -> &Selection {
        const ALL: &Selection = &Selection::All;
        self.choices.get(&field).unwrap_or(ALL)
    }

    pub fn set(&mut self, field: FilterField, selection: Selection) {
        self.choices.insert(field, selection);
    }

    /// Whether one record passes every active predicate.
    pub fn accepts(&self, record: &SalesRecord) -> bool {
        self.choices
            .iter()
            .all(|(&field, sel)| sel.matches(record.value(field)))
            && self.date_range.contains(record.order_date)
    }
}

/// Return indices of records that pass all active filters.
///
/// The dataset is never modified; each call derives a fresh subset.
pub fn filtered_indices(dataset: &SalesDataset, selection: &FilterSelection) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| selection.accepts(r))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{date, record, three_rows};

    fn electronics_north_web(ds: &SalesDataset) -> FilterSelection {
        let mut sel = FilterSelection::full(ds, &FilterField::ALL);
        sel.set(FilterField::Category, Selection::parse("Electronics"));
        sel.set(FilterField::Zone, Selection::parse("North"));
        sel.set(FilterField::Platform, Selection::parse("Web"));
        sel
    }

    #[test]
    fn equals_prefix_selects_a_value_named_all() {
        assert_eq!(Selection::parse("All"), Selection::All);
        assert_eq!(Selection::parse("=All"), Selection::Only("All".into()));
        assert_eq!(Selection::parse("=Web"), Selection::Only("Web".into()));

        let ds = SalesDataset::from_records(vec![
            record("All", "N", "Web", Some(date(2024, 1, 1)), "1", Some(1.0), 1),
            record("Toys", "N", "Web", Some(date(2024, 1, 1)), "2", Some(1.0), 1),
        ]);
        let mut sel = FilterSelection::full(&ds, &FilterField::ALL);
        sel.set(FilterField::Category, Selection::parse("=All"));
        assert_eq!(filtered_indices(&ds, &sel), vec![0]);
    }

    #[test]
    fn all_and_full_range_returns_everything() {
        let ds = three_rows();
        let sel = FilterSelection::full(&ds, &FilterField::ALL);
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 1, 2]);
    }

    #[test]
    fn fields_combine_with_and() {
        let ds = three_rows();
        let sel = electronics_north_web(&ds);
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 2]);

        let mut sel = sel;
        sel.set(FilterField::Platform, Selection::parse("App"));
        assert!(filtered_indices(&ds, &sel).is_empty());
    }

    #[test]
    fn every_retained_row_satisfies_predicates() {
        let ds = three_rows();
        for category in ["All", "Electronics", "Apparel", "Unknown"] {
            for zone in ["All", "North", "South"] {
                let mut sel = FilterSelection::full(&ds, &FilterField::ALL);
                sel.set(FilterField::Category, Selection::parse(category));
                sel.set(FilterField::Zone, Selection::parse(zone));
                let rows = filtered_indices(&ds, &sel);
                assert!(rows.len() <= ds.len());
                for i in rows {
                    let r = &ds.records[i];
                    assert!(category == "All" || r.category == category);
                    assert!(zone == "All" || r.zone == zone);
                }
            }
        }
    }

    #[test]
    fn date_range_is_inclusive() {
        let ds = three_rows();
        let mut sel = FilterSelection::full(&ds, &FilterField::ALL);
        sel.date_range = DateRange::new(date(2024, 1, 2), date(2024, 1, 3));
        assert_eq!(filtered_indices(&ds, &sel), vec![1, 2]);
        sel.date_range = DateRange::new(date(2024, 1, 2), date(2024, 1, 2));
        assert_eq!(filtered_indices(&ds, &sel), vec![1]);
    }

    #[test]
    fn inverted_range_is_empty_not_an_error() {
        let ds = three_rows();
        let mut sel = FilterSelection::full(&ds, &FilterField::ALL);
        sel.date_range = DateRange::new(date(2024, 1, 3), date(2024, 1, 1));
        assert!(filtered_indices(&ds, &sel).is_empty());
    }

    #[test]
    fn null_dates_are_excluded() {
        let ds = SalesDataset::from_records(vec![
            record("A", "N", "Web", None, "1", Some(5.0), 1),
            record("A", "N", "Web", Some(date(2024, 5, 1)), "2", Some(5.0), 1),
        ]);
        let sel = FilterSelection::full(&ds, &FilterField::ALL);
        assert_eq!(filtered_indices(&ds, &sel), vec![1]);
    }

    #[test]
    fn dataset_without_dates_gets_unbounded_range() {
        let ds = SalesDataset::from_records(vec![record("A", "N", "Web", None, "1", None, 1)]);
        let range = DateRange::full(&ds);
        assert_eq!(range.start, NaiveDate::MIN);
        assert_eq!(range.end, NaiveDate::MAX);
        assert!(!range.contains(None));
    }

    #[test]
    fn filtering_leaves_dataset_untouched() {
        let ds = three_rows();
        let before = ds.records.clone();
        let _ = filtered_indices(&ds, &electronics_north_web(&ds));
        assert_eq!(ds.records, before);
    }

    #[test]
    fn unknown_field_choice_defaults_to_all() {
        let ds = three_rows();
        let sel = FilterSelection::full(&ds, &[FilterField::Category]);
        assert_eq!(sel.choice(FilterField::Platform), &Selection::All);
    }
}
