use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::config::FilterField;

/// Date layouts tried in order. Month-first wins over day-first when both parse.
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

// ---------------------------------------------------------------------------
// Cell – one raw value as read from the file
// ---------------------------------------------------------------------------

/// A raw cell before it is coerced into a [`SalesRecord`] field.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Null,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Date(d) => write!(f, "{d}"),
            Cell::Null => Ok(()),
        }
    }
}

impl Cell {
    /// Text cell from a delimited file; empty text is null.
    pub fn from_text(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Null
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }

    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Text(s) => parse_date(s),
            _ => None,
        }
    }

    pub fn to_revenue(&self) -> Option<f64> {
        match self {
            Cell::Float(v) if v.is_finite() => Some(*v),
            Cell::Integer(i) => Some(*i as f64),
            Cell::Text(s) => parse_number(s),
            _ => None,
        }
    }

    pub fn to_quantity(&self) -> Option<i64> {
        match self {
            Cell::Integer(i) => Some(*i),
            Cell::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            Cell::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    parse_number(s).filter(|v| v.fract() == 0.0).map(|v| v as i64)
                })
            }
            _ => None,
        }
    }
}

/// Parse a date leniently; `None` for anything unrecognised.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Parse a numeric cell, tolerating whitespace and thousands separators.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let v = match s.parse::<f64>() {
        Ok(v) => v,
        Err(_) => s.replace(',', "").parse::<f64>().ok()?,
    };
    v.is_finite().then_some(v)
}

// ---------------------------------------------------------------------------
// SalesRecord – one row of the dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub category: String,
    pub zone: String,
    pub platform: String,
    pub order_date: Option<NaiveDate>,
    pub order_no: String,
    pub revenue: Option<f64>,
    pub qty: Option<i64>,
}

/// Counts of non-empty cells that could not be parsed and became null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coercions {
    pub dates: usize,
    pub revenue: usize,
    pub qty: usize,
}

impl Coercions {
    pub fn total(&self) -> usize {
        self.dates + self.revenue + self.qty
    }
}

impl SalesRecord {
    /// Build a record from cells in [`crate::config::ColumnNames::required`] order.
    pub fn from_cells(cells: [Cell; 7], coercions: &mut Coercions) -> Self {
        let [category, zone, platform, order_date, order_no, revenue, qty] = cells;

        let parsed_date = order_date.to_date();
        if parsed_date.is_none() && !order_date.is_null() {
            coercions.dates += 1;
        }
        let parsed_revenue = revenue.to_revenue();
        if parsed_revenue.is_none() && !revenue.is_null() {
            coercions.revenue += 1;
        }
        let parsed_qty = qty.to_quantity();
        if parsed_qty.is_none() && !qty.is_null() {
            coercions.qty += 1;
        }

        SalesRecord {
            category: category.to_text(),
            zone: zone.to_text(),
            platform: platform.to_text(),
            order_date: parsed_date,
            order_no: order_no.to_text(),
            revenue: parsed_revenue,
            qty: parsed_qty,
        }
    }

    /// Value of a categorical filter column.
    pub fn value(&self, field: FilterField) -> &str {
        match field {
            FilterField::Category => &self.category,
            FilterField::Zone => &self.zone,
            FilterField::Platform => &self.platform,
        }
    }
}

// ---------------------------------------------------------------------------
// SalesDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Count distinct non-null order dates and non-empty order numbers.
pub fn distinct_counts<'a>(records: impl IntoIterator<Item = &'a SalesRecord>) -> (usize, usize) {
    let mut dates = BTreeSet::new();
    let mut orders = BTreeSet::new();
    for r in records {
        if let Some(d) = r.order_date {
            dates.insert(d);
        }
        if !r.order_no.is_empty() {
            orders.insert(r.order_no.as_str());
        }
    }
    (dates.len(), orders.len())
}

/// The full parsed dataset with pre-computed indices. Read-only after load.
#[derive(Debug, Clone)]
pub struct SalesDataset {
    pub records: Vec<SalesRecord>,
    /// For each filter field the sorted set of observed values.
    pub unique_values: BTreeMap<FilterField, BTreeSet<String>>,
    /// Earliest and latest valid order date.
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    pub distinct_order_dates: usize,
    pub distinct_orders: usize,
}

impl SalesDataset {
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        let mut unique_values: BTreeMap<FilterField, BTreeSet<String>> = FilterField::ALL
            .iter()
            .map(|&f| (f, BTreeSet::new()))
            .collect();
        let mut date_bounds: Option<(NaiveDate, NaiveDate)> = None;

        for r in &records {
            for field in FilterField::ALL {
                if let Some(values) = unique_values.get_mut(&field) {
                    values.insert(r.value(field).to_string());
                }
            }
            if let Some(d) = r.order_date {
                date_bounds = Some(match date_bounds {
                    Some((lo, hi)) => (lo.min(d), hi.max(d)),
                    None => (d, d),
                });
            }
        }

        let (distinct_order_dates, distinct_orders) = distinct_counts(&records);

        SalesDataset {
            records,
            unique_values,
            date_bounds,
            distinct_order_dates,
            distinct_orders,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Observed values for a filter field, sorted.
    pub fn values(&self, field: FilterField) -> impl Iterator<Item = &str> {
        self.unique_values
            .get(&field)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }
}
