use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::model::{distinct_counts, SalesDataset, SalesRecord};
use crate::config::{Aggregation, DenominatorScope};

/// `num / den`, or 0 when there is nothing to divide by.
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SummaryMetrics {
    pub rows: usize,
    /// Total revenue (GMV); null revenue counts as 0.
    pub gmv: f64,
    pub units: i64,
    /// Average selling price, rounded half-to-even; 0 when no units.
    pub asp: f64,
    pub drr_gmv: f64,
    pub drr_units: f64,
    /// Average order value.
    pub aov: f64,
    /// Denominator of the two DRR figures.
    pub distinct_order_dates: usize,
    /// Denominator of AOV.
    pub distinct_orders: usize,
}

impl SummaryMetrics {
    pub fn compute(dataset: &SalesDataset, rows: &[&SalesRecord], scope: DenominatorScope) -> Self {
        let gmv: f64 = rows.iter().filter_map(|r| r.revenue).sum();
        let units = rows
            .iter()
            .filter_map(|r| r.qty)
            .fold(0i64, i64::saturating_add);

        let (distinct_order_dates, distinct_orders) = match scope {
            DenominatorScope::FullDataset => {
                (dataset.distinct_order_dates, dataset.distinct_orders)
            }
            DenominatorScope::Filtered => distinct_counts(rows.iter().copied()),
        };

        let days = distinct_order_dates as f64;
        SummaryMetrics {
            rows: rows.len(),
            gmv,
            units,
            asp: ratio(gmv, units as f64).round_ties_even(),
            drr_gmv: ratio(gmv, days),
            drr_units: ratio(units as f64, days),
            aov: ratio(gmv, distinct_orders as f64),
            distinct_order_dates,
            distinct_orders,
        }
    }
}

// ---------------------------------------------------------------------------
// Grouped tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub revenue: f64,
}

/// Five-number summary plus outliers, as drawn by a box plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// Quartiles by linear interpolation; whiskers reach the furthest value
    /// within 1.5 × IQR of the box. `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let reach = 1.5 * (q3 - q1);
        let (lo_fence, hi_fence) = (q1 - reach, q3 + reach);

        let inside = sorted.iter().copied().filter(|v| (lo_fence..=hi_fence).contains(v));
        let lower_whisker = inside.clone().fold(f64::INFINITY, f64::min);
        let upper_whisker = inside.fold(f64::NEG_INFINITY, f64::max);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| !(lo_fence..=hi_fence).contains(v))
            .collect();

        Some(BoxStats {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            outliers,
        })
    }
}

/// Quantile of sorted data, interpolating between the two nearest ranks.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSpread {
    pub zone: String,
    /// Non-null revenue of every row in the zone.
    pub values: Vec<f64>,
    pub stats: Option<BoxStats>,
}

/// One grouped table, tagged by the chart it feeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum AggregateTable {
    CategoryTotals(Vec<GroupTotal>),
    DailyTotals(Vec<DailyTotal>),
    ZoneDistribution(Vec<ZoneSpread>),
    PlatformTotals(Vec<GroupTotal>),
}

fn sum_by_key<'a>(
    rows: &[&'a SalesRecord],
    key: impl Fn(&'a SalesRecord) -> &'a str,
) -> Vec<GroupTotal> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for &r in rows {
        *totals.entry(key(r)).or_default() += r.revenue.unwrap_or(0.0);
    }
    totals
        .into_iter()
        .map(|(key, revenue)| GroupTotal {
            key: key.to_string(),
            revenue,
        })
        .collect()
}

pub fn revenue_by_category(rows: &[&SalesRecord]) -> Vec<GroupTotal> {
    sum_by_key(rows, |r| r.category.as_str())
}

pub fn revenue_by_platform(rows: &[&SalesRecord]) -> Vec<GroupTotal> {
    sum_by_key(rows, |r| r.platform.as_str())
}

/// Revenue per order date, ascending. Rows without a date are left out.
pub fn revenue_by_date(rows: &[&SalesRecord]) -> Vec<DailyTotal> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in rows {
        if let Some(d) = r.order_date {
            *totals.entry(d).or_default() += r.revenue.unwrap_or(0.0);
        }
    }
    totals
        .into_iter()
        .map(|(date, revenue)| DailyTotal { date, revenue })
        .collect()
}

pub fn revenue_by_zone(rows: &[&SalesRecord]) -> Vec<ZoneSpread> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in rows {
        let values = groups.entry(r.zone.as_str()).or_default();
        if let Some(v) = r.revenue {
            values.push(v);
        }
    }
    groups
        .into_iter()
        .map(|(zone, values)| ZoneSpread {
            zone: zone.to_string(),
            stats: BoxStats::from_values(&values),
            values,
        })
        .collect()
}

impl AggregateTable {
    pub fn compute(kind: Aggregation, rows: &[&SalesRecord]) -> Self {
        match kind {
            Aggregation::CategoryTotals => AggregateTable::CategoryTotals(revenue_by_category(rows)),
            Aggregation::DailyTotals => AggregateTable::DailyTotals(revenue_by_date(rows)),
            Aggregation::ZoneDistribution => AggregateTable::ZoneDistribution(revenue_by_zone(rows)),
            Aggregation::PlatformTotals => AggregateTable::PlatformTotals(revenue_by_platform(rows)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterField;
    use crate::data::filter::{filtered_indices, FilterSelection, Selection};
    use crate::data::model::tests::{date, record, three_rows};

    fn rows_of(ds: &SalesDataset) -> Vec<&SalesRecord> {
        ds.records.iter().collect()
    }

    #[test]
    fn worked_example_metrics() {
        let ds = three_rows();
        let mut sel = FilterSelection::full(&ds, &FilterField::ALL);
        sel.set(FilterField::Category, Selection::parse("Electronics"));
        sel.set(FilterField::Zone, Selection::parse("North"));
        sel.set(FilterField::Platform, Selection::parse("Web"));
        let rows: Vec<&SalesRecord> = filtered_indices(&ds, &sel)
            .into_iter()
            .map(|i| &ds.records[i])
            .collect();

        let m = SummaryMetrics::compute(&ds, &rows, DenominatorScope::FullDataset);
        assert_eq!(m.rows, 2);
        assert_eq!(m.gmv, 100.0);
        assert_eq!(m.units, 3);
        assert_eq!(m.asp, 33.0);
        // Denominators come from all three rows of the file.
        assert_eq!(m.distinct_order_dates, 3);
        assert_eq!(m.distinct_orders, 3);
        assert!((m.drr_gmv - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.drr_units, 1.0);
        assert!((m.aov - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn filtered_scope_counts_only_the_subset() {
        let ds = three_rows();
        let rows = vec![&ds.records[0]];
        let m = SummaryMetrics::compute(&ds, &rows, DenominatorScope::Filtered);
        assert_eq!(m.distinct_order_dates, 1);
        assert_eq!(m.distinct_orders, 1);
        assert_eq!(m.drr_gmv, 100.0);
        assert_eq!(m.aov, 100.0);
    }

    #[test]
    fn zero_units_gives_zero_asp() {
        let ds = SalesDataset::from_records(vec![record(
            "A",
            "N",
            "Web",
            Some(date(2024, 1, 1)),
            "1",
            Some(40.0),
            0,
        )]);
        let m = SummaryMetrics::compute(&ds, &rows_of(&ds), DenominatorScope::FullDataset);
        assert_eq!(m.units, 0);
        assert_eq!(m.asp, 0.0);
    }

    #[test]
    fn empty_subset_is_all_zero() {
        let ds = SalesDataset::from_records(Vec::new());
        let m = SummaryMetrics::compute(&ds, &[], DenominatorScope::FullDataset);
        assert_eq!(m, SummaryMetrics::default());
        assert!(revenue_by_category(&[]).is_empty());
        assert!(revenue_by_date(&[]).is_empty());
        assert!(revenue_by_zone(&[]).is_empty());
    }

    #[test]
    fn huge_quantities_saturate_instead_of_overflowing() {
        let ds = SalesDataset::from_records(vec![
            record("A", "N", "Web", Some(date(2024, 1, 1)), "1", Some(10.0), i64::MAX),
            record("A", "N", "Web", Some(date(2024, 1, 2)), "2", Some(10.0), i64::MAX),
        ]);
        let m = SummaryMetrics::compute(&ds, &rows_of(&ds), DenominatorScope::FullDataset);
        assert_eq!(m.units, i64::MAX);
        assert_eq!(m.asp, 0.0);
        assert!(m.drr_units.is_finite());
    }

    #[test]
    fn asp_rounds_half_to_even() {
        let ds = SalesDataset::from_records(vec![record(
            "A",
            "N",
            "Web",
            Some(date(2024, 1, 1)),
            "1",
            Some(5.0),
            2,
        )]);
        let m = SummaryMetrics::compute(&ds, &rows_of(&ds), DenominatorScope::FullDataset);
        assert_eq!(m.asp, 2.0);
    }

    #[test]
    fn category_totals_sum_to_gmv() {
        let ds = three_rows();
        let rows = rows_of(&ds);
        let by_cat = revenue_by_category(&rows);
        let m = SummaryMetrics::compute(&ds, &rows, DenominatorScope::FullDataset);
        let total: f64 = by_cat.iter().map(|g| g.revenue).sum();
        assert!((total - m.gmv).abs() < 1e-9);
        assert_eq!(
            by_cat,
            vec![
                GroupTotal { key: "Apparel".into(), revenue: 50.0 },
                GroupTotal { key: "Electronics".into(), revenue: 100.0 },
            ]
        );
    }

    #[test]
    fn daily_totals_are_chronological() {
        let ds = SalesDataset::from_records(vec![
            record("A", "N", "Web", Some(date(2024, 3, 9)), "1", Some(1.0), 1),
            record("A", "N", "Web", None, "2", Some(99.0), 1),
            record("A", "N", "Web", Some(date(2023, 12, 31)), "3", Some(2.0), 1),
            record("A", "N", "Web", Some(date(2024, 3, 9)), "4", Some(4.0), 1),
            record("A", "N", "Web", Some(date(2024, 1, 15)), "5", None, 1),
        ]);
        let daily = revenue_by_date(&rows_of(&ds));
        let dates: Vec<NaiveDate> = daily.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date(2023, 12, 31), date(2024, 1, 15), date(2024, 3, 9)]);
        assert_eq!(daily[1].revenue, 0.0);
        assert_eq!(daily[2].revenue, 5.0);
    }

    #[test]
    fn zone_distribution_keeps_every_value() {
        let ds = three_rows();
        let zones = revenue_by_zone(&rows_of(&ds));
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].zone, "North");
        assert_eq!(zones[0].values, vec![100.0]);
        assert_eq!(zones[1].values, vec![50.0]);
        assert_eq!(zones[0].stats.as_ref().map(|s| s.median), Some(100.0));
    }

    #[test]
    fn platform_totals() {
        let ds = three_rows();
        let by_platform = revenue_by_platform(&rows_of(&ds));
        assert_eq!(by_platform[0].key, "App");
        assert_eq!(by_platform[1].revenue, 100.0);
    }

    #[test]
    fn box_stats_quartiles_and_outliers() {
        let stats = BoxStats::from_values(&[5.0, 1.0, 3.0, 2.0, 4.0, 100.0]).unwrap();
        assert_eq!(stats.q1, 2.25);
        assert_eq!(stats.median, 3.5);
        assert_eq!(stats.q3, 4.75);
        assert_eq!(stats.lower_whisker, 1.0);
        assert_eq!(stats.upper_whisker, 5.0);
        assert_eq!(stats.outliers, vec![100.0]);
        assert!(BoxStats::from_values(&[]).is_none());
    }

    #[test]
    fn box_stats_single_value() {
        let stats = BoxStats::from_values(&[7.0]).unwrap();
        assert_eq!(stats.q1, 7.0);
        assert_eq!(stats.upper_whisker, 7.0);
        assert!(stats.outliers.is_empty());
    }
}
