use serde::Serialize;

use super::aggregate::{AggregateTable, SummaryMetrics};
use super::filter::{filtered_indices, FilterSelection};
use super::model::{SalesDataset, SalesRecord};
use crate::config::DashboardConfig;

/// Everything the dashboard draws for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Indices into the dataset of the rows that passed the filters.
    #[serde(skip)]
    pub rows: Vec<usize>,
    pub metrics: SummaryMetrics,
    /// One table per configured aggregation, in config order.
    pub tables: Vec<AggregateTable>,
}

/// Filter the dataset and compute the metrics and grouped tables.
pub fn run(
    dataset: &SalesDataset,
    selection: &FilterSelection,
    config: &DashboardConfig,
) -> DashboardSnapshot {
    let rows = filtered_indices(dataset, selection);
    let subset: Vec<&SalesRecord> = rows.iter().map(|&i| &dataset.records[i]).collect();

    let metrics = SummaryMetrics::compute(dataset, &subset, config.denominator_scope);
    let tables = config
        .aggregations
        .iter()
        .map(|&kind| AggregateTable::compute(kind, &subset))
        .collect();

    log::debug!(
        "Pipeline: {} of {} rows selected, GMV {:.2}",
        rows.len(),
        dataset.len(),
        metrics.gmv
    );

    DashboardSnapshot {
        rows,
        metrics,
        tables,
    }
}
