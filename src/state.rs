use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::color::ColorMap;
use crate::config::{DashboardConfig, FilterField};
use crate::data::filter::{DateRange, FilterSelection, Selection};
use crate::data::model::SalesDataset;
use crate::data::pipeline::{self, DashboardSnapshot};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded once at startup, read-only afterwards.
    pub dataset: SalesDataset,

    /// Current filter choices.
    pub selection: FilterSelection,

    /// Pipeline output for `selection`; replaced on every change.
    pub snapshot: DashboardSnapshot,

    /// Stable colour per observed value, for each filter field.
    pub colors: BTreeMap<FilterField, ColorMap>,
}

impl AppState {
    pub fn new(config: DashboardConfig, dataset: SalesDataset) -> Self {
        let selection = FilterSelection::full(&dataset, &config.filters);
        let snapshot = pipeline::run(&dataset, &selection, &config);
        let colors = FilterField::ALL
            .iter()
            .map(|&field| (field, ColorMap::new(dataset.values(field))))
            .collect();
        Self {
            config,
            dataset,
            selection,
            snapshot,
            colors,
        }
    }

    /// Re-run the pipeline after a filter change.
    pub fn refresh(&mut self) {
        self.snapshot = pipeline::run(&self.dataset, &self.selection, &self.config);
    }

    pub fn set_choice(&mut self, field: FilterField, selection: Selection) {
        if self.selection.choice(field) != &selection {
            log::debug!("Filter {field} -> {selection}");
            self.selection.set(field, selection);
            self.refresh();
        }
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        let range = DateRange::new(start, end);
        if self.selection.date_range != range {
            log::debug!("Date range -> {start}..={end}");
            self.selection.date_range = range;
            self.refresh();
        }
    }

    /// Back to "All" everywhere and the full date range.
    pub fn reset_filters(&mut self) {
        self.selection = FilterSelection::full(&self.dataset, &self.config.filters);
        self.refresh();
    }

    pub fn color_for(&self, field: FilterField, key: &str) -> eframe::egui::Color32 {
        self.colors
            .get(&field)
            .map(|cm| cm.color_for(key))
            .unwrap_or(eframe::egui::Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{date, three_rows};

    #[test]
    fn new_state_shows_everything() {
        let state = AppState::new(DashboardConfig::default(), three_rows());
        assert_eq!(state.snapshot.rows.len(), 3);
        assert_eq!(state.selection.date_range, DateRange::new(date(2024, 1, 1), date(2024, 1, 3)));
    }

    #[test]
    fn changes_recompute_and_reset_restores() {
        let mut state = AppState::new(DashboardConfig::default(), three_rows());
        state.set_choice(FilterField::Category, Selection::parse("Apparel"));
        assert_eq!(state.snapshot.rows, vec![1]);
        state.set_date_range(date(2024, 1, 3), date(2024, 1, 3));
        assert!(state.snapshot.rows.is_empty());
        state.reset_filters();
        assert_eq!(state.snapshot.rows.len(), 3);
    }
}
