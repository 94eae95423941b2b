use eframe::egui::{self, Ui};

use crate::config::DashboardConfig;
use crate::data::model::SalesDataset;
use crate::state::AppState;
use crate::ui::{charts, panels, summary, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SalesDashboardApp {
    pub state: AppState,
}

impl SalesDashboardApp {
    pub fn new(config: DashboardConfig, dataset: SalesDataset) -> Self {
        Self {
            state: AppState::new(config, dataset),
        }
    }
}

impl eframe::App for SalesDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: title and counts ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: metrics, charts, rows ----
        let state = &self.state;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    summary::summary_cards(ui, &state.snapshot.metrics);
                    ui.add_space(8.0);

                    for (pair_no, pair) in state.snapshot.tables.chunks(2).enumerate() {
                        ui.columns(2, |cols: &mut [Ui]| {
                            for (col, (i, table)) in cols.iter_mut().zip(pair.iter().enumerate()) {
                                charts::chart(col, pair_no * 2 + i, table, state);
                            }
                        });
                        ui.add_space(8.0);
                    }

                    egui::CollapsingHeader::new("Selected Data")
                        .default_open(true)
                        .show(ui, |ui: &mut Ui| {
                            table::selected_rows(ui, state);
                        });
                });
        });
    }
}
