use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter::{Selection, ALL_LABEL};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Data");
    ui.separator();

    let fields = state.config.filters.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- One drop-down per categorical field ----
            for field in fields {
                ui.strong(format!("Select {}", field.label()));

                let current = state.selection.choice(field).clone();
                let mut picked = current.clone();
                egui::ComboBox::from_id_salt(field.label())
                    .selected_text(current.to_string())
                    .width(ui.available_width())
                    .show_ui(ui, |ui: &mut Ui| {
                        ui.selectable_value(&mut picked, Selection::All, ALL_LABEL);
                        for value in state.dataset.values(field) {
                            ui.selectable_value(
                                &mut picked,
                                Selection::Only(value.to_string()),
                                value,
                            );
                        }
                    });
                if picked != current {
                    state.set_choice(field, picked);
                }
                ui.add_space(6.0);
            }

            ui.separator();

            // ---- Date range ----
            ui.strong("Order date");
            if state.dataset.date_bounds.is_none() {
                ui.label("No valid order dates in the data.");
            } else {
                let mut start = state.selection.date_range.start;
                let mut end = state.selection.date_range.end;
                egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
                    ui.label("From");
                    ui.add(DatePickerButton::new(&mut start).id_salt("date_from"));
                    ui.end_row();
                    ui.label("To");
                    ui.add(DatePickerButton::new(&mut end).id_salt("date_to"));
                    ui.end_row();
                });
                if start > end {
                    ui.label(RichText::new("Start is after end: nothing selected").italics());
                }
                state.set_date_range(start, end);
            }

            ui.add_space(8.0);
            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the title bar with the row counts.
pub fn top_bar(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.heading("Revenue Analysis");
        ui.separator();
        ui.label(format!(
            "{} orders loaded from {}, {} selected",
            state.dataset.len(),
            state.config.data_path.display(),
            state.snapshot.rows.len()
        ));
    });
}
