use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::SalesRecord;
use crate::state::AppState;

const HEADERS: [&str; 7] = [
    "Order No",
    "Order Date",
    "Category",
    "Customer Zone",
    "Platform",
    "Revenue",
    "Qty",
];

fn cell_texts(r: &SalesRecord) -> [String; 7] {
    let or_blank = |v: Option<String>| v.unwrap_or_default();
    [
        r.order_no.clone(),
        or_blank(r.order_date.map(|d| d.to_string())),
        r.category.clone(),
        r.zone.clone(),
        r.platform.clone(),
        or_blank(r.revenue.map(|v| format!("{v:.2}"))),
        or_blank(r.qty.map(|q| q.to_string())),
    ]
}

/// Raw view of the filtered rows.
pub fn selected_rows(ui: &mut Ui, state: &AppState) {
    let rows = &state.snapshot.rows;
    if rows.is_empty() {
        ui.label(RichText::new("No rows match the current filters").italics());
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(320.0)
        .columns(Column::auto().at_least(80.0), HEADERS.len())
        .header(20.0, |mut header| {
            for title in HEADERS {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let record = &state.dataset.records[rows[row.index()]];
                for text in cell_texts(record) {
                    row.col(|ui: &mut Ui| {
                        ui.label(text);
                    });
                }
            });
        });
}
