use std::f32::consts::{FRAC_PI_2, TAU};

use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Color32, RichText, Stroke, Ui};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Line, Plot, PlotPoints, Points};

use crate::config::FilterField;
use crate::data::aggregate::{AggregateTable, DailyTotal, GroupTotal, ZoneSpread};
use crate::state::AppState;
use crate::ui::summary::format_amount;

const CHART_HEIGHT: f32 = 240.0;

fn day_number(d: NaiveDate) -> f64 {
    d.num_days_from_ce() as f64
}

fn day_label(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Axis label for bar/box position `x`, blank between slots.
fn slot_label(names: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    names.get(idx as usize).cloned().unwrap_or_default()
}

fn empty_note(ui: &mut Ui) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.label(RichText::new("No rows match the current filters").italics());
    });
}

// ---------------------------------------------------------------------------
// Chart dispatch
// ---------------------------------------------------------------------------

/// Title shown above a table's chart.
pub fn chart_title(table: &AggregateTable) -> &'static str {
    match table {
        AggregateTable::CategoryTotals(_) => "Total Revenue by Category",
        AggregateTable::DailyTotals(_) => "Revenue Over Time (Order Date)",
        AggregateTable::ZoneDistribution(_) => "Revenue Distribution by Customer Zone",
        AggregateTable::PlatformTotals(_) => "Revenue Share by Platform",
    }
}

/// Draw one grouped table with its chart.
pub fn chart(ui: &mut Ui, id: usize, table: &AggregateTable, state: &AppState) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.strong(chart_title(table));
        ui.set_min_height(CHART_HEIGHT + 20.0);
        match table {
            AggregateTable::CategoryTotals(rows) => category_bars(ui, id, rows, state),
            AggregateTable::DailyTotals(rows) => daily_line(ui, id, rows),
            AggregateTable::ZoneDistribution(rows) => zone_boxes(ui, id, rows, state),
            AggregateTable::PlatformTotals(rows) => platform_pie(ui, rows, state),
        }
    });
}

// ---------------------------------------------------------------------------
// Bar: revenue by category
// ---------------------------------------------------------------------------

fn category_bars(ui: &mut Ui, id: usize, rows: &[GroupTotal], state: &AppState) {
    if rows.is_empty() {
        return empty_note(ui);
    }
    let names: Vec<String> = rows.iter().map(|g| g.key.clone()).collect();
    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .map(|(i, g)| {
            Bar::new(i as f64, g.revenue)
                .name(&g.key)
                .width(0.6)
                .fill(state.color_for(FilterField::Category, &g.key))
        })
        .collect();

    Plot::new(("category_bars", id))
        .height(CHART_HEIGHT)
        .x_axis_label("Category")
        .y_axis_label("Revenue")
        .x_axis_formatter(move |mark, _range| slot_label(&names, mark.value))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Revenue"));
        });
}

// ---------------------------------------------------------------------------
// Line: revenue by date
// ---------------------------------------------------------------------------

fn daily_line(ui: &mut Ui, id: usize, rows: &[DailyTotal]) {
    if rows.is_empty() {
        return empty_note(ui);
    }
    let points: Vec<[f64; 2]> = rows
        .iter()
        .map(|d| [day_number(d.date), d.revenue])
        .collect();
    let color = Color32::from_rgb(46, 139, 87);

    Plot::new(("daily_line", id))
        .height(CHART_HEIGHT)
        .x_axis_label("Order Date")
        .y_axis_label("Revenue")
        .x_axis_formatter(|mark, _range| day_label(mark.value))
        .label_formatter(|_name, value| {
            format!("{}\n{}", day_label(value.x), format_amount(value.y))
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .name("Revenue")
                    .color(color)
                    .width(1.5),
            );
            plot_ui.points(Points::new(PlotPoints::from(points)).radius(3.0).color(color));
        });
}

// ---------------------------------------------------------------------------
// Box: revenue distribution by zone
// ---------------------------------------------------------------------------

fn zone_boxes(ui: &mut Ui, id: usize, rows: &[ZoneSpread], state: &AppState) {
    if rows.is_empty() {
        return empty_note(ui);
    }
    let names: Vec<String> = rows.iter().map(|z| z.zone.clone()).collect();

    let mut boxes = Vec::new();
    let mut outliers = Vec::new();
    for (i, spread) in rows.iter().enumerate() {
        let Some(stats) = &spread.stats else {
            continue;
        };
        let color = state.color_for(FilterField::Zone, &spread.zone);
        boxes.push(
            BoxElem::new(
                i as f64,
                BoxSpread::new(
                    stats.lower_whisker,
                    stats.q1,
                    stats.median,
                    stats.q3,
                    stats.upper_whisker,
                ),
            )
            .name(&spread.zone)
            .fill(color.gamma_multiply(0.6))
            .stroke(Stroke::new(1.5, color))
            .box_width(0.5)
            .whisker_width(0.3),
        );
        outliers.extend(stats.outliers.iter().map(|&v| [i as f64, v]));
    }

    Plot::new(("zone_boxes", id))
        .height(CHART_HEIGHT)
        .x_axis_label("Customer Zone")
        .y_axis_label("Revenue")
        .x_axis_formatter(move |mark, _range| slot_label(&names, mark.value))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(boxes).name("Revenue"));
            if !outliers.is_empty() {
                plot_ui.points(
                    Points::new(PlotPoints::from(outliers))
                        .name("Outliers")
                        .radius(2.5)
                        .color(Color32::DARK_GRAY),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Pie: revenue share by platform
// ---------------------------------------------------------------------------

/// Each slice's fraction of the positive total. Negative totals get no slice.
pub fn pie_shares(rows: &[GroupTotal]) -> Vec<f64> {
    let total: f64 = rows.iter().map(|g| g.revenue.max(0.0)).sum();
    rows.iter()
        .map(|g| if total > 0.0 { g.revenue.max(0.0) / total } else { 0.0 })
        .collect()
}

fn platform_pie(ui: &mut Ui, rows: &[GroupTotal], state: &AppState) {
    let shares = pie_shares(rows);
    if shares.iter().all(|&s| s == 0.0) {
        return empty_note(ui);
    }

    ui.horizontal(|ui: &mut Ui| {
        let size = CHART_HEIGHT;
        let (response, painter) =
            ui.allocate_painter(egui::vec2(size, size), egui::Sense::hover());
        let center = response.rect.center();
        let radius = size * 0.45;

        let mut angle = -FRAC_PI_2;
        for (g, &share) in rows.iter().zip(&shares) {
            let sweep = share as f32 * TAU;
            if sweep <= 0.0 {
                continue;
            }
            let color = state.color_for(FilterField::Platform, &g.key);
            // Thin fan triangles keep every piece convex.
            let steps = ((sweep / 0.05).ceil() as usize).max(1);
            for s in 0..steps {
                let a0 = angle + sweep * s as f32 / steps as f32;
                let a1 = angle + sweep * (s + 1) as f32 / steps as f32;
                painter.add(egui::Shape::convex_polygon(
                    vec![
                        center,
                        center + radius * egui::vec2(a0.cos(), a0.sin()),
                        center + radius * egui::vec2(a1.cos(), a1.sin()),
                    ],
                    color,
                    Stroke::NONE,
                ));
            }
            angle += sweep;
        }

        ui.vertical(|ui: &mut Ui| {
            for (g, &share) in rows.iter().zip(&shares) {
                ui.horizontal(|ui: &mut Ui| {
                    let (swatch, _) =
                        ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                    ui.painter().rect_filled(
                        swatch,
                        2.0,
                        state.color_for(FilterField::Platform, &g.key),
                    );
                    ui.label(format!(
                        "{}: {} ({:.1}%)",
                        g.key,
                        format_amount(g.revenue),
                        share * 100.0
                    ));
                });
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_numbers_round_trip_to_labels() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(day_label(day_number(d)), "2024-02-29");
        assert_eq!(day_label(day_number(d) + 0.3), "2024-02-29");
    }

    #[test]
    fn slot_labels_only_on_integers() {
        let names = vec!["Apparel".to_string(), "Toys".to_string()];
        assert_eq!(slot_label(&names, 1.0), "Toys");
        assert_eq!(slot_label(&names, 0.5), "");
        assert_eq!(slot_label(&names, 2.0), "");
        assert_eq!(slot_label(&names, -1.0), "");
    }

    #[test]
    fn pie_shares_ignore_negative_totals() {
        let rows = vec![
            GroupTotal { key: "App".into(), revenue: 30.0 },
            GroupTotal { key: "Web".into(), revenue: 90.0 },
            GroupTotal { key: "Refunds".into(), revenue: -10.0 },
        ];
        assert_eq!(pie_shares(&rows), vec![0.25, 0.75, 0.0]);
        assert_eq!(pie_shares(&[]), Vec::<f64>::new());
    }
}
