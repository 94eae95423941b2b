use eframe::egui::{self, RichText, Ui};

use crate::data::aggregate::SummaryMetrics;

/// Thousands-separated with two decimals, e.g. `12,345.60`.
pub fn format_amount(v: f64) -> String {
    let fixed = format!("{:.2}", v.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

fn card(ui: &mut Ui, title: &str, value: String, hint: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_min_width(130.0);
        ui.vertical(|ui: &mut Ui| {
            ui.label(RichText::new(title).small());
            ui.label(RichText::new(value).heading().strong());
        });
    })
    .response
    .on_hover_text(hint);
}

/// Row of metric cards above the charts.
pub fn summary_cards(ui: &mut Ui, m: &SummaryMetrics) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        card(ui, "GMV", format_amount(m.gmv), "Total revenue of the selected rows");
        card(ui, "Units", m.units.to_string(), "Total quantity of the selected rows");
        card(ui, "ASP", format_amount(m.asp), "GMV / units, rounded");
        card(
            ui,
            "DRR (GMV)",
            format_amount(m.drr_gmv),
            &format!("GMV / {} distinct order dates", m.distinct_order_dates),
        );
        card(
            ui,
            "DRR (Units)",
            format!("{:.2}", m.drr_units),
            &format!("Units / {} distinct order dates", m.distinct_order_dates),
        );
        card(
            ui,
            "AOV",
            format_amount(m.aov),
            &format!("GMV / {} distinct orders", m.distinct_orders),
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_grouped() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1234.5), "1,234.50");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-1000.0), "-1,000.00");
    }
}
