mod app;
mod cli;
mod color;
mod config;
mod data;
mod report;
mod state;
mod ui;

use anyhow::{anyhow, Context};
use app::SalesDashboardApp;
use clap::Parser;
use cli::Args;
use config::DashboardConfig;
use data::filter::FilterSelection;
use eframe::egui;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = DashboardConfig::discover(args.config.as_deref())?;
    if let Some(path) = args.data {
        config.data_path = path;
    }

    let dataset = data::loader::load_file(&config.data_path, &config.columns)
        .with_context(|| format!("loading {}", config.data_path.display()))?;
    log::info!(
        "Loaded {} orders from {} ({} categories, {} zones, {} platforms)",
        dataset.len(),
        config.data_path.display(),
        dataset.values(config::FilterField::Category).count(),
        dataset.values(config::FilterField::Zone).count(),
        dataset.values(config::FilterField::Platform).count(),
    );

    let mut selection = FilterSelection::full(&dataset, &config.filters);
    args.filters.apply(&config.filters, &mut selection)?;

    if args.report {
        let snapshot = data::pipeline::run(&dataset, &selection, &config);
        return report::write_report(
            std::io::stdout().lock(),
            &report::Report {
                data_path: &config.data_path,
                total_rows: dataset.len(),
                selection: &selection,
                snapshot: &snapshot,
            },
        );
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Dashboard – Revenue Analysis",
        options,
        Box::new(move |_cc| {
            let mut app = SalesDashboardApp::new(config, dataset);
            app.state.selection = selection;
            app.state.refresh();
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow!("running dashboard window: {e}"))
}
