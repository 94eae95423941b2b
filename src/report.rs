use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::filter::FilterSelection;
use crate::data::pipeline::DashboardSnapshot;

/// Headless output of one pipeline run.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub data_path: &'a Path,
    pub total_rows: usize,
    pub selection: &'a FilterSelection,
    #[serde(flatten)]
    pub snapshot: &'a DashboardSnapshot,
}

pub fn write_report<W: Write>(out: W, report: &Report<'_>) -> Result<()> {
    let mut out = out;
    serde_json::to_writer_pretty(&mut out, report).context("serializing report")?;
    writeln!(out).context("writing report")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DashboardConfig, FilterField};
    use crate::data::filter::Selection;
    use crate::data::model::tests::three_rows;
    use crate::data::pipeline;

    #[test]
    fn report_is_pretty_json() {
        let ds = three_rows();
        let config = DashboardConfig::default();
        let mut selection = FilterSelection::full(&ds, &config.filters);
        selection.set(FilterField::Platform, Selection::parse("App"));
        let snapshot = pipeline::run(&ds, &selection, &config);

        let mut buf = Vec::new();
        write_report(
            &mut buf,
            &Report {
                data_path: Path::new("data/base.csv"),
                total_rows: ds.len(),
                selection: &selection,
                snapshot: &snapshot,
            },
        )
        .unwrap();

        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json["total_rows"], 3);
        assert_eq!(json["metrics"]["rows"], 1);
        assert_eq!(json["metrics"]["gmv"], 50.0);
        assert_eq!(json["selection"]["choices"]["platform"]["Only"], "App");
        assert_eq!(json["selection"]["date_range"]["start"], "2024-01-01");
        assert_eq!(json["tables"].as_array().map(Vec::len), Some(4));
    }
}
