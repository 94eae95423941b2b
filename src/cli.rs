use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser};

use crate::config::FilterField;
use crate::data::filter::{FilterSelection, Selection};
use crate::data::model::parse_date;

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive sales revenue dashboard")]
pub struct Args {
    /// Sales file to load (.csv, .tsv, .json, .parquet); overrides the config
    #[arg(long)]
    pub data: Option<PathBuf>,
    /// JSON config file (default: ./dashboard.json when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Print metrics and grouped tables as JSON instead of opening a window
    #[arg(long, default_value_t = false)]
    pub report: bool,
    #[command(flatten)]
    pub filters: FilterArgs,
}

/// Initial filter choices; "All" when omitted. Prefix a value with `=` to
/// match it exactly, e.g. `--category =All` for a category named "All".
#[derive(ClapArgs, Debug, Default)]
pub struct FilterArgs {
    /// Category to show ("All" for every category, "=All" for one named All)
    #[arg(long)]
    pub category: Option<String>,
    /// Customer zone to show ("All" for every zone, "=All" for one named All)
    #[arg(long)]
    pub zone: Option<String>,
    /// Platform to show ("All" for every platform, "=All" for one named All)
    #[arg(long)]
    pub platform: Option<String>,
    /// First order date, inclusive
    #[arg(long, value_parser = parse_cli_date)]
    pub from: Option<NaiveDate>,
    /// Last order date, inclusive
    #[arg(long, value_parser = parse_cli_date)]
    pub to: Option<NaiveDate>,
}

fn parse_cli_date(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).ok_or_else(|| format!("'{raw}' is not a date (expected YYYY-MM-DD)"))
}

impl FilterArgs {
    /// Overlay the given flags on a selection. A flag for a field missing
    /// from `fields` is an error, since the window has no widget to undo it.
    pub fn apply(&self, fields: &[FilterField], selection: &mut FilterSelection) -> Result<()> {
        let given = [
            (FilterField::Category, "--category", &self.category),
            (FilterField::Zone, "--zone", &self.zone),
            (FilterField::Platform, "--platform", &self.platform),
        ];
        for (field, flag, value) in given {
            let Some(v) = value else {
                continue;
            };
            if !fields.contains(&field) {
                bail!("{flag} given but '{field}' is not one of the configured filters");
            }
            selection.set(field, Selection::parse(v));
        }
        if let Some(from) = self.from {
            selection.date_range.start = from;
        }
        if let Some(to) = self.to {
            selection.date_range.end = to;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::DateRange;
    use crate::data::model::tests::{date, three_rows};

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "sales-dashboard",
            "--data",
            "x.csv",
            "--report",
            "--zone",
            "North",
            "--from",
            "2024-01-02",
        ])
        .unwrap();
        assert_eq!(args.data, Some(PathBuf::from("x.csv")));
        assert!(args.report);
        assert_eq!(args.filters.zone.as_deref(), Some("North"));
        assert_eq!(args.filters.from, Some(date(2024, 1, 2)));
        assert_eq!(args.filters.to, None);
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(Args::try_parse_from(["sales-dashboard", "--to", "soon"]).is_err());
    }

    #[test]
    fn apply_overlays_only_given_flags() {
        let ds = three_rows();
        let mut sel = FilterSelection::full(&ds, &FilterField::ALL);
        let flags = FilterArgs {
            platform: Some("Web".into()),
            category: Some("All".into()),
            to: Some(date(2024, 1, 2)),
            ..FilterArgs::default()
        };
        flags.apply(&FilterField::ALL, &mut sel).unwrap();
        assert_eq!(sel.choice(FilterField::Platform), &Selection::Only("Web".into()));
        assert_eq!(sel.choice(FilterField::Category), &Selection::All);
        assert_eq!(sel.date_range, DateRange::new(date(2024, 1, 1), date(2024, 1, 2)));
    }

    #[test]
    fn flag_for_unconfigured_field_is_rejected() {
        let ds = three_rows();
        let fields = [FilterField::Category, FilterField::Platform];
        let mut sel = FilterSelection::full(&ds, &fields);
        let flags = FilterArgs {
            zone: Some("North".into()),
            ..FilterArgs::default()
        };
        let err = flags.apply(&fields, &mut sel).unwrap_err();
        assert!(err.to_string().contains("--zone"));
        assert!(!sel.choices.contains_key(&FilterField::Zone));
    }

    #[test]
    fn exact_prefix_reaches_a_value_named_all() {
        let args = Args::try_parse_from(["sales-dashboard", "--category", "=All"]).unwrap();
        let ds = three_rows();
        let mut sel = FilterSelection::full(&ds, &FilterField::ALL);
        args.filters.apply(&FilterField::ALL, &mut sel).unwrap();
        assert_eq!(sel.choice(FilterField::Category), &Selection::Only("All".into()));
    }
}
