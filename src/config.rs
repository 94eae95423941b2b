use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";

/// Data file loaded when neither the config nor the command line names one.
pub const DEFAULT_DATA_PATH: &str = "data/base.csv";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("config lists no filter fields")]
    NoFilters,
}

// ---------------------------------------------------------------------------
// Filter fields and aggregation targets
// ---------------------------------------------------------------------------

/// A categorical column the user can narrow the dataset by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Category,
    Zone,
    Platform,
}

impl FilterField {
    pub const ALL: [FilterField; 3] = [FilterField::Category, FilterField::Zone, FilterField::Platform];

    /// Label shown next to the filter widget.
    pub fn label(self) -> &'static str {
        match self {
            FilterField::Category => "Category",
            FilterField::Zone => "Customer Zone",
            FilterField::Platform => "Platform",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A grouped table the pipeline produces for charting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Revenue summed per category (bar chart).
    CategoryTotals,
    /// Revenue summed per order date, chronological (line chart).
    DailyTotals,
    /// Per-row revenue values per customer zone (box plot).
    ZoneDistribution,
    /// Revenue summed per platform (pie chart).
    PlatformTotals,
}

impl Aggregation {
    pub const ALL: [Aggregation; 4] = [
        Aggregation::CategoryTotals,
        Aggregation::DailyTotals,
        Aggregation::ZoneDistribution,
        Aggregation::PlatformTotals,
    ];
}

/// Which rows the DRR and AOV denominators are counted over.
///
/// `FullDataset` counts distinct order dates / order numbers over the whole
/// file regardless of filters; `Filtered` counts them over the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenominatorScope {
    #[default]
    FullDataset,
    Filtered,
}

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Header names of the required input columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub category: String,
    pub zone: String,
    pub platform: String,
    pub order_date: String,
    pub order_no: String,
    pub revenue: String,
    pub qty: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            category: "category".into(),
            zone: "cust-zone".into(),
            platform: "platform".into(),
            order_date: "order-date".into(),
            order_no: "order-no".into(),
            revenue: "revenue".into(),
            qty: "qty".into(),
        }
    }
}

impl ColumnNames {
    /// Required columns in record order.
    pub fn required(&self) -> [&str; 7] {
        [
            &self.category,
            &self.zone,
            &self.platform,
            &self.order_date,
            &self.order_no,
            &self.revenue,
            &self.qty,
        ]
    }
}

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// The single data file read at startup.
    pub data_path: PathBuf,
    pub columns: ColumnNames,
    /// Filter widgets shown, in order.
    pub filters: Vec<FilterField>,
    /// Grouped tables computed, in chart order.
    pub aggregations: Vec<Aggregation>,
    pub denominator_scope: DenominatorScope,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            columns: ColumnNames::default(),
            filters: FilterField::ALL.to_vec(),
            aggregations: Aggregation::ALL.to_vec(),
            denominator_scope: DenominatorScope::default(),
        }
    }
}

impl DashboardConfig {
    /// Load a JSON config. Missing keys fall back to their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: DashboardConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if config.filters.is_empty() {
            return Err(ConfigError::NoFilters);
        }
        Ok(config)
    }

    /// Resolve the config: an explicit path must load, otherwise
    /// `dashboard.json` is used if present, else the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    log::info!("Using config {}", fallback.display());
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
