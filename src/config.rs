//! Run configuration: where outputs go and how the analysis is parameterized
//!
//! Values come from an optional TOML file (`churnforge.toml` by default) and
//! are then overridden by explicit command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "churnforge.toml";

/// File name of the exported cleaned table
pub const PROCESSED_DATA_FILE: &str = "telecom_churn_processed.csv";

/// File name of the exported text summary
pub const SUMMARY_FILE: &str = "analysis_summary.txt";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub charts: ChartConfig,
}

/// Output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where the cleaned data and the summary are written
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    /// Where charts are written; `<directory>/images` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images_directory: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            images_directory: None,
        }
    }
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("churn_report")
}

/// Analysis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Bins used for the monthly-charges churn curve
    #[serde(default = "default_monthly_charge_bins")]
    pub monthly_charge_bins: usize,

    /// Bins used for the charge histograms
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// Customers below this tenure count as early-tenure in the findings
    #[serde(default = "default_early_tenure_months")]
    pub early_tenure_months: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            monthly_charge_bins: default_monthly_charge_bins(),
            histogram_bins: default_histogram_bins(),
            early_tenure_months: default_early_tenure_months(),
        }
    }
}

fn default_monthly_charge_bins() -> usize {
    10
}

fn default_histogram_bins() -> usize {
    30
}

fn default_early_tenure_months() -> u32 {
    12
}

/// Chart rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Skip chart rendering entirely
    #[serde(default)]
    pub disabled: bool,

    /// Width in pixels of a single chart panel
    #[serde(default = "default_panel_width")]
    pub panel_width: u32,

    /// Height in pixels of a single chart panel
    #[serde(default = "default_panel_height")]
    pub panel_height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            panel_width: default_panel_width(),
            panel_height: default_panel_height(),
        }
    }
}

fn default_panel_width() -> u32 {
    600
}

fn default_panel_height() -> u32 {
    450
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` if given, else from `churnforge.toml` if present, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            info!("Loading config from: {}", path.display());
            return Self::load(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            info!("Loading config from: {}", default_path.display());
            Self::load(default_path)
        } else {
            debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Merge command-line arguments; explicit flags take precedence.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref directory) = args.output_dir {
            self.output.directory = directory.clone();
        }
        if let Some(ref images) = args.images_dir {
            self.output.images_directory = Some(images.clone());
        }
        if let Some(bins) = args.bins {
            self.analysis.monthly_charge_bins = bins;
        }
        if args.no_charts {
            self.charts.disabled = true;
        }
    }

    pub fn output_directory(&self) -> &Path {
        &self.output.directory
    }

    pub fn images_directory(&self) -> PathBuf {
        self.output
            .images_directory
            .clone()
            .unwrap_or_else(|| self.output.directory.join("images"))
    }

    pub fn processed_data_path(&self) -> PathBuf {
        self.output.directory.join(PROCESSED_DATA_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output.directory.join(SUMMARY_FILE)
    }

    /// Reject parameter values the analysis cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.analysis.monthly_charge_bins == 0 {
            anyhow::bail!("monthly_charge_bins must be positive");
        }
        if self.analysis.histogram_bins == 0 {
            anyhow::bail!("histogram_bins must be positive");
        }
        if self.charts.panel_width == 0 || self.charts.panel_height == 0 {
            anyhow::bail!("Chart panel dimensions must be positive");
        }
        Ok(())
    }

    /// Create the output and image directories if missing.
    pub fn prepare_directories(&self) -> Result<()> {
        let images = self.images_directory();
        for dir in [self.output.directory.as_path(), images.as_path()] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to serialize default config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output.directory, PathBuf::from("churn_report"));
        assert_eq!(
            config.images_directory(),
            PathBuf::from("churn_report").join("images")
        );
        assert_eq!(config.analysis.monthly_charge_bins, 10);
        assert_eq!(config.analysis.histogram_bins, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[output]
directory = "out"
images_directory = "charts"

[analysis]
monthly_charge_bins = 5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.output_directory(), Path::new("out"));
        assert_eq!(config.images_directory(), PathBuf::from("charts"));
        assert_eq!(config.analysis.monthly_charge_bins, 5);
        assert_eq!(config.analysis.histogram_bins, 30);
        assert!(!config.charts.disabled);
        assert_eq!(config.processed_data_path(), Path::new("out").join(PROCESSED_DATA_FILE));
    }

    #[test]
    fn test_validate_rejects_zero_bins() {
        let mut config = Config::default();
        config.analysis.monthly_charge_bins = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_round_trips() {
        let toml_str = Config::default_toml().unwrap();
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("[analysis]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_prepare_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.output.directory = dir.path().join("report");

        config.prepare_directories().unwrap();
        assert!(dir.path().join("report").join("images").is_dir());
    }
}
