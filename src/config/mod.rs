pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, Validate,
};
use serde::{Deserialize, Serialize};
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

pub const DEFAULT_OUTPUT_PATH: &str = ".";
pub const DEFAULT_FILE_PREFIX: &str = "qc-responses-1nP";
pub const DEFAULT_MAX_SAMPLES_PER_RECORD: usize = 125;
pub const DEFAULT_MAX_UNITS_PER_SAMPLE: usize = 20;

/// Effective run settings after defaults, config file and CLI are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub output_path: String,
    pub file_prefix: String,
    /// Reserved for fixed-width sample columns.
    pub max_samples_per_record: usize,
    /// Reserved for fixed-width unit columns.
    pub max_units_per_sample: usize,
    pub include_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            max_samples_per_record: DEFAULT_MAX_SAMPLES_PER_RECORD,
            max_units_per_sample: DEFAULT_MAX_UNITS_PER_SAMPLE,
            include_json: false,
        }
    }
}

impl Settings {
    /// Overlay the values present in a config file.
    pub fn with_file(mut self, file: &TomlConfig) -> Self {
        if let Some(path) = file.output_path() {
            self.output_path = path.to_string();
        }
        if let Some(prefix) = file.file_prefix() {
            self.file_prefix = prefix.to_string();
        }
        if let Some(max) = file.max_samples_per_record() {
            self.max_samples_per_record = max;
        }
        if let Some(max) = file.max_units_per_sample() {
            self.max_units_per_sample = max;
        }
        if let Some(include_json) = file.include_json {
            self.include_json = include_json;
        }
        self
    }
}

impl ConfigProvider for Settings {
    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn file_prefix(&self) -> &str {
        &self.file_prefix
    }

    fn max_samples_per_record(&self) -> usize {
        self.max_samples_per_record
    }

    fn max_units_per_sample(&self) -> usize {
        self.max_units_per_sample
    }

    fn include_json(&self) -> bool {
        self.include_json
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_path("output_path", &self.output_path)?;
        validate_non_empty_string("file_prefix", &self.file_prefix)?;
        validate_positive_number("max_samples_per_record", self.max_samples_per_record, 1)?;
        validate_positive_number("max_units_per_sample", self.max_units_per_sample, 1)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "qc-responses-etl")]
#[command(about = "Flatten study activity responses into one CSV per activity")]
pub struct CliConfig {
    /// JSON export to read; omit or pass `-` to read standard input
    pub input: Option<PathBuf>,

    /// Directory the CSV files are written to
    #[arg(long, env = "OUTPUT_PATH")]
    pub output_path: Option<String>,

    /// File name prefix for every CSV file
    #[arg(long, env = "FILE_PREFIX")]
    pub file_prefix: Option<String>,

    #[arg(long, env = "MAX_SAMPLES_PER_RECORD")]
    pub max_samples_per_record: Option<usize>,

    #[arg(long, env = "MAX_UNITS_PER_SAMPLE")]
    pub max_units_per_sample: Option<usize>,

    /// Append the complete input record as JSON to every row
    /// (`--include-json`, `--include-json=false`)
    #[arg(
        long,
        env = "INCLUDE_JSON",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub include_json: Option<bool>,

    /// Optional TOML config file; flags and environment take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Emit JSON log lines instead of the compact format
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn resolve(&self) -> Result<Settings> {
        let mut settings = Settings::default();
        if let Some(path) = &self.config {
            tracing::info!("Loading configuration from {}", path.display());
            settings = settings.with_file(&TomlConfig::from_file(path)?);
        }
        Ok(self.overlay(settings))
    }

    fn overlay(&self, mut settings: Settings) -> Settings {
        if let Some(path) = &self.output_path {
            settings.output_path = path.clone();
        }
        if let Some(prefix) = &self.file_prefix {
            settings.file_prefix = prefix.clone();
        }
        if let Some(max) = self.max_samples_per_record {
            settings.max_samples_per_record = max;
        }
        if let Some(max) = self.max_units_per_sample {
            settings.max_units_per_sample = max;
        }
        if let Some(include_json) = self.include_json {
            settings.include_json = include_json;
        }
        settings
    }
}
