use crate::utils::error::{EtlError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional run configuration file. Every field may be left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub include_json: Option<bool>,
    pub output: Option<OutputConfig>,
    pub limits: Option<LimitsConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub file_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_samples_per_record: Option<usize>,
    pub max_units_per_sample: Option<usize>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn output_path(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.path.as_deref())
    }

    pub fn file_prefix(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.file_prefix.as_deref())
    }

    pub fn max_samples_per_record(&self) -> Option<usize> {
        self.limits.as_ref().and_then(|l| l.max_samples_per_record)
    }

    pub fn max_units_per_sample(&self) -> Option<usize> {
        self.limits.as_ref().and_then(|l| l.max_units_per_sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
include_json = true

[output]
path = "./reports"
file_prefix = "pilot"

[limits]
max_samples_per_record = 200
max_units_per_sample = 10
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.include_json, Some(true));
        assert_eq!(config.output_path(), Some("./reports"));
        assert_eq!(config.file_prefix(), Some("pilot"));
        assert_eq!(config.max_samples_per_record(), Some(200));
        assert_eq!(config.max_units_per_sample(), Some(10));
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.output_path(), None);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("QC_TEST_REPORT_DIR", "/tmp/qc-reports");

        let toml_content = r#"
[output]
path = "${QC_TEST_REPORT_DIR}"
file_prefix = "${QC_TEST_UNSET_PREFIX}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.output_path(), Some("/tmp/qc-reports"));
        assert_eq!(config.file_prefix(), Some("${QC_TEST_UNSET_PREFIX}"));

        std::env::remove_var("QC_TEST_REPORT_DIR");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[output\npath = 1").unwrap_err();
        assert!(matches!(err, EtlError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[output]\nfile_prefix = \"from-file\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.file_prefix(), Some("from-file"));
    }
}
