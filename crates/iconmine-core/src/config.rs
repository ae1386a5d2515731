//! Miner configuration.
//!
//! [`MinerConfig`] is the serializable form (YAML on disk, every field
//! defaulted). [`MinerConfig::compile`] validates it and produces the
//! immutable [`Patterns`] object that every extraction component borrows.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MineError, Result};
use crate::storage;

/// Tunable patterns and thresholds for locating and reading timer tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Regex a table header line must match.
    pub header_pattern: String,
    /// Minimum token count of a header line; shorter headers belong to other reports.
    pub min_header_columns: usize,
    /// Header line plus the sub-header block skipped before the body starts.
    pub header_lines: usize,
    /// Divider character of footer rule lines.
    pub rule_char: char,
    /// Minimum run of `rule_char` that makes a line a footer.
    pub rule_width: usize,
    /// Stray character some log formats prefix table rows with.
    pub leading_marker: Option<char>,
    /// Regex for run dates. Capture group 1, when present, is what gets parsed.
    /// The default keeps the weekday out of the group, so it is never checked
    /// against the date.
    pub date_pattern: String,
    /// chrono format for the captured date text.
    pub date_format: String,
    /// Environment-style key holding the experiment name (`KEY=value`).
    pub experiment_key: String,
    /// First token that ends the relevant part of a table.
    pub stop_sentinel: Option<String>,
    /// File name prefix of the log files to mine.
    pub log_file_prefix: String,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            header_pattern: r"name +.*calls.*".to_string(),
            min_header_columns: 12,
            header_lines: 3,
            rule_char: '-',
            rule_width: 165,
            leading_marker: Some('L'),
            date_pattern: r"\b\w{3} (\d{2} \w{3} \d{4} \d{2}:\d{2}:\d{2} [APM]{2}) \w{4}\b"
                .to_string(),
            date_format: "%d %b %Y %I:%M:%S %p".to_string(),
            experiment_key: "SLURM_JOB_NAME".to_string(),
            stop_sentinel: Some("wrt_output".to_string()),
            log_file_prefix: "LOG.".to_string(),
        }
    }
}

impl MinerConfig {
    /// Load from a YAML file layered over the defaults. A missing file yields
    /// the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        storage::load_yaml(path)
    }

    pub fn with_header_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.header_pattern = pattern.into();
        self
    }

    pub fn with_stop_sentinel(mut self, sentinel: Option<String>) -> Self {
        self.stop_sentinel = sentinel;
        self
    }

    /// Validate thresholds and compile every pattern.
    pub fn compile(&self) -> Result<Patterns> {
        if self.header_lines == 0 {
            return Err(MineError::Other(
                "header_lines must count at least the header line itself".to_string(),
            ));
        }
        if self.rule_width == 0 {
            return Err(MineError::Other("rule_width must be positive".to_string()));
        }
        if self.rule_char.is_whitespace() {
            return Err(MineError::Other(
                "rule_char cannot be whitespace".to_string(),
            ));
        }
        if self.experiment_key.trim().is_empty() {
            return Err(MineError::Other("experiment_key is empty".to_string()));
        }

        let rule = format!(
            "{}{{{}}}",
            regex::escape(&self.rule_char.to_string()),
            self.rule_width
        );
        let experiment = format!(
            r"(?m)^[ \t]*{}=(.*)$",
            regex::escape(self.experiment_key.trim())
        );

        Ok(Patterns {
            header: Regex::new(&self.header_pattern)?,
            rule: Regex::new(&rule)?,
            date: Regex::new(&self.date_pattern)?,
            experiment: Regex::new(&experiment)?,
            date_format: self.date_format.clone(),
            min_header_columns: self.min_header_columns,
            header_lines: self.header_lines,
            leading_marker: self.leading_marker,
            stop_sentinel: self.stop_sentinel.clone(),
            log_file_prefix: self.log_file_prefix.clone(),
        })
    }
}

/// Compiled, immutable form of [`MinerConfig`].
#[derive(Debug, Clone)]
pub struct Patterns {
    pub header: Regex,
    pub rule: Regex,
    pub date: Regex,
    pub experiment: Regex,
    pub date_format: String,
    pub min_header_columns: usize,
    pub header_lines: usize,
    pub leading_marker: Option<char>,
    pub stop_sentinel: Option<String>,
    pub log_file_prefix: String,
}

impl Default for Patterns {
    fn default() -> Self {
        MinerConfig::default()
            .compile()
            .expect("built-in default config must compile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_compile() {
        let patterns = MinerConfig::default().compile().unwrap();
        assert!(patterns.header.is_match("name    # calls   t_min"));
        assert!(patterns.rule.is_match(&"-".repeat(165)));
        assert!(!patterns.rule.is_match(&"-".repeat(164)));
        assert_eq!(patterns.stop_sentinel.as_deref(), Some("wrt_output"));
    }

    #[test]
    fn test_invalid_header_pattern_is_rejected() {
        let err = MinerConfig::default()
            .with_header_pattern("name (")
            .compile()
            .unwrap_err();
        assert!(matches!(err, MineError::Pattern(_)));
    }

    #[test]
    fn test_zero_rule_width_is_rejected() {
        let config = MinerConfig {
            rule_width: 0,
            ..Default::default()
        };
        assert!(matches!(config.compile(), Err(MineError::Other(_))));
    }

    #[test]
    fn test_rule_char_is_escaped() {
        let config = MinerConfig {
            rule_char: '.',
            rule_width: 3,
            ..Default::default()
        };
        let patterns = config.compile().unwrap();
        assert!(patterns.rule.is_match("..."));
        assert!(!patterns.rule.is_match("abc"));
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("iconmine.yaml");
        std::fs::write(&path, "rule_width: 80\nstop_sentinel: null\n").unwrap();
        let config = MinerConfig::load(&path).unwrap();
        assert_eq!(config.rule_width, 80);
        assert_eq!(config.stop_sentinel, None);
        assert_eq!(config.min_header_columns, 12);
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = MinerConfig::load(&tmp.path().join("absent.yaml")).unwrap();
        assert_eq!(config, MinerConfig::default());
    }
}
