//! Run metadata embedded in the log text: timestamps and experiment name.

use chrono::{Local, NaiveDateTime};
use tracing::{debug, warn};

use crate::config::Patterns;

pub struct TimestampExtractor<'a> {
    patterns: &'a Patterns,
}

impl<'a> TimestampExtractor<'a> {
    pub fn new(patterns: &'a Patterns) -> Self {
        Self { patterns }
    }

    /// Every parseable date in `text`, in order of appearance. Falls back to
    /// the current local time when the text holds none.
    pub fn extract_timestamps(&self, text: &str) -> Vec<NaiveDateTime> {
        let mut dates = vec![];
        for caps in self.patterns.date.captures_iter(text) {
            let Some(m) = caps.get(1).or_else(|| caps.get(0)) else {
                continue;
            };
            match NaiveDateTime::parse_from_str(m.as_str(), &self.patterns.date_format) {
                Ok(date) => dates.push(date),
                Err(e) => warn!(date = m.as_str(), error = %e, "Skipping unparseable date"),
            }
        }
        if dates.is_empty() {
            debug!("No date found in file, replacing with current time");
            dates.push(Local::now().naive_local());
        }
        dates
    }

    /// The latest date in `text`: the run's timestamp.
    pub fn latest_timestamp(&self, text: &str) -> NaiveDateTime {
        self.extract_timestamps(text)
            .into_iter()
            .max()
            .unwrap_or_else(|| Local::now().naive_local())
    }
}

pub struct MetadataExtractor<'a> {
    patterns: &'a Patterns,
}

impl<'a> MetadataExtractor<'a> {
    pub fn new(patterns: &'a Patterns) -> Self {
        Self { patterns }
    }

    /// Trimmed value of the experiment key, or an empty string.
    pub fn extract_experiment_name(&self, text: &str) -> String {
        self.patterns
            .experiment
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    }
}
