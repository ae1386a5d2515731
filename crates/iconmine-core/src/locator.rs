//! Locates timer tables inside a full log text.
//!
//! A table starts at a header line (matching the configured pattern and wide
//! enough to be a timer header) and ends at the nearest following rule line
//! that no earlier header has claimed.

use std::collections::BTreeSet;

use tracing::{debug, error};

use crate::config::Patterns;
use crate::models::Table;
use crate::tokenizer::Tokenizer;

pub struct TableLocator<'a> {
    patterns: &'a Patterns,
    tokenizer: Tokenizer,
}

impl<'a> TableLocator<'a> {
    pub fn new(patterns: &'a Patterns) -> Self {
        Self {
            patterns,
            tokenizer: Tokenizer::new(patterns.leading_marker),
        }
    }

    /// Slice every table body out of `text`, in header order.
    ///
    /// Returns `None` when the text has no qualifying header or no footer.
    pub fn locate_tables(&self, text: &str) -> Option<Vec<Table>> {
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();

        let headers: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| self.patterns.header.is_match(line))
            .filter(|(i, line)| {
                let width = self.tokenizer.tokenize(line).len();
                let wide_enough = width >= self.patterns.min_header_columns;
                if !wide_enough {
                    debug!(line = i, width, "Ignoring narrow header");
                }
                wide_enough
            })
            .map(|(i, _)| i)
            .collect();

        let mut footers: BTreeSet<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| self.patterns.rule.is_match(line))
            .map(|(i, _)| i)
            .collect();

        if headers.is_empty() || footers.is_empty() {
            error!(
                headers = headers.len(),
                footers = footers.len(),
                "No headers or footers found in the log"
            );
            return None;
        }

        let mut tables = Vec::with_capacity(headers.len());
        for header in headers {
            let Some(footer) = footers.range(header + 1..).next().copied() else {
                debug!(line = header, "Header without footer, table truncated");
                continue;
            };
            footers.remove(&footer);

            let start = header + self.patterns.header_lines;
            let body = if start < footer {
                &lines[start..footer]
            } else {
                &lines[0..0]
            };
            tables.push(Table::new(body));
        }

        Some(tables)
    }
}
