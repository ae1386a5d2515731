//! Turns located tables into token rows of an accepted width.

use tracing::info;

use crate::models::{is_accepted_width, Table, TableBody};
use crate::tokenizer::Tokenizer;

#[derive(Debug, Clone, Copy, Default)]
pub struct TableNormalizer {
    tokenizer: Tokenizer,
}

impl TableNormalizer {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Normalize every table in place and drop tables left without rows.
    pub fn normalize(&self, mut tables: Vec<Table>) -> Vec<Table> {
        for table in tables.iter_mut() {
            self.normalize_table(table);
        }
        let before = tables.len();
        tables.retain(|t| !t.is_empty());
        if tables.len() < before {
            info!(dropped = before - tables.len(), "Removed tables without valid rows");
        }
        tables
    }

    /// Replace the table's lines with the token rows that fit the schema.
    /// Running it again on a normalized table changes nothing.
    pub fn normalize_table(&self, table: &mut Table) {
        let rows = match std::mem::replace(&mut table.body, TableBody::Tokenized(vec![])) {
            TableBody::Raw(lines) => lines
                .iter()
                .map(|line| self.tokenizer.tokenize(line))
                .filter(keep_row)
                .collect(),
            TableBody::Tokenized(rows) => rows.into_iter().filter(keep_row).collect(),
        };
        table.body = TableBody::Tokenized(rows);
    }
}

fn keep_row(row: &Vec<String>) -> bool {
    if is_accepted_width(row.len()) {
        return true;
    }
    info!(
        row = row.first().map(String::as_str).unwrap_or(""),
        width = row.len(),
        "Removed line with unexpected column count"
    );
    false
}
