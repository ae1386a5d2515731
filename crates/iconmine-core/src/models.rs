//! Data models for iconmine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Column order of an ICON timer table row. The trailing `pe` column is
/// optional in the source reports.
pub const COLUMNS: [&str; 13] = [
    "name",
    "calls",
    "t_min",
    "min_rank",
    "t_avg",
    "t_max",
    "max_rank",
    "total_min",
    "total_min_rank",
    "total_max",
    "total_max_rank",
    "total_avg",
    "pe",
];

/// Number of columns every accepted row must carry.
pub const REQUIRED_COLUMNS: usize = COLUMNS.len() - 1;

/// Whether a token row has one of the widths the record schema accepts.
pub fn is_accepted_width(width: usize) -> bool {
    width == REQUIRED_COLUMNS || width == COLUMNS.len()
}

/// A single table cell after coercion: integer zero, float, or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}
impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Int(v)
    }
}
impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}
impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One mapped timer row. Every field holds at most one value; fields the row
/// did not reach stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub name: Option<CellValue>,
    pub calls: Option<CellValue>,
    pub t_min: Option<CellValue>,
    pub min_rank: Option<CellValue>,
    pub t_avg: Option<CellValue>,
    pub t_max: Option<CellValue>,
    pub max_rank: Option<CellValue>,
    pub total_min: Option<CellValue>,
    pub total_min_rank: Option<CellValue>,
    pub total_max: Option<CellValue>,
    pub total_max_rank: Option<CellValue>,
    pub total_avg: Option<CellValue>,
    pub pe: Option<CellValue>,
}

impl TimingRecord {
    /// Slot for the column at `index` in [`COLUMNS`] order.
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Option<CellValue>> {
        let slot = match index {
            0 => &mut self.name,
            1 => &mut self.calls,
            2 => &mut self.t_min,
            3 => &mut self.min_rank,
            4 => &mut self.t_avg,
            5 => &mut self.t_max,
            6 => &mut self.max_rank,
            7 => &mut self.total_min,
            8 => &mut self.total_min_rank,
            9 => &mut self.total_max,
            10 => &mut self.total_max_rank,
            11 => &mut self.total_avg,
            12 => &mut self.pe,
            _ => return None,
        };
        Some(slot)
    }

    /// Values in [`COLUMNS`] order.
    pub fn values(&self) -> [Option<&CellValue>; 13] {
        [
            self.name.as_ref(),
            self.calls.as_ref(),
            self.t_min.as_ref(),
            self.min_rank.as_ref(),
            self.t_avg.as_ref(),
            self.t_max.as_ref(),
            self.max_rank.as_ref(),
            self.total_min.as_ref(),
            self.total_min_rank.as_ref(),
            self.total_max.as_ref(),
            self.total_max_rank.as_ref(),
            self.total_avg.as_ref(),
            self.pe.as_ref(),
        ]
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        let index = COLUMNS.iter().position(|c| *c == column)?;
        self.values()[index]
    }

    /// Number of populated fields.
    pub fn populated(&self) -> usize {
        self.values().iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.populated() == 0
    }
}

/// A record enriched with the run timestamp and experiment name, as handed to
/// the document store. Serializes to a flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingDocument {
    #[serde(flatten)]
    pub record: TimingRecord,
    pub time_stamp: NaiveDateTime,
    pub experiment: String,
}

/// Lines of one detected timer table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableBody {
    /// Trimmed raw lines between the header block and the footer.
    Raw(Vec<String>),
    /// Token rows that passed the width filter.
    Tokenized(Vec<Vec<String>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub body: TableBody,
}

impl Table {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            body: TableBody::Raw(
                lines
                    .into_iter()
                    .map(|l| l.as_ref().trim().to_string())
                    .collect(),
            ),
        }
    }

    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            body: TableBody::Tokenized(rows),
        }
    }

    pub fn is_normalized(&self) -> bool {
        matches!(self.body, TableBody::Tokenized(_))
    }

    /// Raw lines; empty once the table has been normalized.
    pub fn lines(&self) -> &[String] {
        match &self.body {
            TableBody::Raw(lines) => lines,
            TableBody::Tokenized(_) => &[],
        }
    }

    /// Token rows; empty until the table has been normalized.
    pub fn rows(&self) -> &[Vec<String>] {
        match &self.body {
            TableBody::Raw(_) => &[],
            TableBody::Tokenized(rows) => rows,
        }
    }

    pub fn len(&self) -> usize {
        match &self.body {
            TableBody::Raw(lines) => lines.len(),
            TableBody::Tokenized(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.body {
            TableBody::Raw(lines) => write!(f, "{}", lines.join("\n")),
            TableBody::Tokenized(rows) => {
                let joined: Vec<String> = rows.iter().map(|r| r.join(" ")).collect();
                write!(f, "{}", joined.join("\n"))
            }
        }
    }
}
