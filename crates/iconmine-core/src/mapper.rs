//! Maps a normalized token row onto a [`TimingRecord`].
//!
//! Each token is coerced by the first matching rule in [`TOKEN_RULES`]:
//! plain seconds (`2.0s`), minutes and seconds (`15m16s`), or a bare decimal.
//! Tokens no rule accepts stay text. Coerced values lose their sign and an
//! exact zero becomes integer `0`.

use tracing::{debug, trace};

use crate::models::{CellValue, TimingRecord, COLUMNS};

/// A named token coercion: returns the value in seconds (or the bare number)
/// when the token has the rule's shape.
pub struct TokenRule {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<f64>,
}

pub const TOKEN_RULES: [TokenRule; 3] = [
    TokenRule {
        name: "seconds-suffix",
        apply: seconds_suffix,
    },
    TokenRule {
        name: "minutes-seconds",
        apply: minutes_seconds,
    },
    TokenRule {
        name: "decimal",
        apply: decimal,
    },
];

fn decimal(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn seconds_suffix(token: &str) -> Option<f64> {
    token.strip_suffix('s').and_then(decimal)
}

fn minutes_seconds(token: &str) -> Option<f64> {
    let (minutes, seconds) = token.strip_suffix('s')?.split_once('m')?;
    let is_int = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_int(minutes) || !is_int(seconds) {
        return None;
    }
    Some(minutes.parse::<f64>().ok()? * 60.0 + seconds.parse::<f64>().ok()?)
}

/// Coerce one cell. Never fails.
pub fn coerce(token: &str) -> CellValue {
    for rule in &TOKEN_RULES {
        if let Some(value) = (rule.apply)(token) {
            trace!(token = %token, rule = rule.name, value, "Coerced token");
            return normalize_number(value);
        }
    }
    CellValue::Text(token.to_string())
}

/// Drop the sign and represent an exact zero as an integer.
pub fn normalize_number(value: f64) -> CellValue {
    if value == 0.0 {
        CellValue::Int(0)
    } else {
        CellValue::Float(value.abs())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RowMapper;

impl RowMapper {
    pub fn new() -> Self {
        Self
    }

    /// Map tokens positionally onto the record schema. A short row fills
    /// only its leading fields; tokens past the last column are ignored.
    pub fn map_row<S: AsRef<str>>(&self, tokens: &[S]) -> TimingRecord {
        let mut record = TimingRecord::default();
        if tokens.len() > COLUMNS.len() {
            debug!(
                width = tokens.len(),
                "Row wider than the schema, ignoring trailing tokens"
            );
        }
        for (i, token) in tokens.iter().enumerate() {
            match record.slot_mut(i) {
                Some(slot) => *slot = Some(coerce(token.as_ref())),
                None => break,
            }
        }
        record
    }
}
