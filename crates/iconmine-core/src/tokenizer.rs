//! Splits one fixed-width table line into cell tokens.
//!
//! Whitespace runs and hyphens both separate cells. Formatting artifacts of
//! the timer report (empty cells, `#` placeholders, `(s)` unit markers) are
//! dropped by a small ordered set of named rules. Duration suffixes are left
//! untouched; interpreting `2.0s` or `15m16s` is the row mapper's job.

use tracing::trace;

/// Marker that whitespace runs collapse into before splitting.
pub const SEPARATOR: char = '-';

/// A named predicate over a raw token; matching tokens are discarded.
struct DropRule {
    name: &'static str,
    matches: fn(&str) -> bool,
}

const DROP_RULES: [DropRule; 3] = [
    DropRule {
        name: "empty",
        matches: is_empty,
    },
    DropRule {
        name: "placeholder",
        matches: is_placeholder,
    },
    DropRule {
        name: "unit-marker",
        matches: is_unit_marker,
    },
];

fn is_empty(token: &str) -> bool {
    token.trim().is_empty()
}

fn is_placeholder(token: &str) -> bool {
    token == "#"
}

/// `(s)`, `(ms)`, `[s]` and the like: a bracketed, purely alphabetic unit.
fn is_unit_marker(token: &str) -> bool {
    let inner = token
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .or_else(|| token.strip_prefix('[').and_then(|t| t.strip_suffix(']')));
    match inner {
        Some(unit) => !unit.is_empty() && unit.chars().all(|c| c.is_ascii_alphabetic()),
        None => false,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer {
    leading_marker: Option<char>,
}

impl Tokenizer {
    pub fn new(leading_marker: Option<char>) -> Self {
        Self { leading_marker }
    }

    /// Tokenize one line. Never fails; a line without data yields no tokens.
    pub fn tokenize(&self, line: &str) -> Vec<String> {
        let sep = SEPARATOR.to_string();
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(sep.as_str());

        let body = match self.leading_marker {
            Some(marker) if collapsed.starts_with(marker) => {
                collapsed.trim_start_matches(|c: char| c == marker || c == SEPARATOR)
            }
            _ => collapsed.as_str(),
        };

        body.split(SEPARATOR)
            .filter(|token| match DROP_RULES.iter().find(|rule| (rule.matches)(*token)) {
                Some(rule) => {
                    trace!(token = %token, rule = rule.name, "Dropped token");
                    false
                }
                None => true,
            })
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("some test content", &["some", "test", "content"])]
    #[case("some-test-content", &["some", "test", "content"])]
    #[case("some/test/content", &["some/test/content"])]
    #[case("Lsome test content", &["some", "test", "content"])]
    #[case("L  total   1", &["total", "1"])]
    #[case("some tests content", &["some", "tests", "content"])]
    #[case("some 1m37s contents", &["some", "1m37s", "contents"])]
    #[case("total # 2.0s (s) [ms] [0]", &["total", "2.0s", "[0]"])]
    #[case("  \t  ", &[])]
    #[case("", &[])]
    fn test_tokenize(#[case] line: &str, #[case] expected: &[&str]) {
        let tokenizer = Tokenizer::new(Some('L'));
        assert_eq!(tokenizer.tokenize(line), expected);
    }

    #[test]
    fn test_whitespace_run_length_is_irrelevant() {
        let tokenizer = Tokenizer::new(Some('L'));
        assert_eq!(tokenizer.tokenize("a   b"), tokenizer.tokenize("a b"));
        assert_eq!(
            tokenizer.tokenize("  nh_solve \t  130   0.143s "),
            tokenizer.tokenize("nh_solve 130 0.143s"),
        );
    }

    #[test]
    fn test_without_leading_marker() {
        let tokenizer = Tokenizer::new(None);
        assert_eq!(tokenizer.tokenize("Lsome content"), ["Lsome", "content"]);
    }
}
