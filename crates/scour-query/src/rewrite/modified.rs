//! Relative modification times.

use scour_analysis::{Field, FieldName};

use super::QueryRewriter;
use crate::ast::Query;

/// Milliseconds in one hour.
const HOUR_MILLIS: i64 = 60 * 60 * 1000;

/// Milliseconds in one day.
const DAY_MILLIS: i64 = 24 * HOUR_MILLIS;

/// Parses a relative time expression into a span in milliseconds.
///
/// Accepts `hour`, `today`, `day`, `yesterday`, `week`, `month`, `year`, and
/// counted forms such as `3d` or `12h` (units `h`, `d`, `w`, `m`, `y`).
pub fn parse_time_span(expr: &str) -> Option<i64> {
    let expr = expr.trim().to_lowercase();
    let named = match expr.as_str() {
        "hour" => Some(HOUR_MILLIS),
        "today" | "day" => Some(DAY_MILLIS),
        "yesterday" => Some(2 * DAY_MILLIS),
        "week" => Some(7 * DAY_MILLIS),
        "month" => Some(30 * DAY_MILLIS),
        "year" => Some(365 * DAY_MILLIS),
        _ => None,
    };
    if named.is_some() {
        return named;
    }

    let unit = expr.chars().last()?;
    let count: i64 = expr[..expr.len() - unit.len_utf8()].parse().ok()?;
    let unit_millis = match unit {
        'h' => HOUR_MILLIS,
        'd' => DAY_MILLIS,
        'w' => 7 * DAY_MILLIS,
        'm' => 30 * DAY_MILLIS,
        'y' => 365 * DAY_MILLIS,
        _ => return None,
    };
    count.checked_mul(unit_millis)
}

/// Turns `modified:<time expression>` into "modified since now minus span".
///
/// Values that are not time expressions are kept as exact timestamps.
#[derive(Debug, Clone, Copy)]
pub struct ModifiedSince {
    /// Reference time in epoch milliseconds.
    now_millis: i64,
}

impl ModifiedSince {
    /// Creates the pass relative to `now_millis`.
    pub fn new(now_millis: i64) -> Self {
        Self { now_millis }
    }
}

impl QueryRewriter for ModifiedSince {
    fn term(&mut self, field: &FieldName, text: &str) -> Query {
        if field.field() != Some(Field::Modified) {
            return Query::term(field.clone(), text);
        }
        match parse_time_span(text) {
            Some(span) => Query::Range {
                field: Field::Modified,
                lower: Some(self.now_millis.saturating_sub(span)),
                upper: None,
            },
            None => Query::term(field.clone(), text),
        }
    }
}
