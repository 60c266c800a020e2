//! Client-side sorting and filtering.
//!
//! Used when the backend does not accept sort or search parameters. Both
//! operate on the rows of the fetched page only.

use std::cmp::Ordering;

use serde_json::Value;

use crate::model::Row;
use crate::model::SortDirection;
use crate::model::SortKey;
use crate::model::display_value;

/// Sorts rows in place by a column.
///
/// Missing and null cells come first in ascending order and last in
/// descending order. The sort is stable.
pub fn sort_rows(rows: &mut [Row], key: &SortKey) {
    rows.sort_by(|a, b| {
        let ordering = compare_values(a.get(&key.column), b.get(&key.column));
        match key.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Keeps rows where any cell contains `term`, ignoring case.
pub fn filter_rows(rows: &mut Vec<Row>, term: &str) {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return;
    }
    rows.retain(|row| {
        row.cells()
            .any(|(_, value)| display_value(value).to_lowercase().contains(&needle))
    });
}

/// Ascending comparison of two cells.
///
/// Numbers compare numerically; everything else compares as text, ignoring
/// case, with digit runs compared by value (`item2 < item10`).
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(x), Some(y)) => natural_cmp(&display_value(x), &display_value(y)),
    }
}

/// Case-insensitive natural string comparison.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let ordering = compare_digit_runs(&l_run, &r_run);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
