//! Longest runs of consecutive qualifying days.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A run of consecutive qualifying days; empty when none qualified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Streak {
    pub length: usize,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Longest run of `days` whose value satisfies `qualifies`.
///
/// A single pass: the current run resets at every non-qualifying day while
/// the best run so far is kept. Among equally long runs the first wins.
pub fn longest_streak<F>(days: &[(NaiveDate, f64)], qualifies: F) -> Streak
where
    F: Fn(f64) -> bool,
{
    let mut best = Streak::default();
    let mut current_len = 0;
    let mut current_start = None;

    for &(date, value) in days {
        if !qualifies(value) {
            current_len = 0;
            current_start = None;
            continue;
        }
        if current_len == 0 {
            current_start = Some(date);
        }
        current_len += 1;
        if current_len > best.length {
            best = Streak {
                length: current_len,
                start: current_start,
                end: Some(date),
            };
        }
    }
    best
}
