//! Serial number suggestions for finished repairs.
//!
//! Serials read `SBS{YY}ET{NNNN}`. The sequence part keeps growing across
//! years; only the year prefix follows the calendar.

use std::sync::OnceLock;

use regex::Regex;
use time::Date;

use super::Reception;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^SBS(\d{2})ET(\d+)$").expect("valid serial pattern")
    })
}

/// Sequence number of a well-formed serial.
pub fn sequence_of(serial: &str) -> Option<u64> {
    pattern().captures(serial)?.get(2)?.as_str().parse().ok()
}

pub fn format(year: i32, sequence: u64) -> String {
    format!("SBS{:02}ET{:04}", year.rem_euclid(100), sequence)
}

/// Next serial after the highest sequence among plain-string serials,
/// prefixed with the year of `today`.
///
/// This is a suggestion: nothing stops an operator from finishing a repair
/// with another value, including one already in use.
pub fn suggest<'a>(
    receptions: impl IntoIterator<Item = &'a Reception>,
    today: Date,
) -> String {
    let next = receptions
        .into_iter()
        .filter_map(Reception::plain_serial_number)
        .filter_map(sequence_of)
        .max()
        .map_or(1, |n| n.saturating_add(1));
    format(today.year(), next)
}
