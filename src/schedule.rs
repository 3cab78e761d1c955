use chrono::{Datelike, Days, NaiveDate};

/// Number of meetings in a term.
pub const TERM_OCCURRENCES: usize = 18;

/// Expands a class's weekly schedule into the term's concrete meeting
/// dates. `weekday` is Sunday-based (0 = Sunday .. 6 = Saturday).
///
/// Occurrence 1 is the first date on or after `activation` falling on
/// `weekday` (the activation date itself when the weekdays already
/// match); each further occurrence is 7 calendar days later. All
/// arithmetic is on UTC calendar days.
pub fn occurrences(activation: NaiveDate, weekday: u8, count: usize) -> Vec<NaiveDate> {
    let offset = (u64::from(weekday) + 7 - u64::from(activation.weekday().num_days_from_sunday()))
        .rem_euclid(7);
    let first = activation + Days::new(offset);
    (0..count)
        .map(|i| first + Days::new(7 * i as u64))
        .collect()
}

/// The full term for a class: 18 occurrences from its activation date.
pub fn term_occurrences(activation: NaiveDate, weekday: u8) -> Vec<NaiveDate> {
    occurrences(activation, weekday, TERM_OCCURRENCES)
}
