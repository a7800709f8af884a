use chrono::{DateTime, Datelike, Duration, Utc};

/// This is the standard way of turning an instant into a day bucket key.
/// Always UTC so that the same store produces the same buckets on every
/// machine.
pub fn day_key(moment: DateTime<Utc>) -> String {
    moment.format("%Y-%m-%d").to_string()
}

/// Day key of the Monday starting the ISO week that contains `moment`.
/// A Sunday belongs to the week that started six days earlier.
pub fn iso_week_start_key(moment: DateTime<Utc>) -> String {
    let days_from_monday = moment.weekday().num_days_from_monday() as i64;
    let monday = moment.date_naive() - Duration::days(days_from_monday);
    monday.format("%Y-%m-%d").to_string()
}

/// Month bucket key, "YYYY-MM" with a zero padded month.
pub fn month_key(moment: DateTime<Utc>) -> String {
    moment.format("%Y-%m").to_string()
}
