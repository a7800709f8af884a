/// This is the standard way of showing a minute amount to the user.
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    if minutes >= 60 {
        format!("{}h{}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::format_minutes;

    #[test]
    fn formats_hours_and_minutes() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(60), "1h0m");
        assert_eq!(format_minutes(95), "1h35m");
        assert_eq!(format_minutes(-10), "0m");
    }
}
