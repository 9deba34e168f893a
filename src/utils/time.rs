use chrono::{DateTime, Local};

/// Wall-clock time of day for status lines, e.g. `14:03:07`.
pub fn format_clock(time: DateTime<Local>) -> String {
    time.format("%H:%M:%S").to_string()
}

/// Compact age label for "last updated" columns.
pub fn format_age(seconds: i64) -> String {
    match seconds {
        s if s < 60 => format!("{s}s ago"),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s => format!("{}h ago", s / 3_600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_ages_by_magnitude() {
        assert_eq!(format_age(0), "0s ago");
        assert_eq!(format_age(59), "59s ago");
        assert_eq!(format_age(125), "2m ago");
        assert_eq!(format_age(7_300), "2h ago");
    }
}
