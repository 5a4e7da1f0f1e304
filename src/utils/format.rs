//! Human-readable durations

/// Render whole seconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_clock(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, "00:00:00")]
    #[test_case(59, "00:00:59")]
    #[test_case(300, "00:05:00")]
    #[test_case(3661, "01:01:01")]
    #[test_case(90_000, "25:00:00")]
    fn formats_as_clock(secs: u64, expected: &str) {
        assert_eq!(format_clock(secs), expected);
    }
}
