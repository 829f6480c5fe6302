//! `HH:MM:SS` time labels

/// Format seconds as `HH:MM:SS`
///
/// Fractions are floored. Negative and non-finite input renders as
/// `00:00:00`. Hours do not roll over into days and may exceed two digits.
pub fn format_hms(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total / 60) % 60,
        total % 60
    )
}

/// Parse a `HH:MM:SS` label back to whole seconds
///
/// Returns `None` unless there are exactly three numeric fields with
/// minutes and seconds below 60.
pub fn parse_hms(text: &str) -> Option<u64> {
    let mut fields = text.split(':');
    let hours: u64 = fields.next()?.parse().ok()?;
    let minutes: u64 = fields.next()?.parse().ok()?;
    let seconds: u64 = fields.next()?.parse().ok()?;
    if fields.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_basic() {
        assert_eq!(format_hms(0.0), "00:00:00");
        assert_eq!(format_hms(1.99), "00:00:01");
        assert_eq!(format_hms(120.0), "00:02:00");
        assert_eq!(format_hms(3661.5), "01:01:01");
        assert_eq!(format_hms(359_999.0), "99:59:59");
    }

    #[test]
    fn test_format_no_day_rollover() {
        assert_eq!(format_hms(100.0 * 3600.0), "100:00:00");
    }

    #[test]
    fn test_format_degenerate_input() {
        assert_eq!(format_hms(-5.0), "00:00:00");
        assert_eq!(format_hms(f64::NAN), "00:00:00");
        assert_eq!(format_hms(f64::INFINITY), "00:00:00");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse_hms("00:00"), None);
        assert_eq!(parse_hms("00:60:00"), None);
        assert_eq!(parse_hms("a:00:00"), None);
        assert_eq!(parse_hms("00:00:00:00"), None);
        assert_eq!(parse_hms("01:02:03"), Some(3723));
    }

    proptest! {
        #[test]
        fn format_round_trips_to_floor(s in 0.0f64..360_000.0) {
            prop_assert_eq!(parse_hms(&format_hms(s)), Some(s.floor() as u64));
        }
    }
}
