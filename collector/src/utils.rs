/// Parse ISO8601 duration string (P1DT1H2M3S) to total seconds.
///
/// Weeks and days are accepted in the date part; years and months are
/// rejected because their length is not fixed. Fractional seconds are
/// truncated.
pub fn parse_iso8601_duration_to_seconds(duration_str: &str) -> Option<u64> {
    let rest = duration_str.strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }

    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) if !time.is_empty() => (date, Some(time)),
        Some(_) => return None,
        None => (rest, None),
    };

    let mut total_seconds = 0.0;
    total_seconds += sum_components(date_part, |unit| match unit {
        'W' => Some(7.0 * 86_400.0),
        'D' => Some(86_400.0),
        _ => None,
    })?;
    if let Some(time_part) = time_part {
        total_seconds += sum_components(time_part, |unit| match unit {
            'H' => Some(3600.0), // Hours
            'M' => Some(60.0),   // Minutes
            'S' => Some(1.0),    // Seconds
            _ => None,
        })?;
    }

    Some(total_seconds as u64)
}

fn sum_components(part: &str, unit_seconds: impl Fn(char) -> Option<f64>) -> Option<f64> {
    let mut total = 0.0;
    let mut current_number = String::new();

    for ch in part.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            current_number.push(ch);
        } else {
            let num = current_number.parse::<f64>().ok()?;
            total += num * unit_seconds(ch)?;
            current_number.clear();
        }
    }

    // trailing digits without a unit designator
    if !current_number.is_empty() {
        return None;
    }
    Some(total)
}

/// Render seconds as `H:MM:SS`, prefixed with `N day(s), ` past 24 hours.
pub fn format_elapsed(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let clock = format!("{hours}:{minutes:02}:{seconds:02}");
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}

/// Duration column value for a raw `contentDetails.duration`.
///
/// Unparseable input is passed through unchanged so the row is still written.
pub fn display_duration(raw: &str) -> String {
    match parse_iso8601_duration_to_seconds(raw) {
        Some(seconds) => format_elapsed(seconds),
        None => raw.to_string(),
    }
}

/// Parse a statistics counter; the API sends them as strings and omits hidden ones.
pub fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

/// Reduce a search term to characters that are safe in a file name.
pub fn file_safe_term(term: &str) -> String {
    let cleaned: String = term
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "search".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hours_minutes_seconds() {
        assert_eq!(parse_iso8601_duration_to_seconds("PT1H2M3S"), Some(3723));
        assert_eq!(parse_iso8601_duration_to_seconds("PT45S"), Some(45));
        assert_eq!(parse_iso8601_duration_to_seconds("PT10M"), Some(600));
    }

    #[test]
    fn parses_day_and_week_designators() {
        assert_eq!(parse_iso8601_duration_to_seconds("P1DT2H"), Some(93_600));
        assert_eq!(parse_iso8601_duration_to_seconds("P1W"), Some(604_800));
        // live streams report a zero duration
        assert_eq!(parse_iso8601_duration_to_seconds("P0D"), Some(0));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert_eq!(parse_iso8601_duration_to_seconds(""), None);
        assert_eq!(parse_iso8601_duration_to_seconds("P"), None);
        assert_eq!(parse_iso8601_duration_to_seconds("PT"), None);
        assert_eq!(parse_iso8601_duration_to_seconds("1H2M"), None);
        assert_eq!(parse_iso8601_duration_to_seconds("PT5"), None);
        assert_eq!(parse_iso8601_duration_to_seconds("P1M"), None);
    }

    #[test]
    fn formats_like_elapsed_time() {
        assert_eq!(format_elapsed(3723), "1:02:03");
        assert_eq!(format_elapsed(45), "0:00:45");
        assert_eq!(format_elapsed(0), "0:00:00");
        assert_eq!(format_elapsed(93_600), "1 day, 2:00:00");
        assert_eq!(format_elapsed(2 * 86_400 + 61), "2 days, 0:01:01");
    }

    #[test]
    fn display_duration_passes_through_unknown_input() {
        assert_eq!(display_duration("PT1H2M3S"), "1:02:03");
        assert_eq!(display_duration("P1Y"), "P1Y");
        assert_eq!(display_duration(""), "");
    }

    #[test]
    fn counts_default_to_zero() {
        assert_eq!(parse_count(Some("1000")), 1000);
        assert_eq!(parse_count(Some("not a number")), 0);
        assert_eq!(parse_count(None), 0);
    }

    #[test]
    fn file_safe_term_replaces_separators() {
        assert_eq!(file_safe_term("lo-fi hip/hop"), "lo-fi_hip_hop");
        assert_eq!(file_safe_term("  jazz  "), "jazz");
        assert_eq!(file_safe_term("   "), "search");
    }
}
