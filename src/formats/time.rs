use crate::error::{CaptionError, Result};

pub fn format_srt_timestamp(us: i64) -> String {
    format_timestamp(us, ',')
}

pub fn format_vtt_timestamp(us: i64) -> String {
    format_timestamp(us, '.')
}

fn format_timestamp(us: i64, ms_sep: char) -> String {
    let ms = us.max(0) / 1000;

    let total_seconds = ms / 1000;
    let milli = ms % 1000;

    let sec = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let min = total_minutes % 60;
    let hour = total_minutes / 60;

    format!("{hour:02}:{min:02}:{sec:02}{ms_sep}{milli:03}")
}

pub fn parse_timestamp(s: &str) -> Result<i64> {
    let t = s.trim();
    let bad = |what: &str| CaptionError::Syntax(format!("bad {what} in timestamp: '{t}'"));

    let (hms, frac) = match t.split_once([',', '.']) {
        Some((a, b)) => (a, Some(b)),
        None => (t, None),
    };

    let parts: Vec<&str> = hms.split(':').collect();
    let (h, m, s2) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => ("0", *m, *s),
        _ => {
            return Err(CaptionError::Syntax(format!(
                "unrecognized timestamp: '{t}'"
            )))
        }
    };

    let h: i64 = h.trim().parse().map_err(|_| bad("hours"))?;
    let m: i64 = m.trim().parse().map_err(|_| bad("minutes"))?;
    let s2: i64 = s2.trim().parse().map_err(|_| bad("seconds"))?;

    let mut us = h
        .checked_mul(3600)
        .and_then(|v| v.checked_add(m.checked_mul(60)?))
        .and_then(|v| v.checked_add(s2))
        .and_then(|v| v.checked_mul(1_000_000))
        .ok_or_else(|| bad("range"))?;

    if let Some(frac) = frac {
        let digits: String = frac.trim().chars().take(6).collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(bad("fraction"));
        }
        let scale = 10i64.pow(6 - digits.len() as u32);
        let value: i64 = digits.parse().map_err(|_| bad("fraction"))?;
        us = us.checked_add(value * scale).ok_or_else(|| bad("range"))?;
    }

    Ok(us)
}

pub fn parse_time_range_arrow(line: &str) -> Result<(i64, i64, &str)> {
    let (a, b) = line
        .split_once("-->")
        .ok_or_else(|| CaptionError::Syntax(format!("missing '-->' in time range: '{line}'")))?;
    let b = b.trim_start();
    let (end_str, rest) = b.split_once(char::is_whitespace).unwrap_or((b, ""));
    let start = parse_timestamp(a)?;
    let end = parse_timestamp(end_str)?;
    if end < start {
        return Err(CaptionError::InvalidInput(format!(
            "end before start in time range: '{line}'"
        )));
    }
    Ok((start, end, rest.trim()))
}

/// Timed-text time expressions: clock time (`HH:MM:SS.fff`,
/// `HH:MM:SS:FF` at 30 fps) or an offset with a unit (`h`, `m`, `s`, `ms`,
/// `f`).
pub fn parse_ttml_time(s: &str) -> Result<i64> {
    let t = s.trim();
    let bad = || CaptionError::Syntax(format!("unrecognized time expression: '{t}'"));

    if t.contains(':') {
        let parts: Vec<&str> = t.split(':').collect();
        if parts.len() == 4 {
            let frames: f64 = parts[3].parse().map_err(|_| bad())?;
            let base = parse_timestamp(&parts[..3].join(":"))?;
            return Ok(base.saturating_add((frames * 1_000_000.0 / 30.0).round() as i64));
        }
        return parse_timestamp(t);
    }

    let split = t
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(bad)?;
    let (value, unit) = t.split_at(split);
    let value: f64 = value.parse().map_err(|_| bad())?;
    let factor = match unit {
        "h" => 3_600_000_000.0,
        "m" => 60_000_000.0,
        "s" => 1_000_000.0,
        "ms" => 1_000.0,
        "f" => 1_000_000.0 / 30.0,
        _ => return Err(bad()),
    };
    Ok((value * factor).round() as i64)
}

pub fn format_ttml_time(us: i64) -> String {
    format_vtt_timestamp(us)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_both_separators() {
        assert_eq!(format_srt_timestamp(3_723_456_789), "01:02:03,456");
        assert_eq!(format_vtt_timestamp(1_500_000), "00:00:01.500");
        assert_eq!(format_vtt_timestamp(-5), "00:00:00.000");
    }

    #[test]
    fn huge_hours_are_a_syntax_error() {
        let err = parse_timestamp("9999999999999:00:00,000").unwrap_err();
        assert!(matches!(err, CaptionError::Syntax(_)));
        assert!(parse_time_range_arrow("9999999999999:00:00.000 --> 00:00:01.000").is_err());
    }

    #[test]
    fn parses_srt_and_vtt_forms() {
        assert_eq!(parse_timestamp("00:00:01,500").unwrap(), 1_500_000);
        assert_eq!(parse_timestamp("01:02:03.004").unwrap(), 3_723_004_000);
        assert_eq!(parse_timestamp("02:03.5").unwrap(), 123_500_000);
        assert!(parse_timestamp("1:2:3:4").is_err());
        assert!(parse_timestamp("00:00:01,x").is_err());
    }

    #[test]
    fn arrow_range_keeps_settings() {
        let (s, e, rest) =
            parse_time_range_arrow("00:00:01.000 --> 00:00:02.000 align:start line:0").unwrap();
        assert_eq!((s, e), (1_000_000, 2_000_000));
        assert_eq!(rest, "align:start line:0");
        assert!(matches!(
            parse_time_range_arrow("00:00:02.000 --> 00:00:01.000"),
            Err(CaptionError::InvalidInput(_))
        ));
    }

    #[test]
    fn ttml_time_expressions() {
        assert_eq!(parse_ttml_time("00:00:01.250").unwrap(), 1_250_000);
        assert_eq!(parse_ttml_time("00:00:01:15").unwrap(), 1_500_000);
        assert_eq!(parse_ttml_time("2.5s").unwrap(), 2_500_000);
        assert_eq!(parse_ttml_time("750ms").unwrap(), 750_000);
        assert_eq!(parse_ttml_time("1m").unwrap(), 60_000_000);
        assert!(parse_ttml_time("12").is_err());
        assert!(parse_ttml_time("3x").is_err());
    }
}
