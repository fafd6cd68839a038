//! Formatting utilities for table output and age display

use chrono::{DateTime, Utc};

/// Format a timestamp as a human-readable age (e.g., "2d", "5h", "30m", "15s")
pub fn format_age(timestamp: &DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(*timestamp);
    if duration.num_seconds() < 0 {
        return "0s".to_string();
    }

    match (duration.num_days(), duration.num_hours(), duration.num_minutes()) {
        (d, _, _) if d > 0 => format!("{}d", d),
        (_, h, _) if h > 0 => format!("{}h", h),
        (_, _, m) if m > 0 => format!("{}m", m),
        _ => format!("{}s", duration.num_seconds()),
    }
}

/// Age of an epoch-millisecond timestamp; "-" when unset
pub fn format_age_millis(millis: i64) -> String {
    if millis <= 0 {
        return "-".to_string();
    }
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| format_age(&t))
        .unwrap_or_else(|| "-".to_string())
}

/// Age of an RFC 3339 timestamp; "-" when absent or unparsable
pub fn format_age_rfc3339(timestamp: Option<&str>) -> String {
    timestamp
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| format_age(&t.with_timezone(&Utc)))
        .unwrap_or_else(|| "-".to_string())
}

/// Render rows as column-aligned lines, headers first
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:<width$}", cell, width = w)
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![line(headers.to_vec())];
    lines.extend(rows.iter().map(|row| line(row.iter().map(String::as_str).collect())));
    lines
}

/// Print rows as a column-aligned table with headers
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    for line in render_table(headers, rows) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_age_units() {
        assert_eq!(format_age(&(Utc::now() - Duration::seconds(45))), "45s");
        assert_eq!(format_age(&(Utc::now() - Duration::minutes(12))), "12m");
        assert_eq!(format_age(&(Utc::now() - Duration::hours(3))), "3h");
        assert_eq!(format_age(&(Utc::now() - Duration::days(7))), "7d");
    }

    #[test]
    fn test_format_age_future_timestamp() {
        let ts = Utc::now() + Duration::hours(1);
        assert_eq!(format_age(&ts), "0s");
    }

    #[test]
    fn test_format_age_unset_values() {
        assert_eq!(format_age_millis(0), "-");
        assert_eq!(format_age_rfc3339(None), "-");
        assert_eq!(format_age_rfc3339(Some("yesterday")), "-");
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let lines = render_table(
            &["NAME", "PHASE"],
            &[
                vec!["acme".to_string(), "Active".to_string()],
                vec!["globex-industries".to_string(), "Paused".to_string()],
            ],
        );
        assert_eq!(
            lines,
            vec![
                "NAME               PHASE",
                "acme               Active",
                "globex-industries  Paused",
            ]
        );
    }
}
