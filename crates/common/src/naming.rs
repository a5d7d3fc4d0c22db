//! Export file naming.
//!
//! Exported images are named `{prefix}_{timestamp}.png`, where the timestamp
//! is the UTC ISO 8601 date-time truncated to seconds with the `-` and `:`
//! separators removed (e.g. `20261019T083015`).

use chrono::{DateTime, Utc};

/// Prefix used when no other prefix is configured.
pub const DEFAULT_EXPORT_PREFIX: &str = "running_stamp";

/// Compact timestamp used in export file names.
pub fn export_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S").to_string()
}

/// Build an export file name for the given instant.
pub fn export_file_name_at(prefix: &str, at: DateTime<Utc>) -> String {
    let prefix = sanitize_prefix(prefix);
    format!("{prefix}_{}.png", export_timestamp(at))
}

/// Build an export file name stamped with the current time.
pub fn export_file_name(prefix: &str) -> String {
    export_file_name_at(prefix, Utc::now())
}

/// Replace path separators and control characters so the prefix is always
/// a single path component.
fn sanitize_prefix(prefix: &str) -> String {
    let cleaned: String = prefix
        .trim()
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if cleaned.is_empty() {
        DEFAULT_EXPORT_PREFIX.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_drops_separators() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(export_timestamp(at), "20240309T070501");
    }

    #[test]
    fn file_name_uses_prefix_and_png_extension() {
        let at = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(
            export_file_name_at("morning_run", at),
            "morning_run_20241231T235959.png"
        );
    }

    #[test]
    fn empty_or_unsafe_prefix_is_sanitized() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            export_file_name_at("  ", at),
            "running_stamp_20240101T000000.png"
        );
        assert_eq!(export_file_name_at("a/b", at), "a_b_20240101T000000.png");
    }
}
