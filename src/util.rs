//! Shared utility functions

use chrono::{DateTime, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Default column budget for file names in tables
pub const FILE_NAME_WIDTH: usize = 30;

/// Safely truncate a string to at most `max_bytes` while respecting UTF-8 boundaries.
///
/// If the string is already shorter than `max_bytes`, returns it unchanged.
/// Otherwise, finds the last valid UTF-8 character boundary at or before `max_bytes`
/// and returns a slice up to that point.
pub fn truncate_utf8_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Take leading characters of `s` that fit in `max_width` display columns
fn take_width(s: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

/// Shorten a file name to fit `max_width` columns, keeping its extension
///
/// `"recording_from_the_morning_walk.zip"` becomes `"recording_from_the_morn...zip"`.
pub fn truncate_file_name(name: &str, max_width: usize) -> String {
    if name.width() <= max_width {
        return name.to_string();
    }

    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let budget = max_width.saturating_sub(ext.width() + 4);
            format!("{}...{}", take_width(stem, budget), ext)
        }
        _ => format!("{}...", take_width(name, max_width.saturating_sub(3))),
    }
}

/// Up to two upper-case initials, e.g. "Jean Dupont" -> "JD"
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

/// Day-first date as shown in tables ("18/10/2026")
pub fn format_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_shorter_than_max() {
        assert_eq!(truncate_utf8_safe("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_at_utf8_boundary() {
        // Each character is 3 bytes
        let s = "日本語";
        assert_eq!(truncate_utf8_safe(s, 4), "日");
        assert_eq!(truncate_utf8_safe(s, 6), "日本");
        assert_eq!(truncate_utf8_safe(s, 0), "");
    }

    #[test]
    fn test_truncate_file_name_keeps_extension() {
        assert_eq!(truncate_file_name("walk.zip", 30), "walk.zip");

        let long = "recording_from_the_morning_walk.zip";
        let short = truncate_file_name(long, 30);
        assert_eq!(short, "recording_from_the_morn...zip");
        assert!(short.width() <= 30);
    }

    #[test]
    fn test_truncate_file_name_without_extension() {
        assert_eq!(truncate_file_name("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_truncate_file_name_wide_chars() {
        // 2 columns per character
        let short = truncate_file_name("日本語日本語日本語.zip", 12);
        assert_eq!(short, "日本...zip");
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Jean Dupont"), "JD");
        assert_eq!(initials("marie claire durand"), "MC");
        assert_eq!(initials("  "), "");
    }

    #[test]
    fn test_format_date() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 8, 9, 30, 0).unwrap();
        assert_eq!(format_date(ts), "08/10/2026");
    }
}
