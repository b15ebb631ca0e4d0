//! Parsing helpers shared by all backend decoders.

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;

use crate::error::{VcsError, VcsResult};

/// Parse a unix epoch timestamp into UTC.
///
/// Mercurial appends a fractional part and a timezone offset after a dot
/// (e.g. "1372874400.0-7200"); everything from the first dot on is
/// discarded before parsing. The offset carries no information once the
/// value is interpreted as an epoch.
pub(crate) fn unix_timestamp(value: &str) -> VcsResult<DateTime<Utc>> {
    let digits = match value.find('.') {
        Some(dot) => &value[..dot],
        None => value,
    };
    let secs: i64 = digits
        .trim()
        .parse()
        .map_err(|_| VcsError::MalformedOutput(format!("invalid timestamp {:?}", value)))?;
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| VcsError::MalformedOutput(format!("timestamp {} out of range", secs)))
}

/// Split accumulated message lines into (subject, body).
///
/// The subject is the trimmed first line, the body the trimmed remainder.
pub(crate) fn split_message(lines: &[&str]) -> (String, String) {
    match lines.len() {
        0 => (String::new(), String::new()),
        1 => (lines[0].trim().to_string(), String::new()),
        _ => (
            lines[0].trim().to_string(),
            lines[1..].join("\n").trim().to_string(),
        ),
    }
}

/// Split an RFC mailbox style author line ("Name <addr>") into name and
/// email. A bare address yields an empty name; anything else is kept
/// whole as the name with an empty email.
pub(crate) fn split_author(value: &str) -> (String, String) {
    let value = value.trim();
    let re = Regex::new(r"^(.*?)\s*<([^<>]+)>$").unwrap();
    if let Some(caps) = re.captures(value) {
        return (caps[1].to_string(), caps[2].to_string());
    }
    if value.contains('@') && !value.contains(' ') {
        return (String::new(), value.to_string());
    }
    (value.to_string(), String::new())
}

/// Split each non-empty line into two columns at the first space, with
/// the second column trimmed. Lines without a space are skipped.
pub(crate) fn two_column_lines(data: &str) -> Vec<(String, String)> {
    let mut columns = Vec::new();
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(idx) = line.find(' ') {
            columns.push((line[..idx].to_string(), line[idx..].trim().to_string()));
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn unix_timestamp_plain() {
        let ts = unix_timestamp("1372874400").unwrap();
        assert_eq!(ts.year(), 2013);
        assert_eq!(ts.hour(), 18);
    }

    #[test]
    fn unix_timestamp_truncates_fractional_suffix() {
        let plain = unix_timestamp("1372874400").unwrap();
        assert_eq!(unix_timestamp("1372874400.0-7200").unwrap(), plain);
        assert_eq!(unix_timestamp("1372874400.25").unwrap(), plain);
    }

    #[test]
    fn unix_timestamp_rejects_garbage() {
        assert!(matches!(
            unix_timestamp("yesterday"),
            Err(VcsError::MalformedOutput(_))
        ));
        assert!(matches!(
            unix_timestamp(""),
            Err(VcsError::MalformedOutput(_))
        ));
    }

    #[test]
    fn split_message_cases() {
        assert_eq!(split_message(&[]), (String::new(), String::new()));
        assert_eq!(
            split_message(&["subject only "]),
            ("subject only".to_string(), String::new())
        );
        assert_eq!(
            split_message(&["subject", "", "body line one", "body line two"]),
            (
                "subject".to_string(),
                "body line one\nbody line two".to_string()
            )
        );
    }

    #[test]
    fn split_author_mailbox() {
        assert_eq!(
            split_author("Jane Doe <jane@example.com>"),
            ("Jane Doe".to_string(), "jane@example.com".to_string())
        );
    }

    #[test]
    fn split_author_bare_address() {
        assert_eq!(
            split_author("jane@example.com"),
            (String::new(), "jane@example.com".to_string())
        );
    }

    #[test]
    fn split_author_fallback_keeps_whole_string_as_name() {
        assert_eq!(
            split_author("just a name"),
            ("just a name".to_string(), String::new())
        );
    }

    #[test]
    fn two_column_lines_splits_at_first_space() {
        let data = "abc123 refs/heads/main\n\n  def456   v1.0  \nnospace\n";
        assert_eq!(
            two_column_lines(data),
            vec![
                ("abc123".to_string(), "refs/heads/main".to_string()),
                ("def456".to_string(), "v1.0".to_string()),
            ]
        );
    }
}
