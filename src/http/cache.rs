//! HTTP cache validation module
//!
//! `Last-Modified` generation and `If-Modified-Since` handling for static files.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::SystemTime;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE).to_string()
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), HTTP_DATE)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Whether the client's copy is still fresh (should return 304)
///
/// Sub-second precision of `modified` is ignored; unparsable headers never match.
pub fn not_modified_since(if_modified_since: Option<&str>, modified: SystemTime) -> bool {
    let Some(since) = if_modified_since.and_then(parse_http_date) else {
        return false;
    };
    let modified = DateTime::<Utc>::from(modified).timestamp();
    modified <= since.timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_http_date() {
        assert_eq!(http_date(at(784_111_777)), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_not_modified_since() {
        let modified = at(784_111_777) + Duration::from_millis(400);
        assert!(not_modified_since(Some("Sun, 06 Nov 1994 08:49:37 GMT"), modified));
        assert!(not_modified_since(Some("Mon, 07 Nov 1994 00:00:00 GMT"), modified));
        assert!(!not_modified_since(Some("Sun, 06 Nov 1994 08:49:36 GMT"), modified));
    }

    #[test]
    fn test_invalid_or_missing_header() {
        assert!(!not_modified_since(None, at(0)));
        assert!(!not_modified_since(Some("yesterday"), at(0)));
    }
}
