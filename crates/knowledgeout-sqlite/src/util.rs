//! Small shared helpers for row mapping

use chrono::{DateTime, Utc};

/// Current instant as the RFC 3339 string every timestamp column stores.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Parse a stored timestamp, falling back to now on a malformed value.
pub(crate) fn parse_ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let now = now_rfc3339();
        let parsed = parse_ts(&now);
        assert_eq!(parsed.to_rfc3339(), now);
    }
}
