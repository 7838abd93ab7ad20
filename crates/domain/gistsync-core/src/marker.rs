//! Remote change markers.
//!
//! Snapshots written since version tracking carry the newest history version of
//! the gist. Older snapshots only carry the gist's last-modified time rendered at
//! second precision, which is kept as a fallback.

use chrono::{DateTime, Utc};

use crate::RemoteGist;

const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionMarker {
    VersionToken(String),
    LegacyTimestamp(String),
}

impl VersionMarker {
    /// Whether `remote` is still at the state this marker captured.
    ///
    /// Tokens match only a remote reporting the identical version. Timestamps
    /// match the remote's last-modified time rendered the legacy way, exactly.
    pub fn matches(&self, remote: &RemoteGist) -> bool {
        match self {
            VersionMarker::VersionToken(token) => remote.version.as_deref() == Some(token.as_str()),
            VersionMarker::LegacyTimestamp(stamp) => {
                *stamp == format_legacy_timestamp(&remote.updated_at)
            }
        }
    }
}

/// Naive ISO-8601 rendering with second precision, e.g. `2019-03-04T05:06:07`.
pub fn format_legacy_timestamp(at: &DateTime<Utc>) -> String {
    at.format(LEGACY_TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn gist_at(secs: u32, millis: i64, version: Option<&str>) -> RemoteGist {
        RemoteGist {
            id: "g".into(),
            description: None,
            public: true,
            html_url: String::new(),
            updated_at: Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, secs).unwrap()
                + chrono::Duration::milliseconds(millis),
            version: version.map(str::to_string),
            files: BTreeMap::new(),
        }
    }

    #[test]
    fn legacy_timestamp_drops_subsecond_precision() {
        let gist = gist_at(5, 999, None);
        assert_eq!(gist.legacy_timestamp(), "2020-01-02T03:04:05");
        assert!(VersionMarker::LegacyTimestamp("2020-01-02T03:04:05".into()).matches(&gist));
    }

    #[test]
    fn legacy_timestamp_requires_exact_string() {
        let gist = gist_at(5, 0, None);
        assert!(!VersionMarker::LegacyTimestamp("2020-01-02T03:04:05+00:00".into()).matches(&gist));
        assert!(!VersionMarker::LegacyTimestamp("2020-01-02T03:04:06".into()).matches(&gist));
    }

    #[test]
    fn version_token_ignores_timestamps() {
        let gist = gist_at(59, 0, Some("abc"));
        assert!(VersionMarker::VersionToken("abc".into()).matches(&gist));
        assert!(!VersionMarker::VersionToken("abd".into()).matches(&gist));
        assert!(!VersionMarker::VersionToken("abc".into()).matches(&gist_at(59, 0, None)));
    }
}
