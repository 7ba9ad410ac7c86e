use chrono::DateTime;
use chrono::NaiveDateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

/// Backend-tracked state for one ticket intake attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    /// Advisory only; expiry is detected when the backend stops
    /// recognising the id.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(id: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: id.into(),
            expires_at,
        }
    }

    /// Builds a session from the raw reply fields. Blank ids mean the
    /// backend did not open a session.
    pub fn from_reply(session_id: Option<&str>, expires_at: Option<&str>) -> Option<Self> {
        let id = session_id.map(str::trim).filter(|id| !id.is_empty())?;
        Some(Self::new(id, expires_at.and_then(parse_expiry)))
    }
}

/// Accepts RFC 3339 as well as the naive ISO timestamps the backend emits,
/// which are UTC.
fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc()),
        Err(err) => {
            warn!(expires_at = raw, error = %err, "ignoring unparseable session expiry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_naive_and_offset_expiry() {
        let naive = Session::from_reply(Some("s-1"), Some("2026-10-16T12:30:00.123456"))
            .expect("session");
        assert_eq!(
            naive.expires_at.map(|at| at.timestamp()),
            Some(Utc.with_ymd_and_hms(2026, 10, 16, 12, 30, 0).unwrap().timestamp())
        );

        let offset =
            Session::from_reply(Some("s-2"), Some("2026-10-16T14:30:00+02:00")).expect("session");
        assert_eq!(
            offset.expires_at,
            Some(Utc.with_ymd_and_hms(2026, 10, 16, 12, 30, 0).unwrap())
        );
    }

    #[test]
    fn blank_or_missing_id_means_no_session() {
        assert_eq!(Session::from_reply(None, Some("2026-10-16T12:00:00")), None);
        assert_eq!(Session::from_reply(Some("  "), None), None);
    }

    #[test]
    fn garbage_expiry_keeps_the_session() {
        let session = Session::from_reply(Some("s-3"), Some("tomorrow")).expect("session");
        assert_eq!(session.id, "s-3");
        assert_eq!(session.expires_at, None);
    }
}
