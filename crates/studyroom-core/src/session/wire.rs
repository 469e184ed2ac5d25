//! JSON shape of the external "create session" endpoint.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::StudySession;

/// Backend `LocalDateTime` pattern: local time, no offset.
pub const WIRE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: i64,
}

/// Request body for `POST /api/sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    #[serde(with = "local_time")]
    pub start_time: NaiveDateTime,
    #[serde(with = "local_time")]
    pub end_time: NaiveDateTime,
    pub course: IdRef,
    pub topic: IdRef,
    pub duration_in_minutes: u64,
}

impl From<&StudySession> for SessionPayload {
    fn from(session: &StudySession) -> Self {
        Self {
            start_time: session.start_time,
            end_time: session.end_time,
            course: IdRef {
                id: session.course_id,
            },
            topic: IdRef {
                id: session.topic_id,
            },
            duration_in_minutes: session.duration_in_minutes,
        }
    }
}

/// What the store answered. Only the assigned id is relied on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub duration_in_minutes: Option<i64>,
}

pub mod local_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::WIRE_TIME_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format(WIRE_TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Accepts the wire pattern, with or without fractional seconds.
    pub fn parse(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(raw, WIRE_TIME_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn payload_uses_nested_ids_and_local_times() {
        let start = NaiveDate::from_ymd_opt(2025, 4, 26)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let end = start + chrono::Duration::minutes(25);
        let session = StudySession::from_interval(3, 7, start, end).unwrap();

        let body = serde_json::to_value(SessionPayload::from(&session)).unwrap();
        assert_eq!(
            body,
            json!({
                "startTime": "2025-04-26T14:30:00",
                "endTime": "2025-04-26T14:55:00",
                "course": { "id": 3 },
                "topic": { "id": 7 },
                "durationInMinutes": 25
            })
        );
    }

    #[test]
    fn stored_session_ignores_extra_fields() {
        let stored: StoredSession = serde_json::from_value(json!({
            "id": 12,
            "startTime": "2025-04-26T14:30:00",
            "durationInMinutes": 25,
            "course": { "id": 3, "name": "Algebra" }
        }))
        .unwrap();
        assert_eq!(stored.id, Some(12));
        assert_eq!(stored.duration_in_minutes, Some(25));
    }

    #[test]
    fn parse_accepts_fractional_seconds() {
        let t = local_time::parse("2025-04-26T14:30:00.250").unwrap();
        assert_eq!(t.format(WIRE_TIME_FORMAT).to_string(), "2025-04-26T14:30:00");
    }
}
