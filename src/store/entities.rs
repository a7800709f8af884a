use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// A checklist item belonging to a task.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct CardEntity {
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

/// One recorded interval of focused work. `duration` is in minutes.
///
/// Old store files may carry dates and durations written by hand or by
/// buggy writers, so deserialization never fails on them: an unusable
/// duration comes back as 0, an unusable date as `None` (the aggregation
/// then falls back to its reference instant).
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct SessionEntity {
    #[serde(
        default,
        serialize_with = "chrono::serde::ts_seconds_option::serialize",
        deserialize_with = "lenient_date"
    )]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub duration: i64,
}

impl SessionEntity {
    /// Minutes this session contributes to any sum. Invalid durations were
    /// already coerced to 0 during deserialization, negatives clamp here.
    pub fn minutes_or_zero(&self) -> i64 {
        self.duration.max(0)
    }
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|v| v.with_timezone(&Utc)),
        _ => None,
    })
}

fn lenient_minutes<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    })
}

/// A unit of study work, owning a checklist and an append-only session log.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct TaskEntity {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub cards: Vec<CardEntity>,
    #[serde(default)]
    pub sessions: Vec<SessionEntity>,
}

impl TaskEntity {
    pub fn new(id: u64, name: String) -> Self {
        Self {
            id,
            name,
            completed: false,
            cards: vec![],
            sessions: vec![],
        }
    }

    /// Sum of all session durations, with invalid ones contributing nothing.
    pub fn total_minutes(&self) -> i64 {
        self.sessions.iter().map(SessionEntity::minutes_or_zero).sum()
    }

    pub fn cards_done(&self) -> usize {
        self.cards.iter().filter(|c| c.done).count()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn session_from_json(json: &str) -> SessionEntity {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn lenient_duration_accepts_numbers_and_numeric_strings() {
        assert_eq!(session_from_json(r#"{"duration": 25}"#).duration, 25);
        assert_eq!(session_from_json(r#"{"duration": 25.7}"#).duration, 25);
        assert_eq!(session_from_json(r#"{"duration": " 30 "}"#).duration, 30);
    }

    #[test]
    fn lenient_duration_coerces_garbage_to_zero() {
        assert_eq!(session_from_json(r#"{"duration": "abc"}"#).duration, 0);
        assert_eq!(session_from_json(r#"{"duration": null}"#).duration, 0);
        assert_eq!(session_from_json(r#"{"duration": [1, 2]}"#).duration, 0);
        assert_eq!(session_from_json(r#"{}"#).duration, 0);
    }

    #[test]
    fn lenient_date_accepts_unix_seconds_and_rfc3339() {
        let from_seconds = session_from_json(r#"{"date": 1709546400, "duration": 10}"#);
        assert_eq!(
            from_seconds.date,
            Some(chrono::Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap())
        );

        let from_rfc3339 =
            session_from_json(r#"{"date": "2024-03-04T10:00:00Z", "duration": 10}"#);
        assert_eq!(from_rfc3339.date, from_seconds.date);
    }

    #[test]
    fn lenient_date_coerces_garbage_to_none() {
        assert_eq!(session_from_json(r#"{"date": "abc", "duration": 10}"#).date, None);
        assert_eq!(session_from_json(r#"{"date": null, "duration": 10}"#).date, None);
        assert_eq!(
            session_from_json(r#"{"date": {"$oid": "x"}, "duration": 10}"#).date,
            None
        );
    }

    #[test]
    fn negative_durations_count_as_zero_minutes() {
        let session = session_from_json(r#"{"duration": -5}"#);
        assert_eq!(session.duration, -5);
        assert_eq!(session.minutes_or_zero(), 0);
    }

    #[test]
    fn total_minutes_skips_invalid_sessions() {
        let task: TaskEntity = serde_json::from_str(
            r#"{
                "id": 1,
                "name": "Algebra",
                "sessions": [
                    {"duration": 30},
                    {"duration": -5},
                    {"duration": "abc"},
                    {"duration": 20}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(task.total_minutes(), 50);
    }
}
