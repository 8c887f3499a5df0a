//! Message payload model, validation and title formatting.

use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Deserializer};

use super::MessageError;

/// Payload substituted when no fetch has ever succeeded.
pub const EMPTY_PAYLOAD: &[u8] = br#"{"msg":[]}"#;

/// Substrings that mark a payload as injected markup or script.
const INJECTION_MARKERS: [&str; 4] = ["<script", "javascript:", "<iframe", "onerror="];

/// Which side of the conversation a message is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "out", alias = "sent", alias = "tx", alias = "mo")]
    Outgoing,
    #[serde(alias = "in", alias = "received", alias = "rx", alias = "mt")]
    Incoming,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Direction {
    /// Self-sent messages get their own title colour.
    pub fn is_outgoing(self) -> bool {
        self == Direction::Outgoing
    }
}

/// One SMS in the thread.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub index: Option<u64>,
    #[serde(default)]
    pub sender: String,
    /// Local wall-clock time of the message
    #[serde(deserialize_with = "de_timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub to: String,
}

#[derive(Deserialize)]
struct Payload {
    #[serde(default)]
    msg: Vec<Message>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Epoch(i64),
    Text(String),
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Epoch(secs) => DateTime::from_timestamp(secs, 0)
            .map(|utc| utc.with_timezone(&Local).naive_local())
            .ok_or_else(|| serde::de::Error::custom("epoch timestamp out of range")),
        RawTimestamp::Text(text) => parse_timestamp(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp {text:?}"))),
    }
}

/// RFC 3339 (converted to local time) or a naive local `YYYY-MM-DD HH:MM:SS`.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Reject payloads that look like injected markup or script.
pub fn check_injection(payload: &[u8]) -> Result<(), MessageError> {
    let lowered = String::from_utf8_lossy(payload).to_lowercase();
    match INJECTION_MARKERS.iter().copied().find(|m| lowered.contains(*m)) {
        Some(marker) => Err(MessageError::Injection { marker }),
        None => Ok(()),
    }
}

/// Validate and decode a payload, newest message first.
pub fn parse_payload(payload: &[u8]) -> Result<Vec<Message>, MessageError> {
    check_injection(payload)?;
    let mut messages = serde_json::from_slice::<Payload>(payload)
        .map_err(|e| MessageError::Malformed {
            message: e.to_string(),
        })?
        .msg;
    messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(messages)
}

/// Title line of a message: sender on the left, date on the right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub sender: String,
    pub date: String,
}

impl Title {
    pub fn new(message: &Message, now: NaiveDateTime) -> Self {
        let sender = if message.sender.trim().is_empty() {
            "Unknown".to_owned()
        } else {
            message.sender.trim().to_owned()
        };
        Self {
            sender,
            date: format_date(message.timestamp, now),
        }
    }
}

impl core::fmt::Display for Title {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}|{}", self.sender, self.date)
    }
}

/// Relative date label: `HH:MM` today, `Y-day HH:MM` yesterday, `MM-DD`
/// this year, `YYYY-MM-DD` otherwise.
pub fn format_date(when: NaiveDateTime, now: NaiveDateTime) -> String {
    let day = when.date();
    let today = now.date();
    if day == today {
        when.format("%H:%M").to_string()
    } else if today - TimeDelta::days(1) == day {
        when.format("Y-day %H:%M").to_string()
    } else if day.year() == today.year() {
        when.format("%m-%d").to_string()
    } else {
        when.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn date_labels() {
        let now = dt("2024-05-10 18:00:00");
        assert_eq!(format_date(dt("2024-05-10 09:05:00"), now), "09:05");
        assert_eq!(format_date(dt("2024-05-09 23:59:00"), now), "Y-day 23:59");
        assert_eq!(format_date(dt("2024-01-02 10:00:00"), now), "01-02");
        assert_eq!(format_date(dt("2023-12-31 10:00:00"), now), "2023-12-31");
    }

    #[test]
    fn yesterday_across_new_year() {
        let now = dt("2024-01-01 08:00:00");
        assert_eq!(format_date(dt("2023-12-31 22:10:00"), now), "Y-day 22:10");
    }

    #[test]
    fn rejects_injection_case_insensitively() {
        for payload in [
            r#"{"msg":[{"content":"<SCRIPT>alert(1)</script>"}]}"#,
            r#"{"msg":[{"content":"JavaScript:void(0)"}]}"#,
            r#"{"msg":[{"content":"<img OnError=x>"}]}"#,
            r#"{"msg":[{"content":"<IFrame src=x>"}]}"#,
        ] {
            assert!(matches!(
                parse_payload(payload.as_bytes()),
                Err(MessageError::Injection { .. })
            ));
        }
    }

    #[test]
    fn parses_and_sorts_newest_first() {
        let payload = br#"{"msg":[
            {"index":1,"sender":"+100","timestamp":"2024-05-01 10:00:00","content":"old","direction":"in"},
            {"index":2,"sender":"me","timestamp":"2024-05-03 10:00:00","content":"new","direction":"sent"},
            {"index":3,"sender":"+100","timestamp":"2024-05-02 10:00:00","content":"mid","direction":"weird"}
        ]}"#;
        let messages = parse_payload(payload).unwrap();
        let order: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(order, vec!["new", "mid", "old"]);
        assert_eq!(messages[0].direction, Direction::Outgoing);
        assert_eq!(messages[1].direction, Direction::Unknown);
        assert_eq!(messages[2].direction, Direction::Incoming);
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            parse_payload(b"{\"msg\": [1, 2"),
            Err(MessageError::Malformed { .. })
        ));
        assert!(matches!(
            parse_payload(br#"{"msg":[{"timestamp":"yesterday"}]}"#),
            Err(MessageError::Malformed { .. })
        ));
        assert!(parse_payload(EMPTY_PAYLOAD).unwrap().is_empty());
    }

    #[test]
    fn title_display_and_blank_sender() {
        let message = Message {
            index: None,
            sender: "  ".into(),
            timestamp: dt("2024-05-10 07:30:00"),
            content: String::new(),
            status: String::new(),
            direction: Direction::Incoming,
            to: String::new(),
        };
        let title = Title::new(&message, dt("2024-05-10 12:00:00"));
        assert_eq!(title.to_string(), "Unknown|07:30");
    }
}
