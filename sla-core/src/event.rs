use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

/// Layout of the `timestamp` field, fixed to six fractional digits.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%6f";
const TIMESTAMP_LEN: usize = "2018-12-26 18:11:08.509654".len();

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed event: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },
    #[error("invalid timestamp {0:?}: expected YYYY-MM-DD HH:MM:SS.ssssss")]
    TimestampLayout(String),
}

/// Descriptive fields carried by a delivery event. None of them take part in the average,
/// so they are kept as raw JSON and never rejected for their type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventMeta {
    #[serde(default)]
    pub translation_id: Option<Value>,
    #[serde(default)]
    pub source_language: Option<Value>,
    #[serde(default)]
    pub target_language: Option<Value>,
    #[serde(default)]
    pub client_name: Option<Value>,
    #[serde(default)]
    pub event_name: Option<Value>,
    #[serde(default)]
    pub nr_words: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    timestamp: String,
    duration: u64,
    #[serde(flatten)]
    meta: EventMeta,
}

/// One decoded `translation_delivered` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub timestamp: NaiveDateTime,
    pub duration: u64,
    pub meta: EventMeta,
}

impl RawEvent {
    pub fn new(timestamp: NaiveDateTime, duration: u64) -> Self {
        Self {
            timestamp,
            duration,
            meta: EventMeta::default(),
        }
    }

    /// Decodes one JSON line.
    pub fn parse(line: &str) -> std::result::Result<Self, ParseError> {
        let wire: WireEvent = serde_json::from_str(line)?;
        let timestamp = parse_timestamp(&wire.timestamp)?;
        Ok(Self {
            timestamp,
            duration: wire.duration,
            meta: wire.meta,
        })
    }
}

pub fn parse_timestamp(value: &str) -> std::result::Result<NaiveDateTime, ParseError> {
    // chrono accepts unpadded numeric fields, the layout is fixed-width
    if value.len() != TIMESTAMP_LEN {
        return Err(ParseError::TimestampLayout(value.to_string()));
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|source| {
        ParseError::Timestamp {
            value: value.to_string(),
            source,
        }
    })
}

/// Decodes `input` line by line, in stream order. Errors carry the 1-based line number.
pub fn parse_events(input: &str) -> impl Iterator<Item = Result<RawEvent>> + '_ {
    input.lines().enumerate().map(|(idx, line)| {
        RawEvent::parse(line).map_err(|source| Error::Parse {
            line: idx + 1,
            source,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const LINE: &str = r#"{"timestamp": "2018-12-26 18:11:08.509654","translation_id": "5aa5b2f39f7254a75aa5","source_language": "en","target_language": "fr","client_name": "airliberty","event_name": "translation_delivered","nr_words": 30, "duration": 20}"#;

    #[test]
    fn parses_full_event() {
        let ev = RawEvent::parse(LINE).unwrap();
        let expected = NaiveDate::from_ymd_opt(2018, 12, 26)
            .unwrap()
            .and_hms_micro_opt(18, 11, 8, 509_654)
            .unwrap();
        assert_eq!(ev.timestamp, expected);
        assert_eq!(ev.duration, 20);
        assert_eq!(ev.meta.client_name, Some(serde_json::json!("airliberty")));
        assert_eq!(ev.meta.nr_words, Some(serde_json::json!(30)));
    }

    #[test]
    fn parses_minimal_event_and_ignores_unknown_fields() {
        let ev = RawEvent::parse(
            r#"{"timestamp": "2018-12-26 18:11:08.000000", "duration": 7, "extra": [1, 2]}"#,
        )
        .unwrap();
        assert_eq!(ev.duration, 7);
        assert_eq!(ev.meta, EventMeta::default());
    }

    #[test]
    fn descriptive_fields_of_any_type_are_accepted() {
        let ev = RawEvent::parse(
            r#"{"timestamp": "2018-12-26 18:11:00.000000", "duration": 20, "nr_words": -5, "client_name": 7, "event_name": null}"#,
        )
        .unwrap();
        assert_eq!(ev.duration, 20);
        assert_eq!(ev.meta.nr_words, Some(serde_json::json!(-5)));
        assert_eq!(ev.meta.client_name, Some(serde_json::json!(7)));
        assert_eq!(ev.meta.event_name, None);
    }

    #[test]
    fn rejects_missing_microseconds() {
        let err = RawEvent::parse(r#"{"timestamp": "2018-12-26 18:11:08", "duration": 1}"#)
            .unwrap_err();
        assert!(matches!(err, ParseError::TimestampLayout(_)));
    }

    #[test]
    fn rejects_wrong_separators() {
        let err = RawEvent::parse(r#"{"timestamp": "2018-12-26T18:11:08.509654", "duration": 1}"#)
            .unwrap_err();
        assert!(matches!(err, ParseError::Timestamp { .. }));
    }

    #[test]
    fn rejects_bad_duration_types() {
        for line in [
            r#"{"timestamp": "2018-12-26 18:11:08.509654", "duration": "20"}"#,
            r#"{"timestamp": "2018-12-26 18:11:08.509654", "duration": -1}"#,
            r#"{"timestamp": "2018-12-26 18:11:08.509654", "duration": 2.5}"#,
            r#"{"timestamp": "2018-12-26 18:11:08.509654"}"#,
        ] {
            assert!(matches!(RawEvent::parse(line), Err(ParseError::Json(_))), "{line}");
        }
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(RawEvent::parse("not json"), Err(ParseError::Json(_))));
        assert!(matches!(RawEvent::parse(""), Err(ParseError::Json(_))));
    }

    #[test]
    fn parse_events_reports_line_number() {
        let input = format!("{LINE}\n{{\"duration\": 3}}\n{LINE}");
        let results: Vec<_> = parse_events(&input).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(Error::Parse { line, .. }) => assert_eq!(*line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_events_ignores_trailing_newline() {
        let input = format!("{LINE}\r\n{LINE}\n");
        let events: Vec<_> = parse_events(&input).collect::<Result<_>>().unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn parse_events_of_empty_input_yields_nothing() {
        assert_eq!(parse_events("").count(), 0);
    }
}
