use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

pub const TYPE_KEY: &str = "__type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Match,
    Result,
    Event,
    Participant,
    Player,
    TeamStaff,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::Match,
        RecordKind::Result,
        RecordKind::Event,
        RecordKind::Participant,
        RecordKind::Player,
        RecordKind::TeamStaff,
    ];

    /// Dispatch on the FOGIS `__type` tag, e.g.
    /// `Svenskfotboll.Fogis.Web.FogisMobilDomarKlient.MatchresultatJSON`.
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        // Longer names first: several tags share the "Match" prefix.
        if tag.contains("MatchresultatJSON") {
            Some(RecordKind::Result)
        } else if tag.contains("MatchhandelseJSON") {
            Some(RecordKind::Event)
        } else if tag.contains("MatchdeltagareJSON") {
            Some(RecordKind::Participant)
        } else if tag.contains("MatchlagledareJSON") || tag.contains("LagkontaktJSON") {
            Some(RecordKind::TeamStaff)
        } else if tag.contains("MatchJSON") {
            Some(RecordKind::Match)
        } else {
            None
        }
    }

    pub fn from_cli_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.cli_name() == name.trim().to_ascii_lowercase())
    }

    pub fn cli_name(self) -> &'static str {
        match self {
            RecordKind::Match => "match",
            RecordKind::Result => "results",
            RecordKind::Event => "events",
            RecordKind::Participant => "participants",
            RecordKind::Player => "players",
            RecordKind::TeamStaff => "team-staff",
        }
    }

    /// Guess the kind of a CSV file from its header row.
    pub fn from_csv_headers(headers: &[String]) -> Option<Self> {
        let has = |name: &str| headers.iter().any(|h| h.eq_ignore_ascii_case(name));
        if has("matchhandelseid") {
            Some(RecordKind::Event)
        } else if has("matchdeltagareid") {
            Some(RecordKind::Participant)
        } else if has("matchresultatid") || has("matchresultattypid") {
            Some(RecordKind::Result)
        } else if has("matchnr") {
            Some(RecordKind::Match)
        } else if has("personid") && has("lagid") {
            Some(RecordKind::TeamStaff)
        } else if has("personid") {
            Some(RecordKind::Player)
        } else {
            None
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecordKind::Match => "match",
            RecordKind::Result => "match result",
            RecordKind::Event => "match event",
            RecordKind::Participant => "match participant",
            RecordKind::Player => "player",
            RecordKind::TeamStaff => "team staff",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    pub type_tag: String,
    pub records: Vec<Record>,
    pub ignored: usize,
}

/// Normalize a parsed JSON document into a list of object records and the
/// `__type` tag of the batch (taken from the first record).
pub fn determine_record_kind(data: Value) -> RecordBatch {
    match data {
        Value::Array(items) if !items.is_empty() => {
            let type_tag = items
                .first()
                .and_then(|v| v.get(TYPE_KEY))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            if type_tag.is_none() {
                log::warn!("data does not contain {TYPE_KEY} field");
            }
            let total = items.len();
            let records = items
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect::<Vec<_>>();
            let ignored = total - records.len();
            if ignored > 0 {
                log::warn!("ignoring {ignored} non-object entries");
            }
            RecordBatch {
                type_tag: type_tag.unwrap_or_default(),
                records,
                ignored,
            }
        }
        Value::Object(map) => {
            let type_tag = map.get(TYPE_KEY).and_then(|v| v.as_str()).map(|s| s.to_string());
            if type_tag.is_none() {
                log::warn!("data does not contain {TYPE_KEY} field");
            }
            RecordBatch {
                type_tag: type_tag.unwrap_or_default(),
                records: vec![map],
                ignored: 0,
            }
        }
        other => {
            log::warn!("unsupported data format: {}", json_kind(&other));
            RecordBatch::default()
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "empty array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_takes_tag_from_first_item() {
        let data = json!([{"__type": "TestType", "value": 1}, {"__type": "TestType", "value": 2}]);
        let batch = determine_record_kind(data);
        assert_eq!(batch.type_tag, "TestType");
        assert_eq!(batch.records.len(), 2);
    }

    #[test]
    fn single_object_is_wrapped() {
        let batch = determine_record_kind(json!({"__type": "SingleType", "value": 1}));
        assert_eq!(batch.type_tag, "SingleType");
        assert_eq!(batch.records.len(), 1);
    }

    #[test]
    fn missing_tag_keeps_records() {
        let batch = determine_record_kind(json!([{"value": 1}, {"value": 2}]));
        assert_eq!(batch.type_tag, "");
        assert_eq!(batch.records.len(), 2);

        let batch = determine_record_kind(json!({"value": 1}));
        assert_eq!(batch.type_tag, "");
        assert_eq!(batch.records.len(), 1);
    }

    #[test]
    fn scalars_and_empty_lists_yield_nothing() {
        assert_eq!(determine_record_kind(json!("not a dict or list")), RecordBatch::default());
        assert_eq!(determine_record_kind(json!([])), RecordBatch::default());
    }

    #[test]
    fn non_objects_in_list_are_counted() {
        let batch = determine_record_kind(json!([{"__type": "X"}, 3, "y"]));
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.ignored, 2);
    }

    #[test]
    fn type_tags_dispatch() {
        let prefix = "Svenskfotboll.Fogis.Web.FogisMobilDomarKlient.";
        let cases = [
            ("MatchJSON", Some(RecordKind::Match)),
            ("MatchresultatJSON", Some(RecordKind::Result)),
            ("MatchhandelseJSON", Some(RecordKind::Event)),
            ("MatchdeltagareJSON", Some(RecordKind::Participant)),
            ("MatchlagledareJSON", Some(RecordKind::TeamStaff)),
            ("SomethingElseJSON", None),
        ];
        for (suffix, expected) in cases {
            assert_eq!(RecordKind::from_type_tag(&format!("{prefix}{suffix}")), expected);
        }
    }

    #[test]
    fn csv_headers_dispatch() {
        let headers = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(
            RecordKind::from_csv_headers(&headers(&["personid", "fornamn"])),
            Some(RecordKind::Player)
        );
        assert_eq!(
            RecordKind::from_csv_headers(&headers(&["lagid", "personid"])),
            Some(RecordKind::TeamStaff)
        );
        assert_eq!(
            RecordKind::from_csv_headers(&headers(&["matchid", "matchresultattypid"])),
            Some(RecordKind::Result)
        );
        assert_eq!(RecordKind::from_csv_headers(&headers(&["name", "age"])), None);
    }

    #[test]
    fn cli_names_round_trip() {
        for kind in RecordKind::ALL {
            assert_eq!(RecordKind::from_cli_name(kind.cli_name()), Some(kind));
        }
        assert_eq!(RecordKind::from_cli_name("Team-Staff"), Some(RecordKind::TeamStaff));
        assert_eq!(RecordKind::from_cli_name("bogus"), None);
    }
}
