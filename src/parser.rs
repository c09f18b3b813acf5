use std::fs;
use std::io::Read;
use std::path::Path;

use csv::Reader;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::calendar::{Calendar, CALENDAR_NAME_KEY, CALENDAR_SLOTS_KEY};
use crate::error::{Result, SchedulerError};
use crate::event::{is_reserved_key, Event, NoteValue, END_TIME_KEY, NAME_KEY, START_TIME_KEY};
use crate::schedule::parse_time_slots;

/// Converts one ingested JSON value to note strings.
/// Strings stay verbatim, other scalars use their JSON text, null is dropped.
fn note_values(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(note_values).collect(),
        other => vec![other.to_string()],
    }
}

/// Reads an optional time field; a non-string value is kept as its JSON text
fn time_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Builds an Event from one record of the event-array format.
///
/// `Name` is required; `Start Time` and `End Time` are optional; every
/// other key becomes a note.
pub fn event_from_record(record: &Map<String, Value>) -> Result<Event> {
    let tag = match record.get(NAME_KEY) {
        Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(SchedulerError::InvalidRecord(format!("missing \"{}\"", NAME_KEY))),
    };

    let mut event = Event::new(
        tag,
        time_field(record, START_TIME_KEY),
        time_field(record, END_TIME_KEY),
    );

    for (key, value) in record {
        if is_reserved_key(key) {
            continue;
        }
        let values = note_values(value);
        if values.is_empty() {
            continue;
        }
        event.extend_note(key.clone(), NoteValue::Many(values));
    }

    Ok(event)
}

/// Parses a JSON array of event records
pub fn parse_events_json(json: &str) -> Result<Vec<Event>> {
    let value: Value = serde_json::from_str(json)?;
    events_from_value(&value)
}

pub fn events_from_value(value: &Value) -> Result<Vec<Event>> {
    let Value::Array(records) = value else {
        return Err(SchedulerError::InvalidRecord("expected an array of events".to_string()));
    };

    records
        .iter()
        .enumerate()
        .map(|(index, record)| match record {
            Value::Object(map) => event_from_record(map),
            _ => Err(SchedulerError::InvalidRecord(format!("entry {} is not an object", index))),
        })
        .collect()
}

/// Reads events from CSV with a header row.
///
/// `Name`, `Start Time` and `End Time` columns map to the event fields;
/// every other non-empty cell becomes a note under its column header.
pub fn parse_events_csv<R: Read>(input: R) -> Result<Vec<Event>> {
    let mut reader = Reader::from_reader(input);
    let headers = reader.headers()?.clone();

    let name_col = headers
        .iter()
        .position(|h| h.trim() == NAME_KEY)
        .ok_or_else(|| SchedulerError::InvalidRecord(format!("missing \"{}\" column", NAME_KEY)))?;
    let start_col = headers.iter().position(|h| h.trim() == START_TIME_KEY);
    let end_col = headers.iter().position(|h| h.trim() == END_TIME_KEY);

    let mut events = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;

        let name = record.get(name_col).unwrap_or("").trim();
        if name.is_empty() {
            warn!(row = row + 1, "Skipping CSV row without a name");
            continue;
        }

        let cell = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let mut event = Event::new(name, cell(start_col), cell(end_col));

        for (col, header) in headers.iter().enumerate() {
            if col == name_col || Some(col) == start_col || Some(col) == end_col {
                continue;
            }
            if let Some(value) = record.get(col).map(str::trim).filter(|v| !v.is_empty()) {
                event.extend_note(header.trim(), value);
            }
        }
        events.push(event);
    }

    debug!(events = events.len(), "Parsed events from CSV");
    Ok(events)
}

/// Rebuilds a Calendar from its `to_json` export.
///
/// Slot order follows the export; every event is assigned (and loaded
/// into) the slot it was listed under.
pub fn calendar_from_json(value: &Value) -> Result<Calendar> {
    let tag = value
        .get(CALENDAR_NAME_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| SchedulerError::InvalidRecord(format!("calendar is missing \"{}\"", CALENDAR_NAME_KEY)))?;
    let slots = value
        .get(CALENDAR_SLOTS_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| SchedulerError::InvalidRecord(format!("calendar is missing \"{}\"", CALENDAR_SLOTS_KEY)))?;

    let mut calendar = Calendar::new(tag, slots.keys().cloned().collect());
    for (slot, records) in slots {
        let mut events = events_from_value(records)?;
        for event in events.iter_mut() {
            event.assigned_start_time = Some(slot.clone());
        }
        calendar.load(events);
    }
    Ok(calendar)
}

pub fn load_events<P: AsRef<Path>>(path: P) -> Result<Vec<Event>> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        parse_events_csv(fs::File::open(path)?)
    } else {
        parse_events_json(&fs::read_to_string(path)?)
    }
}

pub fn load_time_slots<P: AsRef<Path>>(path: P, strict: bool) -> Result<Vec<String>> {
    parse_time_slots(&fs::read_to_string(path)?, strict)
}

pub fn load_calendar<P: AsRef<Path>>(path: P) -> Result<Calendar> {
    let value: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    calendar_from_json(&value)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::io::Write;

    use serde_json::json;

    use super::*;

    type Triple = (String, Option<String>, Option<String>, Vec<(String, Vec<String>)>);

    fn triples<'a>(events: impl IntoIterator<Item = &'a Event>) -> BTreeSet<Triple> {
        events
            .into_iter()
            .map(|e| {
                (
                    e.tag.clone(),
                    e.start_time.clone(),
                    e.end_time.clone(),
                    e.notes.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn test_event_record_extra_keys_become_notes() {
        let events = parse_events_json(
            r#"[{"Name": "CS101", "Start Time": "09:00", "End Time": "10:00",
                 "Topic": "graphs", "Tags": ["a", 2], "Seats": 40, "Empty": null}]"#,
        )
        .unwrap();

        let event = &events[0];
        assert_eq!(event.tag, "CS101");
        assert_eq!(event.start_time.as_deref(), Some("09:00"));
        assert_eq!(event.note("Topic").unwrap(), ["graphs"]);
        assert_eq!(event.note("Tags").unwrap(), ["a", "2"]);
        assert_eq!(event.note("Seats").unwrap(), ["40"]);
        assert!(!event.has_note("Empty"));
        assert!(event.assigned_start_time.is_none());
    }

    #[test]
    fn test_event_record_requires_name() {
        let err = parse_events_json(r#"[{"Start Time": "09:00"}]"#).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidRecord(_)));
        assert!(parse_events_json(r#"{"Name": "x"}"#).is_err());
        assert!(parse_events_json(r#"["x"]"#).is_err());
    }

    #[test]
    fn test_csv_ingestion() {
        let data = "Name,Start Time,End Time,Topic,Room\nCS101,09:00,10:00,graphs,\nCS102,,,poetry,B2\n,09:00,,x,y\n";
        let events = parse_events_csv(data.as_bytes()).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].note("Topic").unwrap(), ["graphs"]);
        assert!(!events[0].has_note("Room"));
        assert!(events[1].start_time.is_none());
        assert_eq!(events[1].note("Room").unwrap(), ["B2"]);
    }

    #[test]
    fn test_csv_requires_name_column() {
        let err = parse_events_csv("Title,Start Time\nx,09:00\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidRecord(_)));
    }

    #[test]
    fn test_calendar_export_round_trip() {
        let input = json!([
            {"Name": "a", "Start Time": "09:00", "End Time": "10:00", "Topic": ["graphs", "trees"]},
            {"Name": "b", "Start Time": null, "End Time": "11:00"},
            {"Name": "c", "Start Time": "09:00", "End Time": "10:00", "Level": "intro"}
        ]);
        let events = events_from_value(&input).unwrap();
        let expected = triples(&events);

        let mut calendar = Calendar::new("term", vec!["T2".to_string(), "T1".to_string()]);
        let mut assigned = events.clone();
        calendar.start_time_assign(&mut assigned).unwrap();
        calendar.load(assigned);

        let exported = calendar.to_json();
        let reimported = calendar_from_json(&exported).unwrap();

        assert_eq!(reimported.tag, "term");
        assert_eq!(reimported.time_slots(), calendar.time_slots());
        assert_eq!(triples(reimported.events()), expected);
        assert_eq!(reimported.to_json(), exported);
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();

        let events_path = dir.path().join("events.csv");
        let mut file = std::fs::File::create(&events_path).unwrap();
        writeln!(file, "Name,Start Time,End Time,Topic").unwrap();
        writeln!(file, "CS101,09:00,10:00,graphs").unwrap();
        drop(file);
        assert_eq!(load_events(&events_path).unwrap().len(), 1);

        let slots_path = dir.path().join("slots.txt");
        std::fs::write(&slots_path, "05:02:2023:09:00:00\n05:02:2023:11:00:00\n").unwrap();
        assert_eq!(load_time_slots(&slots_path, true).unwrap().len(), 2);

        let json_path = dir.path().join("events.json");
        std::fs::write(&json_path, r#"[{"Name": "x"}]"#).unwrap();
        assert_eq!(load_events(&json_path).unwrap()[0].tag, "x");
    }
}
