use serde_json::{Map, Value};
use tracing::warn;

/// Keys reserved by the event export format
pub const NAME_KEY: &str = "Name";
pub const START_TIME_KEY: &str = "Start Time";
pub const END_TIME_KEY: &str = "End Time";

/// A value merged into an event's notes: one string or a list of them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValue {
    One(String),
    Many(Vec<String>),
}

impl From<String> for NoteValue {
    fn from(value: String) -> Self {
        NoteValue::One(value)
    }
}

impl From<&str> for NoteValue {
    fn from(value: &str) -> Self {
        NoteValue::One(value.to_string())
    }
}

impl From<Vec<String>> for NoteValue {
    fn from(values: Vec<String>) -> Self {
        NoteValue::Many(values)
    }
}

impl From<Vec<&str>> for NoteValue {
    fn from(values: Vec<&str>) -> Self {
        NoteValue::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// An atomic schedulable unit.
///
/// `start_time`/`end_time` are what the caller asked for; the `assigned_*`
/// pair is filled in by the scheduling strategies. Timestamps are opaque
/// strings; room packing reads them as `SLOT_FORMAT` times when they parse.
#[derive(Debug, Clone)]
pub struct Event {
    pub tag: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub assigned_start_time: Option<String>,
    pub assigned_end_time: Option<String>,
    /// Note keys in the order they were first added
    pub notes: Vec<(String, Vec<String>)>,
}

impl Event {
    pub fn new(tag: impl Into<String>, start_time: Option<String>, end_time: Option<String>) -> Self {
        Self {
            tag: tag.into(),
            start_time,
            end_time,
            assigned_start_time: None,
            assigned_end_time: None,
            notes: Vec::new(),
        }
    }

    /// Sets the assigned times that are provided and merges `notes` in.
    /// A `None` time leaves any existing assignment alone.
    pub fn assign<K, V, I>(&mut self, start_time: Option<String>, end_time: Option<String>, notes: I)
    where
        K: Into<String>,
        V: Into<NoteValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        if let Some(start) = start_time {
            self.assigned_start_time = Some(start);
        }
        if let Some(end) = end_time {
            self.assigned_end_time = Some(end);
        }
        for (key, value) in notes {
            self.extend_note(key, value);
        }
    }

    /// Append-merge into `notes[key]`: a single value is pushed, a list is concatenated
    pub fn extend_note(&mut self, key: impl Into<String>, value: impl Into<NoteValue>) {
        let key = key.into();
        let index = match self.notes.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                self.notes.push((key, Vec::new()));
                self.notes.len() - 1
            }
        };
        let entry = &mut self.notes[index].1;
        match value.into() {
            NoteValue::One(v) => entry.push(v),
            NoteValue::Many(vs) => entry.extend(vs),
        }
    }

    pub fn note(&self, key: &str) -> Option<&[String]> {
        self.notes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn has_note(&self, key: &str) -> bool {
        self.notes.iter().any(|(k, _)| k == key)
    }

    /// Flat export: Name, Start Time, End Time plus one entry per note.
    /// Uses the original (requested) times, not the assigned ones.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(NAME_KEY.to_string(), Value::String(self.tag.clone()));
        map.insert(START_TIME_KEY.to_string(), optional_string(&self.start_time));
        map.insert(END_TIME_KEY.to_string(), optional_string(&self.end_time));

        for (key, values) in &self.notes {
            if is_reserved_key(key) {
                warn!(tag = %self.tag, key = %key, "Note shadows a reserved export key, skipping");
                continue;
            }
            let list = values.iter().cloned().map(Value::String).collect();
            map.insert(key.clone(), Value::Array(list));
        }

        Value::Object(map)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}

impl Eq for Event {}

pub fn is_reserved_key(key: &str) -> bool {
    key == NAME_KEY || key == START_TIME_KEY || key == END_TIME_KEY
}

fn optional_string(value: &Option<String>) -> Value {
    match value {
        Some(v) => Value::String(v.clone()),
        None => Value::Null,
    }
}
