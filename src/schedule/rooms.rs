use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, SchedulerError};
use crate::event::Event;

use super::slot_utils::{slot_time, SlotTime};

/// Events packed into rooms; a room is identified by its position
#[derive(Debug, Clone, Default)]
pub struct RoomSchedule {
    rooms: Vec<Vec<Event>>,
}

/// External name of the room at `index`
pub fn room_label(index: usize) -> String {
    format!("classroom{}", index)
}

impl RoomSchedule {
    pub fn rooms(&self) -> &[Vec<Event>] {
        &self.rooms
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room(&self, index: usize) -> Option<&[Event]> {
        self.rooms.get(index).map(Vec::as_slice)
    }

    /// Index of the room holding the event with `tag`
    pub fn room_of(&self, tag: &str) -> Option<usize> {
        self.rooms.iter().position(|room| room.iter().any(|e| e.tag == tag))
    }

    /// Rooms with their derived labels
    pub fn labelled(&self) -> impl Iterator<Item = (String, &[Event])> + '_ {
        self.rooms
            .iter()
            .enumerate()
            .map(|(index, room)| (room_label(index), room.as_slice()))
    }

    /// `{"classroom0": [event, ...], ...}`
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (label, room) in self.labelled() {
            map.insert(label, Value::Array(room.iter().map(Event::to_json).collect()));
        }
        Value::Object(map)
    }
}

/// Greedy interval partitioning.
///
/// Times in `SLOT_FORMAT` compare chronologically, other values as plain
/// strings. Events are taken by ascending assigned start (ties keep input order) and
/// each goes into the first room whose last event has ended by then; if
/// none has, a new room is opened. Intervals are half-open, so an event may
/// start exactly when the previous one in its room ends. Processing in
/// start order makes the room count equal the maximum overlap depth.
pub fn pack_rooms(events: &[Event]) -> Result<RoomSchedule> {
    let mut ordered: Vec<(SlotTime<'_>, SlotTime<'_>, &Event)> = Vec::with_capacity(events.len());
    for event in events {
        let start = event
            .assigned_start_time
            .as_deref()
            .ok_or_else(|| SchedulerError::MissingAssignedStart(event.tag.clone()))?;
        let end = event
            .assigned_end_time
            .as_deref()
            .ok_or_else(|| SchedulerError::MissingAssignedEnd(event.tag.clone()))?;
        ordered.push((slot_time(start), slot_time(end), event));
    }
    // Stable sort keeps collection order within one start time
    ordered.sort_by(|a, b| a.0.cmp(&b.0));

    let mut rooms: Vec<Vec<Event>> = Vec::new();
    let mut room_ends: Vec<SlotTime<'_>> = Vec::new();

    for (start, end, event) in ordered {
        match room_ends.iter().position(|last_end| *last_end <= start) {
            Some(index) => {
                rooms[index].push(event.clone());
                room_ends[index] = end;
            }
            None => {
                rooms.push(vec![event.clone()]);
                room_ends.push(end);
            }
        }
    }

    debug!(events = events.len(), rooms = rooms.len(), "Packed events into rooms");
    Ok(RoomSchedule { rooms })
}
