use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Result, SchedulerError};
use crate::event::Event;
use crate::schedule::rooms::{pack_rooms, RoomSchedule};

pub const CALENDAR_NAME_KEY: &str = "Name";
pub const CALENDAR_SLOTS_KEY: &str = "Time Slots";

/// Events bucketed by the time slot they are assigned to.
///
/// Every entry of `time_slots` has a bucket (possibly empty) for the whole
/// lifetime of the calendar, and no bucket exists for a slot outside it.
#[derive(Debug, Clone)]
pub struct Calendar {
    pub tag: String,
    time_slots: Vec<String>,
    events: HashMap<String, Vec<Event>>,
}

impl Calendar {
    /// Creates an empty calendar. Repeated slots are collapsed, first occurrence wins.
    pub fn new(tag: impl Into<String>, time_slots: Vec<String>) -> Self {
        let tag = tag.into();
        let mut seen = HashSet::new();
        let mut slots = Vec::with_capacity(time_slots.len());
        for slot in time_slots {
            if seen.insert(slot.clone()) {
                slots.push(slot);
            } else {
                warn!(calendar = %tag, slot = %slot, "Duplicate time slot ignored");
            }
        }

        let events = slots.iter().map(|s| (s.clone(), Vec::new())).collect();
        Self {
            tag,
            time_slots: slots,
            events,
        }
    }

    pub fn time_slots(&self) -> &[String] {
        &self.time_slots
    }

    /// Position of `slot` within `time_slots`
    pub fn slot_index(&self, slot: &str) -> Option<usize> {
        self.time_slots.iter().position(|s| s == slot)
    }

    /// Events currently bucketed at `slot` (empty for unknown slots)
    pub fn events_at(&self, slot: &str) -> &[Event] {
        self.events.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Buckets in time-slot order
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &[Event])> + '_ {
        self.time_slots
            .iter()
            .map(move |slot| (slot.as_str(), self.events_at(slot)))
    }

    /// All loaded events, in time-slot order then load order
    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.buckets().flat_map(|(_, events)| events.iter())
    }

    pub fn len(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hard precondition for every assignment strategy
    pub fn require_slots(&self) -> Result<()> {
        if self.time_slots.is_empty() {
            return Err(SchedulerError::NoTimeSlots(self.tag.clone()));
        }
        Ok(())
    }

    /// Buckets each event under its assigned start time.
    ///
    /// Events without an assigned start time, or assigned to a slot this
    /// calendar does not know, are skipped with a warning. Returns how many
    /// were loaded; no de-duplication is performed.
    pub fn load<I>(&mut self, events: I) -> usize
    where
        I: IntoIterator<Item = Event>,
    {
        let mut loaded = 0;
        for event in events {
            let Some(slot) = event.assigned_start_time.clone() else {
                warn!(calendar = %self.tag, tag = %event.tag, "Event does not have an assigned start time");
                continue;
            };
            match self.events.get_mut(&slot) {
                Some(bucket) => {
                    bucket.push(event);
                    loaded += 1;
                }
                None => {
                    warn!(calendar = %self.tag, tag = %event.tag, slot = %slot, "Event assigned to an unknown time slot");
                }
            }
        }
        debug!(calendar = %self.tag, loaded, "Loaded events");
        loaded
    }

    /// Removes the first bucketed instance (by tag) of each requested event.
    /// Events that are not loaded are ignored. Returns the removed events.
    pub fn remove(&mut self, events: &[Event]) -> Vec<Event> {
        let mut removed = Vec::new();
        for target in events {
            for slot in &self.time_slots {
                let Some(bucket) = self.events.get_mut(slot) else {
                    continue;
                };
                if let Some(pos) = bucket.iter().position(|e| e == target) {
                    removed.push(bucket.remove(pos));
                    break;
                }
            }
        }
        removed
    }

    /// Mutable access to loaded events, in time-slot order then load order.
    /// Callers must not change `assigned_start_time`, which decides the bucket.
    pub(crate) fn events_mut(&mut self) -> impl Iterator<Item = &mut Event> + '_ {
        let slots = &self.time_slots;
        let mut buckets: Vec<(usize, &mut Vec<Event>)> = self
            .events
            .iter_mut()
            .filter_map(|(slot, bucket)| slots.iter().position(|s| s == slot).map(|index| (index, bucket)))
            .collect();
        buckets.sort_by_key(|(index, _)| *index);
        buckets.into_iter().flat_map(|(_, bucket)| bucket.iter_mut())
    }

    /// Takes every loaded event matching `predicate` out of its bucket,
    /// keeping time-slot order.
    pub(crate) fn take_where<F>(&mut self, predicate: F) -> Vec<Event>
    where
        F: Fn(&Event) -> bool,
    {
        let mut taken = Vec::new();
        for slot in &self.time_slots {
            if let Some(bucket) = self.events.get_mut(slot) {
                let (matching, rest): (Vec<Event>, Vec<Event>) =
                    bucket.drain(..).partition(|e| predicate(e));
                *bucket = rest;
                taken.extend(matching);
            }
        }
        taken
    }

    /// Packs the loaded events into non-overlapping rooms
    pub fn heuristics(&self) -> Result<RoomSchedule> {
        let events: Vec<Event> = self.events().cloned().collect();
        pack_rooms(&events)
    }

    /// `{"Name": tag, "Time Slots": {slot: [event, ...], ...}}` in slot order
    pub fn to_json(&self) -> Value {
        let mut slots = Map::new();
        for (slot, events) in self.buckets() {
            let list = events.iter().map(Event::to_json).collect();
            slots.insert(slot.to_string(), Value::Array(list));
        }

        let mut map = Map::new();
        map.insert(CALENDAR_NAME_KEY.to_string(), Value::String(self.tag.clone()));
        map.insert(CALENDAR_SLOTS_KEY.to_string(), Value::Object(slots));
        Value::Object(map)
    }
}
