use std::collections::HashSet;

use chrono::NaiveDateTime;
use tracing::warn;

use crate::error::{Result, SchedulerError};

/// Time slot layout accepted in strict mode: MM:DD:YYYY:HH:MM:SS
pub const SLOT_FORMAT: &str = "%m:%d:%Y:%H:%M:%S";

/// Index of the slot for the `position`-th event of a group that starts at
/// `start_index` and advances `shift` slots per event, wrapping around.
pub fn round_robin_index(start_index: usize, position: usize, shift: usize, slot_count: usize) -> usize {
    if slot_count == 0 {
        return 0;
    }
    // Reduce before multiplying so large shifts cannot overflow
    let step = (position % slot_count) * (shift % slot_count) % slot_count;
    (start_index % slot_count + step) % slot_count
}

/// Counts how many entries fall into each slot index.
/// Indexes outside `0..slot_count` are ignored.
pub fn calculate_slot_occupancy<I>(slot_indexes: I, slot_count: usize) -> Vec<usize>
where
    I: IntoIterator<Item = usize>,
{
    let mut occupancy = vec![0; slot_count];
    for index in slot_indexes {
        if let Some(count) = occupancy.get_mut(index) {
            *count += 1;
        }
    }
    occupancy
}

/// Index of the least occupied slot; the earliest one wins ties
pub fn emptiest_slot(occupancy: &[usize]) -> usize {
    occupancy
        .iter()
        .enumerate()
        .min_by_key(|(index, count)| (**count, *index))
        .map(|(index, _)| index)
        .unwrap_or(0)
}

/// Ordering key for a timestamp. Values in `SLOT_FORMAT` compare
/// chronologically; anything else falls back to plain string order and
/// sorts after every parsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SlotTime<'a> {
    Parsed(NaiveDateTime),
    Raw(&'a str),
}

pub fn slot_time(value: &str) -> SlotTime<'_> {
    match NaiveDateTime::parse_from_str(value, SLOT_FORMAT) {
        Ok(time) => SlotTime::Parsed(time),
        Err(_) => SlotTime::Raw(value),
    }
}

/// Checks a slot against `SLOT_FORMAT`
pub fn validate_time_slot(slot: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(slot, SLOT_FORMAT).map_err(|source| SchedulerError::InvalidTimeSlot {
        slot: slot.to_string(),
        source,
    })
}

/// Carries the requested duration (`end - start`) over to `assigned_start`.
/// All three have to be in `SLOT_FORMAT`.
pub fn projected_end_time(start: &str, end: &str, assigned_start: &str) -> Option<String> {
    let start = NaiveDateTime::parse_from_str(start, SLOT_FORMAT).ok()?;
    let end = NaiveDateTime::parse_from_str(end, SLOT_FORMAT).ok()?;
    let assigned = NaiveDateTime::parse_from_str(assigned_start, SLOT_FORMAT).ok()?;
    let projected = assigned.checked_add_signed(end - start)?;
    Some(projected.format(SLOT_FORMAT).to_string())
}

/// Parses newline-separated time slots.
///
/// Lines are trimmed, blank lines dropped and repeated slots kept once.
/// With `strict` set every slot has to match `SLOT_FORMAT`; otherwise
/// slots are treated as opaque labels.
pub fn parse_time_slots(text: &str, strict: bool) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut slots = Vec::new();

    for line in text.lines() {
        let slot = line.trim();
        if slot.is_empty() {
            continue;
        }
        if strict {
            validate_time_slot(slot)?;
        }
        if !seen.insert(slot.to_string()) {
            warn!(slot = %slot, "Duplicate time slot ignored");
            continue;
        }
        slots.push(slot.to_string());
    }

    Ok(slots)
}
