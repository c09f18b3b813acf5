use std::collections::HashMap;

use rand::Rng;
use tracing::{debug, warn};

use crate::calendar::Calendar;
use crate::error::Result;
use crate::event::Event;

use super::slot_utils::projected_end_time;

impl Calendar {
    /// Gives every event an independently drawn, uniformly random slot.
    /// Only `assigned_start_time` is touched; load the events afterwards.
    pub fn random_assign<R>(&self, events: &mut [Event], rng: &mut R) -> Result<()>
    where
        R: Rng + ?Sized,
    {
        self.require_slots()?;
        let slots = self.time_slots();

        for event in events.iter_mut() {
            let slot = &slots[rng.gen_range(0..slots.len())];
            event.assigned_start_time = Some(slot.clone());
        }

        debug!(calendar = %self.tag, events = events.len(), "Random assignment done");
        Ok(())
    }

    /// Spreads distinct original start times round-robin over the slots.
    ///
    /// The i-th distinct `start_time` (first-seen order) maps to slot
    /// `i % slot_count`, so events that asked for the same time share a slot.
    /// Events without a start time form one group of their own.
    pub fn start_time_assign(&self, events: &mut [Event]) -> Result<()> {
        self.require_slots()?;
        let slots = self.time_slots();

        let mut ranks: HashMap<Option<String>, usize> = HashMap::new();
        for event in events.iter_mut() {
            let next_rank = ranks.len();
            let rank = *ranks.entry(event.start_time.clone()).or_insert(next_rank);
            event.assigned_start_time = Some(slots[rank % slots.len()].clone());
        }

        debug!(calendar = %self.tag, distinct_starts = ranks.len(), "Start-time assignment done");
        Ok(())
    }

    /// Fills in missing assigned end times of loaded events by keeping the
    /// requested duration. Events whose times are not in slot format keep
    /// no end time. Returns how many were filled in.
    pub fn derive_end_times(&mut self) -> usize {
        let calendar = self.tag.clone();
        let mut derived = 0;
        for event in self.events_mut() {
            if event.assigned_end_time.is_some() {
                continue;
            }
            let projected = match (&event.start_time, &event.end_time, &event.assigned_start_time) {
                (Some(start), Some(end), Some(assigned)) => projected_end_time(start, end, assigned),
                _ => None,
            };
            match projected {
                Some(end) => {
                    event.assigned_end_time = Some(end);
                    derived += 1;
                }
                None => warn!(calendar = %calendar, tag = %event.tag, "Cannot derive an assigned end time"),
            }
        }
        derived
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::error::SchedulerError;

    fn calendar() -> Calendar {
        Calendar::new("term", vec!["T1".to_string(), "T2".to_string(), "T3".to_string()])
    }

    fn requested(tag: &str, start: &str) -> Event {
        Event::new(tag, Some(start.to_string()), None)
    }

    #[test]
    fn test_random_assign_uses_known_slots() {
        let calendar = calendar();
        let mut events: Vec<Event> = (0..50).map(|i| requested(&format!("e{i}"), "09:00")).collect();
        let mut rng = StdRng::seed_from_u64(7);

        calendar.random_assign(&mut events, &mut rng).unwrap();

        for event in &events {
            let slot = event.assigned_start_time.as_deref().unwrap();
            assert!(calendar.slot_index(slot).is_some());
        }
    }

    #[test]
    fn test_start_time_assign_round_robin() {
        let calendar = calendar();
        let mut events = vec![
            requested("a", "09:00"),
            requested("b", "10:00"),
            requested("c", "09:00"),
            requested("d", "11:00"),
            requested("e", "12:00"),
            Event::new("f", None, None),
        ];

        calendar.start_time_assign(&mut events).unwrap();

        let assigned: Vec<&str> = events.iter().map(|e| e.assigned_start_time.as_deref().unwrap()).collect();
        assert_eq!(assigned, vec!["T1", "T2", "T1", "T3", "T1", "T2"]);
    }

    #[test]
    fn test_derive_end_times_keeps_duration() {
        let mut calendar = Calendar::new("term", vec!["05:03:2023:13:00:00".to_string()]);
        let mut timed = Event::new(
            "a",
            Some("05:02:2023:09:00:00".to_string()),
            Some("05:02:2023:10:00:00".to_string()),
        );
        timed.assigned_start_time = Some("05:03:2023:13:00:00".to_string());
        let mut untimed = Event::new("b", None, None);
        untimed.assigned_start_time = Some("05:03:2023:13:00:00".to_string());
        calendar.load(vec![timed, untimed]);

        assert_eq!(calendar.derive_end_times(), 1);
        let ends: Vec<Option<&str>> = calendar.events().map(|e| e.assigned_end_time.as_deref()).collect();
        assert_eq!(ends, vec![Some("05:03:2023:14:00:00"), None]);
    }

    #[test]
    fn test_assignment_requires_slots() {
        let calendar = Calendar::new("empty", Vec::new());
        let mut events = vec![requested("a", "09:00")];
        let mut rng = StdRng::seed_from_u64(1);

        assert!(matches!(calendar.start_time_assign(&mut events), Err(SchedulerError::NoTimeSlots(_))));
        assert!(matches!(calendar.random_assign(&mut events, &mut rng), Err(SchedulerError::NoTimeSlots(_))));
        assert!(events[0].assigned_start_time.is_none());
    }
}
