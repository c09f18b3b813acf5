use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use fast_scheduler::parser::{calendar_from_json, parse_events_json};
use fast_scheduler::{pack_rooms, Calendar, ClusterConfig, ClusterOutcome, ClusterRequest, Event};

const EVENTS: &str = r#"[
    {"Name": "ALG1", "Start Time": "05:02:2023:09:00:00", "End Time": "05:02:2023:10:00:00", "Subject": "graph algorithms shortest paths"},
    {"Name": "ALG2", "Start Time": "05:02:2023:09:00:00", "End Time": "05:02:2023:11:00:00", "Subject": "graph algorithms spanning trees"},
    {"Name": "LIT1", "Start Time": "05:02:2023:13:00:00", "End Time": "05:02:2023:14:00:00", "Subject": "romantic poetry sonnets"},
    {"Name": "LIT2", "Start Time": "05:02:2023:15:00:00", "End Time": "05:02:2023:16:00:00", "Subject": "modern poetry sonnets"},
    {"Name": "GYM", "Start Time": "05:02:2023:15:00:00", "End Time": "05:02:2023:16:00:00", "Coach": "Dana"}
]"#;

fn slots() -> Vec<String> {
    ["05:03:2023:09:00:00", "05:03:2023:11:00:00", "05:03:2023:13:00:00"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn seeded_calendar() -> Calendar {
    let mut events = parse_events_json(EVENTS).unwrap();
    let mut calendar = Calendar::new("midterms", slots());
    calendar.start_time_assign(&mut events).unwrap();
    assert_eq!(calendar.load(events), 5);
    calendar
}

fn slot_by_tag(calendar: &Calendar) -> HashMap<String, String> {
    calendar
        .events()
        .map(|e| (e.tag.clone(), e.assigned_start_time.clone().unwrap()))
        .collect()
}

#[test]
fn start_time_assignment_shares_slots_for_shared_requests() {
    let calendar = seeded_calendar();
    let slots = slot_by_tag(&calendar);

    assert_eq!(slots["ALG1"], slots["ALG2"]);
    assert_eq!(slots["LIT2"], slots["GYM"]);
    assert_eq!(slots["ALG1"], "05:03:2023:09:00:00");
    assert_eq!(slots["LIT1"], "05:03:2023:11:00:00");
    assert_eq!(slots["LIT2"], "05:03:2023:13:00:00");
}

#[test]
fn clustering_moves_only_relevant_events() {
    let mut calendar = seeded_calendar();
    let mut rng = StdRng::seed_from_u64(2024);

    let request = ClusterRequest::new("Subject")
        .with_shift(0)
        .with_start("emptiest")
        .with_centers(2)
        .with_config(ClusterConfig::default());
    let outcome = calendar.cluster(&request, &mut rng).unwrap();

    let ClusterOutcome::Assigned(summary) = outcome else {
        panic!("request should not be rejected");
    };
    assert_eq!(summary.relevant, 4);
    assert_eq!(summary.reloaded, 4);

    let slots = slot_by_tag(&calendar);
    assert_eq!(slots["GYM"], "05:03:2023:13:00:00");
    assert_eq!(slots["ALG1"], slots["ALG2"]);
    assert_eq!(slots["LIT1"], slots["LIT2"]);
    assert_ne!(slots["ALG1"], slots["LIT1"]);
    assert_eq!(calendar.len(), 5);
}

#[test]
fn rooms_follow_derived_end_times() {
    let mut calendar = seeded_calendar();
    assert_eq!(calendar.derive_end_times(), 5);

    let schedule = calendar.heuristics().unwrap();
    // ALG1 and ALG2 overlap at 09:00, LIT1 fits after ALG1, LIT2 and GYM overlap at 13:00
    assert_eq!(schedule.room_count(), 2);
    assert_ne!(schedule.room_of("ALG1"), schedule.room_of("ALG2"));
    assert_ne!(schedule.room_of("LIT2"), schedule.room_of("GYM"));

    let json = schedule.to_json();
    assert!(json.get("classroom0").is_some());
    assert!(json.get("classroom1").is_some());
    assert!(json.get("classroom2").is_none());
}

#[test]
fn rooms_across_new_year_use_chronological_order() {
    let mut events = parse_events_json(
        r#"[
            {"Name": "late", "Start Time": "12:31:2023:20:00:00", "End Time": "12:31:2023:22:00:00"},
            {"Name": "short", "Start Time": "12:31:2023:21:00:00", "End Time": "12:31:2023:21:15:00"}
        ]"#,
    )
    .unwrap();
    let mut calendar = Calendar::new(
        "new-year",
        vec!["12:31:2023:23:00:00".to_string(), "12:31:2023:23:30:00".to_string()],
    );
    calendar.start_time_assign(&mut events).unwrap();
    calendar.load(events);
    assert_eq!(calendar.derive_end_times(), 2);

    let schedule = calendar.heuristics().unwrap();
    // "late" runs until 01:00 on the next day, so "short" cannot share its room
    assert_eq!(schedule.room_count(), 2);
    assert_ne!(schedule.room_of("late"), schedule.room_of("short"));
}

#[test]
fn export_reimport_round_trip() {
    let calendar = seeded_calendar();
    let exported = calendar.to_json();

    let reimported = calendar_from_json(&exported).unwrap();
    assert_eq!(reimported.to_json(), exported);

    let original = parse_events_json(EVENTS).unwrap();
    for event in &original {
        let copy = reimported.events().find(|e| *e == event).unwrap();
        assert_eq!(copy.start_time, event.start_time);
        assert_eq!(copy.end_time, event.end_time);
        assert_eq!(copy.notes, event.notes);
    }
}

#[test]
fn pack_rooms_on_plain_events() {
    let timed = |tag: &str, start: &str, end: &str| {
        let mut event = Event::new(tag, None, None);
        event.assign(Some(start.to_string()), Some(end.to_string()), Vec::<(String, String)>::new());
        event
    };
    let events = vec![
        timed("A", "10:00", "10:30"),
        timed("B", "10:00", "10:30"),
        timed("C", "10:30", "11:00"),
    ];

    let schedule = pack_rooms(&events).unwrap();
    assert_eq!(schedule.room_count(), 2);
    assert_eq!(schedule.room_of("A"), schedule.room_of("C"));
}
