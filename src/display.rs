use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_json::Value;

use crate::calendar::Calendar;
use crate::error::Result;
use crate::event::Event;
use crate::schedule::RoomSchedule;

/// Formats an event as `tag (requested start-end)`
pub fn format_event(event: &Event) -> String {
    match (&event.start_time, &event.end_time) {
        (Some(start), Some(end)) => format!("{} ({}-{})", event.tag, start, end),
        (Some(start), None) => format!("{} ({})", event.tag, start),
        _ => event.tag.clone(),
    }
}

/// Writes a JSON export (calendar or room schedule) to a file, pretty-printed
pub fn write_json_to_file<P: AsRef<Path>>(value: &Value, path: P) -> Result<()> {
    let mut file = File::create(path)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    writeln!(file)?;
    Ok(())
}

/// Prints a calendar slot by slot
pub fn print_calendar(calendar: &Calendar) {
    println!("\n=== Calendar {} ===", calendar.tag);
    println!("Total events scheduled: {}", calendar.len());

    for (slot, events) in calendar.buckets() {
        if events.is_empty() {
            println!("  {} -> [EMPTY]", slot);
            continue;
        }
        let names: Vec<String> = events.iter().map(format_event).collect();
        println!("  {} -> {}", slot, names.join(", "));
    }
}

/// Prints rooms with their events in start order
pub fn print_rooms(schedule: &RoomSchedule) {
    println!("\n=== Rooms ({}) ===", schedule.room_count());

    for (label, events) in schedule.labelled() {
        println!("  {}:", label);
        for event in events {
            println!(
                "    {} - {} {}",
                event.assigned_start_time.as_deref().unwrap_or("?"),
                event.assigned_end_time.as_deref().unwrap_or("?"),
                event.tag
            );
        }
    }
}
