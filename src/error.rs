//! Error types for the scheduling engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Calendar {0} has no time slots")]
    NoTimeSlots(String),

    #[error("Invalid cluster count {0}: expected -1 or a positive number")]
    InvalidCenters(i64),

    #[error("Event {0} has no assigned start time")]
    MissingAssignedStart(String),

    #[error("Event {0} has no assigned end time")]
    MissingAssignedEnd(String),

    #[error("Unknown start policy: {0}")]
    UnknownStartPolicy(String),

    #[error("Unknown assignment strategy: {0}")]
    UnknownStrategy(String),

    #[error("Invalid event record: {0}")]
    InvalidRecord(String),

    #[error("Invalid time slot {slot:?}: {source}")]
    InvalidTimeSlot {
        slot: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
