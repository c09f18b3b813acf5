//! Event scheduling engine.
//!
//! Events are assigned to a calendar's time slots (randomly, round-robin by
//! requested start time, or by text similarity of one of their notes) and
//! can then be packed into the fewest non-overlapping rooms.

pub mod calendar;
pub mod cluster;
pub mod config;
pub mod display;
pub mod error;
pub mod event;
pub mod parser;
pub mod schedule;

pub use calendar::Calendar;
pub use config::ClusterConfig;
pub use error::{Result, SchedulerError};
pub use event::{Event, NoteValue};
pub use schedule::{
    pack_rooms, AssignmentStrategy, ClusterOutcome, ClusterRequest, ClusterSummary, Objective, RoomSchedule, StartPolicy,
    AUTO_CENTERS,
};
