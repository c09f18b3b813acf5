pub mod types;
pub mod slot_utils;
pub mod assign;
pub mod similarity;
pub mod rooms;

pub use types::{AssignmentStrategy, ClusterOutcome, ClusterRequest, ClusterSummary, Objective, StartPolicy, AUTO_CENTERS};
pub use slot_utils::parse_time_slots;
pub use rooms::{pack_rooms, room_label, RoomSchedule};
