pub mod types;
pub mod slot_utils;
pub mod grouping;
pub mod partition;
pub mod synthesis;
pub mod slot_demand;

pub use types::{ShiftCandidate, ShiftTemplate, ShiftTour, SlotDemand};
pub use slot_utils::ClockTime;
pub use synthesis::synthesize_shifts;
pub use slot_demand::aggregate_slot_demand;
