//! Booking-to-shift derivation for a tour operator's staff schedule.
//!
//! Raw booking data (a CSV export or an ICS feed) is parsed, classified
//! against the tour taxonomy, grouped by date and course, and partitioned
//! into shift candidates that the scheduling surface can staff.

pub mod config;
pub mod display;
pub mod error;
pub mod handoff;
pub mod import;
pub mod normalize;
pub mod parser;
pub mod schedule;
pub mod summary;
pub mod taxonomy;
pub mod web;

pub use error::ImportError;
pub use handoff::{hand_off, ImportNotice, ImportNotifier, LatestImport, ScheduleSink};
pub use import::{import_csv, import_ics, import_ics_feed, ImportOptions};
pub use normalize::Booking;
pub use schedule::{ShiftCandidate, ShiftTemplate, ShiftTour, SlotDemand};
pub use summary::{ImportResult, ImportSource};
pub use taxonomy::{Taxonomy, TourTypeConfig};
