pub mod csv_export;
pub mod feed;
pub mod ics;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schedule::ClockTime;

pub use csv_export::parse_csv_bookings;
pub use feed::fetch_feed;
pub use ics::parse_ics_bookings;

/// One accepted record from a booking source, before classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBooking {
    /// `None` when the source row carried only a time of day
    pub date: Option<NaiveDate>,
    pub time: ClockTime,
    pub product: String,
    pub guest_count: u32,
    pub customer_name: Option<String>,
    pub raw_source: String,
}

/// Records a parser dropped without failing the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipCounts {
    /// Missing time/product/summary/start/description, or unparseable time
    pub incomplete: usize,
    /// Guest count absent or zero
    pub zero_guests: usize,
    /// Treehouse Adventures overnight stays
    pub overnight_stays: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.incomplete + self.zero_guests + self.overnight_stays
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub records: Vec<RawBooking>,
    pub skipped: SkipCounts,
}
