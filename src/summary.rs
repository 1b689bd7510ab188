use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::normalize::Booking;
use crate::parser::SkipCounts;
use crate::schedule::{ShiftCandidate, SlotDemand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportSource {
    Csv,
    Ics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Bookings whose product matched no tour type, grouped by product text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedProduct {
    pub product: String,
    pub bookings: usize,
    pub guests: u32,
}

/// Everything one import run produced, handed to the scheduling surface as a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub source: ImportSource,
    pub generated_at: DateTime<Utc>,
    pub shift_candidates: Vec<ShiftCandidate>,
    pub total_shifts: usize,
    /// Accepted bookings, including unmatched ones
    pub total_bookings: usize,
    /// Tours across all shift candidates
    pub total_tours: usize,
    /// Guests across all accepted bookings, including unmatched ones
    pub total_guests: u32,
    pub date_range: Option<DateRange>,
    pub unmatched: Vec<UnmatchedProduct>,
    pub skipped: SkipCounts,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slot_demand: Vec<SlotDemand>,
}

impl ImportResult {
    pub fn unmatched_bookings(&self) -> usize {
        self.unmatched.iter().map(|u| u.bookings).sum()
    }

    pub fn to_json(&self) -> Result<String, ImportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the result as a JSON document for a consumer in another process
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ImportError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Aggregates one run's bookings and shift candidates into an `ImportResult`
pub fn summarize(
    source: ImportSource,
    bookings: &[Booking],
    shift_candidates: Vec<ShiftCandidate>,
    skipped: SkipCounts,
    slot_demand: Vec<SlotDemand>,
) -> ImportResult {
    let date_range = match (
        bookings.iter().map(|b| b.date).min(),
        bookings.iter().map(|b| b.date).max(),
    ) {
        (Some(start), Some(end)) => Some(DateRange { start, end }),
        _ => None,
    };

    let mut unmatched: BTreeMap<&str, UnmatchedProduct> = BTreeMap::new();
    for booking in bookings.iter().filter(|b| !b.is_classified()) {
        let entry = unmatched
            .entry(booking.product.as_str())
            .or_insert_with(|| UnmatchedProduct {
                product: booking.product.clone(),
                bookings: 0,
                guests: 0,
            });
        entry.bookings += 1;
        entry.guests = entry.guests.saturating_add(booking.guest_count);
    }

    ImportResult {
        source,
        generated_at: Utc::now(),
        total_shifts: shift_candidates.len(),
        total_bookings: bookings.len(),
        total_tours: shift_candidates.iter().map(|s| s.tour_count).sum(),
        total_guests: bookings
            .iter()
            .fold(0u32, |total, b| total.saturating_add(b.guest_count)),
        date_range,
        unmatched: unmatched.into_values().collect(),
        skipped,
        slot_demand,
        shift_candidates,
    }
}
