use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::slot_utils::ClockTime;

/// One tour instance inside a shift
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTour {
    pub time: ClockTime,
    pub tour_type: String,
    pub guest_count: u32,
}

/// A proposed staffing block of same-course tours on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftCandidate {
    pub id: String,
    pub course: String,
    pub date: NaiveDate,
    pub tours: Vec<ShiftTour>,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub arrival_time: ClockTime,
    pub tour_count: usize,
    pub total_guests: u32,
    pub required_roles: Vec<String>,
    pub duration_hours: f64,
    /// role -> staff id, filled in by the scheduling surface
    pub assigned_staff: BTreeMap<String, String>,
}

/// An existing shift template the scheduling surface already knows about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTemplate {
    pub id: String,
    pub name: String,
}

/// Staff demand for one time slot and tour type (CSV imports)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDemand {
    pub date: NaiveDate,
    pub time_slot: ClockTime,
    pub tour_type: String,
    pub tour_count: usize,
    pub required_staff: usize,
    pub template_id: Option<String>,
}
