use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::slot_utils::ClockTime;
use super::types::{ShiftTemplate, SlotDemand};
use crate::normalize::Booking;

/// Guides needed per booked tour in the slot view
const STAFF_PER_TOUR: usize = 2;

/// Finds a template whose name contains the tour type, or the other way
/// round, ignoring case
pub fn match_template<'a>(tour_type: &str, templates: &'a [ShiftTemplate]) -> Option<&'a ShiftTemplate> {
    let tour_type = tour_type.to_lowercase();
    templates.iter().find(|template| {
        let name = template.name.trim().to_lowercase();
        !name.is_empty() && (name.contains(&tour_type) || tour_type.contains(&name))
    })
}

/// Per-slot staff demand for CSV imports.
///
/// Bookings are counted per (date, time slot, tour type) with no spacing
/// rule or per-shift cap; each counts as one tour needing two guides.
/// Unknown tour types are left out.
pub fn aggregate_slot_demand(bookings: &[Booking], templates: &[ShiftTemplate]) -> Vec<SlotDemand> {
    let mut counts: BTreeMap<(NaiveDate, ClockTime, &str), usize> = BTreeMap::new();
    for booking in bookings.iter().filter(|b| b.is_classified()) {
        *counts
            .entry((booking.date, booking.time, booking.tour_type.as_str()))
            .or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|((date, time_slot, tour_type), tour_count)| SlotDemand {
            date,
            time_slot,
            tour_type: tour_type.to_string(),
            tour_count,
            required_staff: tour_count * STAFF_PER_TOUR,
            template_id: match_template(tour_type, templates).map(|t| t.id.clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(time: &str, tour_type: &str) -> Booking {
        Booking {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            time: time.parse().unwrap(),
            product: tour_type.to_string(),
            tour_type: tour_type.to_string(),
            guest_count: 2,
            customer_name: None,
            raw_source: String::new(),
        }
    }

    fn template(id: &str, name: &str) -> ShiftTemplate {
        ShiftTemplate {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_counts_per_slot_and_tour_type() {
        let bookings = vec![
            booking("9:15am", "Tree Tops Zipline Tour"),
            booking("9:15am", "Tree Tops Zipline Tour"),
            booking("10:00am", "Tree Tops Zipline Tour"),
            booking("9:15am", "Unknown"),
        ];
        let templates = vec![template("tpl-1", "TREE TOPS"), template("tpl-2", "Forest Flight")];

        let demand = aggregate_slot_demand(&bookings, &templates);
        assert_eq!(demand.len(), 2);
        assert_eq!(demand[0].time_slot.to_string(), "9:15am");
        assert_eq!(demand[0].tour_count, 2);
        assert_eq!(demand[0].required_staff, 4);
        assert_eq!(demand[0].template_id.as_deref(), Some("tpl-1"));
        assert_eq!(demand[1].tour_count, 1);
        assert_eq!(demand[1].required_staff, 2);
    }

    #[test]
    fn test_template_matching() {
        let templates = vec![template("blank", "  "), template("ff", "Forest Flight Zipline Tour (AM)")];
        assert_eq!(match_template("Forest Flight Zipline Tour", &templates).map(|t| t.id.as_str()), Some("ff"));
        assert!(match_template("Family Canopy Walk", &templates).is_none());
    }
}
