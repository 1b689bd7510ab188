use std::collections::BTreeMap;

use chrono::NaiveDate;
use rand::Rng;

use super::grouping::{group_tours, CourseProfile};
use super::partition::{departure_count, partition_tours, SpacingRule};
use super::types::{ShiftCandidate, ShiftTour};
use crate::normalize::Booking;
use crate::taxonomy::{SynthesisRules, Taxonomy};

/// Derives shift candidates from classified bookings.
///
/// Each course on each date is partitioned on its own, so a shift never mixes
/// courses. Unknown tour types produce nothing.
pub fn synthesize_shifts(bookings: &[Booking], taxonomy: &Taxonomy) -> Vec<ShiftCandidate> {
    let rules = taxonomy.rules();
    let mut shifts = Vec::new();

    for day in group_tours(bookings, taxonomy) {
        let rule = SpacingRule {
            min_gap_minutes: rules.min_gap_minutes as i32,
            back_to_back_minutes: day.profile.tour_minutes(),
            max_tours: day.profile.max_tours,
        };
        for tours in partition_tours(&day.tours, &rule) {
            if let Some(shift) = build_shift(day.date, &day.course, tours, &day.profile, rules) {
                shifts.push(shift);
            }
        }
    }

    shifts
}

/// Builds the shift record for one partition. `None` for an empty partition.
pub fn build_shift(
    date: NaiveDate,
    course: &str,
    tours: Vec<ShiftTour>,
    profile: &CourseProfile,
    rules: &SynthesisRules,
) -> Option<ShiftCandidate> {
    let first = tours.first()?.time;
    let last = tours.last()?.time;
    // Tours of different types leaving together are one departure
    let tour_count = departure_count(&tours);

    // A single departure needs only the lead
    let required_roles = if tour_count == 1 {
        profile.roles.iter().take(1).cloned().collect()
    } else {
        profile.roles.clone()
    };

    Some(ShiftCandidate {
        id: shift_id(date, course, first.minutes()),
        course: course.to_string(),
        date,
        start_time: first,
        end_time: last,
        arrival_time: first.offset(-(rules.arrival_lead_minutes as i32)),
        tour_count,
        total_guests: tours.iter().fold(0u32, |total, t| total.saturating_add(t.guest_count)),
        required_roles,
        duration_hours: profile.hours_per_tour * tour_count as f64,
        assigned_staff: BTreeMap::new(),
        tours,
    })
}

fn shift_id(date: NaiveDate, course: &str, start_minutes: u16) -> String {
    let slug: String = course
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let suffix: u32 = rand::thread_rng().gen();
    format!("shift-{}-{}-{:04}-{:08x}", date.format("%Y%m%d"), slug, start_minutes, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ClockTime;

    fn booking(time: &str, tour_type: &str, guests: u32) -> Booking {
        Booking {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            time: time.parse().unwrap(),
            product: tour_type.to_string(),
            tour_type: tour_type.to_string(),
            guest_count: guests,
            customer_name: None,
            raw_source: String::new(),
        }
    }

    #[test]
    fn test_three_tour_shift_record() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let bookings = vec![
            booking("9:15am", "Tree Tops Zipline Tour", 4),
            booking("11:45am", "Tree Tops Zipline Tour", 2),
            booking("3:00pm", "Tree Tops Treehouse Options", 1),
        ];

        let shifts = synthesize_shifts(&bookings, &taxonomy);
        assert_eq!(shifts.len(), 1);
        let shift = &shifts[0];
        assert_eq!(shift.course, "Tree Tops");
        assert_eq!(shift.tour_count, 3);
        assert_eq!(shift.total_guests, 7);
        assert_eq!(shift.start_time.to_string(), "9:15am");
        assert_eq!(shift.end_time.to_string(), "3:00pm");
        assert_eq!(shift.arrival_time.to_string(), "9:00am");
        assert_eq!(shift.required_roles, vec!["Lead Guide", "Sweep Guide"]);
        assert_eq!(shift.duration_hours, 7.5);
        assert!(shift.assigned_staff.is_empty());
        assert!(shift.id.starts_with("shift-20240601-tree-tops-0555-"));
    }

    #[test]
    fn test_single_tour_needs_only_lead() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let shifts = synthesize_shifts(&[booking("12:10am", "Night Zipline Tour", 2)], &taxonomy);
        assert_eq!(shifts[0].required_roles, vec!["Lead Guide"]);
        assert_eq!(shifts[0].duration_hours, 2.5);
        // Arrival wraps to the previous evening's clock
        assert_eq!(shifts[0].arrival_time, ClockTime::from_hm(23, 55).unwrap());
    }

    #[test]
    fn test_courses_never_mix() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let bookings = vec![
            booking("9:15am", "Tree Tops Zipline Tour", 2),
            booking("11:45am", "Forest Flight Zipline Tour", 2),
            booking("3:00pm", "Tree Tops Zipline Tour", 2),
        ];
        let shifts = synthesize_shifts(&bookings, &taxonomy);
        assert_eq!(shifts.len(), 2);
        for shift in &shifts {
            let course = &taxonomy.get(&shift.tours[0].tour_type).unwrap().course;
            assert!(shift
                .tours
                .iter()
                .all(|t| &taxonomy.get(&t.tour_type).unwrap().course == course));
        }
    }

    #[test]
    fn test_variant_at_same_time_is_one_departure() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let bookings = vec![
            booking("9:15am", "Tree Tops Zipline Tour", 4),
            booking("9:15am", "Tree Tops Treehouse Options", 2),
        ];

        let shifts = synthesize_shifts(&bookings, &taxonomy);
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].tours.len(), 2);
        assert_eq!(shifts[0].tour_count, 1);
        assert_eq!(shifts[0].total_guests, 6);
        assert_eq!(shifts[0].required_roles, vec!["Lead Guide"]);
        assert_eq!(shifts[0].duration_hours, 2.5);
    }

    #[test]
    fn test_guest_totals_saturate() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let bookings = vec![
            booking("9:15am", "Tree Tops Zipline Tour", u32::MAX - 1),
            booking("9:15am", "Tree Tops Treehouse Options", 5),
        ];
        let shifts = synthesize_shifts(&bookings, &taxonomy);
        assert_eq!(shifts[0].total_guests, u32::MAX);
    }

    #[test]
    fn test_ids_are_unique() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let bookings = vec![booking("9:15am", "Tree Tops Zipline Tour", 2)];
        let a = synthesize_shifts(&bookings, &taxonomy);
        let b = synthesize_shifts(&bookings, &taxonomy);
        assert_ne!(a[0].id, b[0].id);
        assert_eq!(a[0].tours, b[0].tours);
    }
}
