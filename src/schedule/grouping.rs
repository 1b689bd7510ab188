use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::slot_utils::ClockTime;
use super::types::ShiftTour;
use crate::normalize::Booking;
use crate::taxonomy::Taxonomy;

/// Staffing parameters shared by every tour of a course on one day
#[derive(Debug, Clone, PartialEq)]
pub struct CourseProfile {
    pub roles: Vec<String>,
    pub hours_per_tour: f64,
    pub max_tours: usize,
}

impl CourseProfile {
    pub fn tour_minutes(&self) -> i32 {
        (self.hours_per_tour * 60.0).round() as i32
    }
}

/// All tours of one course on one date, sorted by start time
#[derive(Debug, Clone, PartialEq)]
pub struct CourseDay {
    pub date: NaiveDate,
    pub course: String,
    pub tours: Vec<ShiftTour>,
    pub profile: CourseProfile,
}

/// Groups classified bookings by date and course.
///
/// Bookings sharing a date, course, time and tour type are the same tour, so
/// their guests are summed (saturating). Tours come out ordered by minutes
/// since midnight, ties broken by tour type. Unknown tour types are ignored.
pub fn group_tours(bookings: &[Booking], taxonomy: &Taxonomy) -> Vec<CourseDay> {
    // (date, course) -> (time, tour type) -> guests
    let mut groups: BTreeMap<(NaiveDate, String), BTreeMap<(ClockTime, String), u32>> = BTreeMap::new();

    for booking in bookings {
        let Some(config) = taxonomy.get(&booking.tour_type) else {
            continue;
        };
        let guests = groups
            .entry((booking.date, config.course.clone()))
            .or_default()
            .entry((booking.time, booking.tour_type.clone()))
            .or_insert(0);
        *guests = guests.saturating_add(booking.guest_count);
    }

    groups
        .into_iter()
        .filter_map(|((date, course), slots)| {
            let tours: Vec<ShiftTour> = slots
                .into_iter()
                .map(|((time, tour_type), guest_count)| ShiftTour {
                    time,
                    tour_type,
                    guest_count,
                })
                .collect();
            let profile = course_profile(&tours, taxonomy)?;
            Some(CourseDay {
                date,
                course,
                tours,
                profile,
            })
        })
        .collect()
}

/// The most demanding settings among the tour types present: longest tour,
/// smallest per-shift cap. Roles come from the first tour type.
fn course_profile(tours: &[ShiftTour], taxonomy: &Taxonomy) -> Option<CourseProfile> {
    let mut configs = tours.iter().filter_map(|t| taxonomy.get(&t.tour_type));
    let first = configs.next()?;

    let mut profile = CourseProfile {
        roles: first.roles.clone(),
        hours_per_tour: first.duration_hours_per_tour,
        max_tours: first.max_tours_per_guide_per_shift,
    };
    for config in configs {
        profile.hours_per_tour = profile.hours_per_tour.max(config.duration_hours_per_tour);
        profile.max_tours = profile.max_tours.min(config.max_tours_per_guide_per_shift);
    }
    Some(profile)
}
