use super::types::ShiftTour;

/// Spacing limits for one course
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpacingRule {
    /// Minimum gap between two tours worked by the same crew
    pub min_gap_minutes: i32,
    /// Gap that counts as back-to-back: the next tour starts as the last one ends
    pub back_to_back_minutes: i32,
    pub max_tours: usize,
}

impl SpacingRule {
    /// Whether `next` may follow `last` in a shift that already holds
    /// `departures` distinct start times. A tour leaving at the same time as
    /// `last` is the same departure and always joins.
    pub fn allows(&self, last: &ShiftTour, next: &ShiftTour, departures: usize) -> bool {
        let gap = next.time.minutes_since(last.time);
        if gap == 0 {
            return true;
        }
        departures < self.max_tours && (gap == self.back_to_back_minutes || gap >= self.min_gap_minutes)
    }
}

/// Number of distinct start times in time-sorted tours
pub fn departure_count(tours: &[ShiftTour]) -> usize {
    let mut times: Vec<_> = tours.iter().map(|t| t.time).collect();
    times.dedup();
    times.len()
}

/// Splits one course's time-sorted tours into shifts, greedily.
///
/// A tour joins the open shift when the spacing rule allows it; otherwise
/// the open shift is closed and the tour starts a new one. Tours of
/// different types leaving together stay in one shift and count once
/// against the cap.
pub fn partition_tours(tours: &[ShiftTour], rule: &SpacingRule) -> Vec<Vec<ShiftTour>> {
    let mut shifts = Vec::new();
    let mut current: Vec<ShiftTour> = Vec::new();

    for tour in tours {
        let joins = match current.last() {
            None => true,
            Some(last) => rule.allows(last, tour, departure_count(&current)),
        };

        if !joins {
            shifts.push(std::mem::take(&mut current));
        }
        current.push(tour.clone());
    }

    if !current.is_empty() {
        shifts.push(current);
    }

    shifts
}
