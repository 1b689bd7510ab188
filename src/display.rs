use crate::schedule::ShiftCandidate;
use crate::summary::ImportResult;

/// Formats a shift as one line: date, course, arrival, tour times and roles
pub fn format_shift_line(shift: &ShiftCandidate) -> String {
    let tour_times: Vec<String> = shift.tours.iter().map(|t| t.time.to_string()).collect();
    format!(
        "{} {:<14} arrive {:>7}  tours {:<28} {:>3} guests  {:>4.1}h  [{}]",
        shift.date,
        shift.course,
        shift.arrival_time.to_string(),
        tour_times.join(", "),
        shift.total_guests,
        shift.duration_hours,
        shift.required_roles.join(", ")
    )
}

/// Prints an import result in a readable format
pub fn print_import_summary(result: &ImportResult) {
    println!("\n=== {:?} Import ===", result.source);
    match &result.date_range {
        Some(range) if range.start == range.end => println!("Date: {}", range.start),
        Some(range) => println!("Dates: {} to {}", range.start, range.end),
        None => println!("No bookings found"),
    }
    println!(
        "Bookings: {}  Guests: {}  Tours: {}  Shifts: {}",
        result.total_bookings, result.total_guests, result.total_tours, result.total_shifts
    );

    if !result.unmatched.is_empty() {
        println!("⚠️  Unmatched products ({} booking(s)):", result.unmatched_bookings());
        for product in &result.unmatched {
            println!("  - {} ({} booking(s), {} guest(s))", product.product, product.bookings, product.guests);
        }
    }

    let skipped = &result.skipped;
    if skipped.total() > 0 {
        println!(
            "Skipped: {} incomplete, {} without guests, {} overnight stay(s)",
            skipped.incomplete, skipped.zero_guests, skipped.overnight_stays
        );
    }

    println!("\nShift candidates:");
    for shift in &result.shift_candidates {
        println!("  {}", format_shift_line(shift));
    }

    if !result.slot_demand.is_empty() {
        println!("\nStaff demand by slot:");
        for demand in &result.slot_demand {
            println!(
                "  {} {:>7} {:<32} tours {}  staff {}  template {}",
                demand.date,
                demand.time_slot.to_string(),
                demand.tour_type,
                demand.tour_count,
                demand.required_staff,
                demand.template_id.as_deref().unwrap_or("-")
            );
        }
    }
}
