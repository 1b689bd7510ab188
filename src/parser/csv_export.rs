use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;

use super::{ParseOutcome, RawBooking};
use crate::error::ImportError;
use crate::schedule::ClockTime;

// Header fragments per logical column, most specific first. Matching is
// case-insensitive and by substring, so "Tour Start Time (local)" resolves.
const START_TIME_HEADERS: &[&str] = &["start time", "tour time", "time"];
const PRODUCT_HEADERS: &[&str] = &["product name", "product", "tour name", "activity"];
const GUEST_HEADERS: &[&str] = &["# guests", "guests", "pax", "participants"];
const CUSTOMER_HEADERS: &[&str] = &["customer name", "customer", "lead traveler", "name"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// Column indices resolved from the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvColumns {
    pub start_time: usize,
    pub product: usize,
    pub guests: usize,
    pub customer: Option<usize>,
}

/// Finds the first header containing any of the fragments, trying fragments in order
fn find_column(headers: &[String], fragments: &[&str], taken: &[usize]) -> Option<usize> {
    fragments.iter().find_map(|fragment| {
        headers
            .iter()
            .enumerate()
            .position(|(i, h)| !taken.contains(&i) && h.contains(fragment))
    })
}

/// Resolves the logical columns of a booking export from its header row.
///
/// Fails with `MissingColumns` if the start time, product name or guest
/// count column cannot be found. The customer name column is optional.
pub fn resolve_columns(headers: &StringRecord) -> Result<CsvColumns, ImportError> {
    let lowered: Vec<String> = headers
        .iter()
        .map(|h| h.trim().trim_matches('"').trim().to_lowercase())
        .collect();

    let start_time = find_column(&lowered, START_TIME_HEADERS, &[]);
    let product = find_column(&lowered, PRODUCT_HEADERS, &[]);
    let guests = find_column(&lowered, GUEST_HEADERS, &[]);

    let mut missing = Vec::new();
    if start_time.is_none() {
        missing.push("start time");
    }
    if product.is_none() {
        missing.push("product name");
    }
    if guests.is_none() {
        missing.push("# guests");
    }

    match (start_time, product, guests) {
        (Some(start_time), Some(product), Some(guests)) => {
            // "Product Name" also contains "name", so skip resolved columns
            let customer = find_column(&lowered, CUSTOMER_HEADERS, &[start_time, product, guests]);
            Ok(CsvColumns {
                start_time,
                product,
                guests,
                customer,
            })
        }
        _ => Err(ImportError::MissingColumns { missing }),
    }
}

/// Parses a guest count, returning 0 if empty or invalid
fn parse_guest_count(value: &str) -> u32 {
    value.trim().parse().unwrap_or(0)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value.trim(), format).ok())
}

/// Splits a start-time cell into an optional date and a time of day.
///
/// Handles `9:15am`, `2024-06-01 9:15am`, `06/01/2024 9:15 AM` and
/// `2024-06-01T09:15:00`.
pub fn split_start_field(value: &str) -> Option<(Option<NaiveDate>, ClockTime)> {
    let value = value.trim();

    if let Some((date_part, time_part)) = value.split_once('T') {
        if let Some(date) = parse_date(date_part) {
            let time_part = time_part.trim_end_matches('Z');
            return time_part.parse().ok().map(|time| (Some(date), time));
        }
    }

    let mut parts = value.splitn(2, char::is_whitespace);
    if let Some(first) = parts.next() {
        if let Some(date) = parse_date(first.trim_end_matches(',')) {
            let rest = parts.next().unwrap_or("").trim();
            return rest.parse().ok().map(|time| (Some(date), time));
        }
    }

    value.parse().ok().map(|time| (None, time))
}

/// Parses a tour-operator booking export.
///
/// The first line is the header. Each data line becomes a `RawBooking` when
/// it has a start time, a product and a positive guest count; other lines are
/// counted in `skipped`. Output order follows input order.
pub fn parse_csv_bookings(text: &str) -> Result<ParseOutcome, ImportError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = resolve_columns(&headers)?;

    let mut outcome = ParseOutcome::default();

    for (index, result) in reader.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = index + 2;

        let field = |col: usize| record.get(col).unwrap_or("").trim().trim_matches('"').trim();
        let start = field(columns.start_time);
        let product = field(columns.product);
        let guests = field(columns.guests);

        if record.iter().all(|f| f.is_empty()) {
            continue; // Blank line
        }

        if start.is_empty() || product.is_empty() {
            debug!("CSV line {}: missing start time or product, skipped", line);
            outcome.skipped.incomplete += 1;
            continue;
        }

        let guest_count = parse_guest_count(guests);
        if guest_count == 0 {
            debug!("CSV line {}: no confirmed guests for '{}', skipped", line, product);
            outcome.skipped.zero_guests += 1;
            continue;
        }

        let Some((date, time)) = split_start_field(start) else {
            debug!("CSV line {}: unreadable start time '{}', skipped", line, start);
            outcome.skipped.incomplete += 1;
            continue;
        };

        let customer_name = columns
            .customer
            .map(field)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        outcome.records.push(RawBooking {
            date,
            time,
            product: product.to_string(),
            guest_count,
            customer_name,
            raw_source: record.iter().collect::<Vec<_>>().join(","),
        });
    }

    Ok(outcome)
}
