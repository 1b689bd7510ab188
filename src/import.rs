use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use log::info;

use crate::error::ImportError;
use crate::normalize::normalize_bookings;
use crate::parser::{fetch_feed, parse_csv_bookings, parse_ics_bookings, ParseOutcome};
use crate::schedule::{aggregate_slot_demand, synthesize_shifts, ShiftTemplate};
use crate::summary::{summarize, ImportResult, ImportSource};
use crate::taxonomy::Taxonomy;

/// Per-run inputs that are not part of the booking data itself
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Local timezone for UTC feed times and for "today"
    pub timezone: Tz,
    /// Date for CSV rows whose start time has no date; today when unset
    pub default_date: Option<NaiveDate>,
    /// Existing templates matched against CSV slot demand
    pub shift_templates: Vec<ShiftTemplate>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            timezone: Tz::UTC,
            default_date: None,
            shift_templates: Vec::new(),
        }
    }
}

impl ImportOptions {
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_default_date(mut self, date: NaiveDate) -> Self {
        self.default_date = Some(date);
        self
    }

    pub fn with_shift_templates(mut self, templates: Vec<ShiftTemplate>) -> Self {
        self.shift_templates = templates;
        self
    }

    fn resolve_default_date(&self) -> NaiveDate {
        self.default_date
            .unwrap_or_else(|| Utc::now().with_timezone(&self.timezone).date_naive())
    }
}

/// Runs a CSV booking export through the engine.
///
/// Fails only when the header lacks a required column or the text is not
/// readable CSV.
pub fn import_csv(text: &str, taxonomy: &Taxonomy, options: &ImportOptions) -> Result<ImportResult, ImportError> {
    let outcome = parse_csv_bookings(text)?;
    Ok(run(ImportSource::Csv, outcome, taxonomy, options))
}

/// Runs an already-fetched ICS feed through the engine
pub fn import_ics(text: &str, taxonomy: &Taxonomy, options: &ImportOptions) -> ImportResult {
    let outcome = parse_ics_bookings(text, &options.timezone);
    run(ImportSource::Ics, outcome, taxonomy, options)
}

/// Fetches an ICS feed and imports it. A failed fetch aborts before parsing.
pub async fn import_ics_feed(
    client: &reqwest::Client,
    url: &str,
    taxonomy: &Taxonomy,
    options: &ImportOptions,
) -> Result<ImportResult, ImportError> {
    let text = fetch_feed(client, url).await?;
    Ok(import_ics(&text, taxonomy, options))
}

fn run(source: ImportSource, outcome: ParseOutcome, taxonomy: &Taxonomy, options: &ImportOptions) -> ImportResult {
    let bookings = normalize_bookings(outcome.records, taxonomy, options.resolve_default_date());
    let shifts = synthesize_shifts(&bookings, taxonomy);

    let slot_demand = match source {
        ImportSource::Csv => aggregate_slot_demand(&bookings, &options.shift_templates),
        ImportSource::Ics => Vec::new(),
    };

    let result = summarize(source, &bookings, shifts, outcome.skipped, slot_demand);
    info!(
        "{:?} import: {} booking(s), {} guest(s), {} tour(s) in {} shift(s); {} unmatched, {} skipped",
        source,
        result.total_bookings,
        result.total_guests,
        result.total_tours,
        result.total_shifts,
        result.unmatched_bookings(),
        result.skipped.total()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_rows_without_dates_use_default_date() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        let options = ImportOptions::default().with_default_date(date);

        let csv = "Start Time,Product Name,# Guests\n9:15am,Tree Tops Zipline Tour,2\n";
        let result = import_csv(csv, &taxonomy, &options).unwrap();
        assert_eq!(result.shift_candidates[0].date, date);
        assert_eq!(result.slot_demand.len(), 1);
        assert_eq!(result.slot_demand[0].required_staff, 2);
    }

    #[test]
    fn test_csv_missing_columns_aborts() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let err = import_csv("Product Name,# Guests\nX,1\n", &taxonomy, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumns { .. }));
    }

    #[test]
    fn test_ics_has_no_slot_demand() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let feed = "BEGIN:VEVENT\nSUMMARY:Tree Tops Zipline Tour\nDTSTART:20240601T161500Z\nDESCRIPTION:1x Guest(s)\nEND:VEVENT\n";
        let result = import_ics(feed, &taxonomy, &ImportOptions::default());
        assert_eq!(result.source, ImportSource::Ics);
        assert_eq!(result.total_shifts, 1);
        assert!(result.slot_demand.is_empty());
        // UTC timezone leaves the clock untouched
        assert_eq!(result.shift_candidates[0].start_time.to_string(), "4:15pm");
    }
}
