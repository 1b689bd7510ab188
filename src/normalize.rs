use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::parser::RawBooking;
use crate::schedule::ClockTime;
use crate::taxonomy::{Taxonomy, UNKNOWN_TOUR_TYPE};

/// A classified booking, ready for grouping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub date: NaiveDate,
    pub time: ClockTime,
    /// Product text as it appeared in the source
    pub product: String,
    /// Canonical tour type, or "Unknown"
    pub tour_type: String,
    pub guest_count: u32,
    pub customer_name: Option<String>,
    pub raw_source: String,
}

impl Booking {
    pub fn is_classified(&self) -> bool {
        self.tour_type != UNKNOWN_TOUR_TYPE
    }
}

/// Attaches a canonical tour type to every parsed record.
///
/// Records without a date of their own get `default_date`. Unknown products
/// are kept (as "Unknown") so they still show up in the import totals.
pub fn normalize_bookings(records: Vec<RawBooking>, taxonomy: &Taxonomy, default_date: NaiveDate) -> Vec<Booking> {
    records
        .into_iter()
        .map(|record| {
            let tour_type = match taxonomy.classify(&record.product) {
                Some(name) => name.to_string(),
                None => {
                    debug!("No tour type matches '{}'", record.product);
                    UNKNOWN_TOUR_TYPE.to_string()
                }
            };
            Booking {
                date: record.date.unwrap_or(default_date),
                time: record.time,
                product: record.product,
                tour_type,
                guest_count: record.guest_count,
                customer_name: record.customer_name,
                raw_source: record.raw_source,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: Option<NaiveDate>, product: &str) -> RawBooking {
        RawBooking {
            date,
            time: ClockTime::from_hm(9, 15).unwrap(),
            product: product.to_string(),
            guest_count: 2,
            customer_name: Some("Grace".to_string()),
            raw_source: product.to_string(),
        }
    }

    #[test]
    fn test_classifies_and_fills_missing_dates() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let june_first = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let june_second = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();

        let bookings = normalize_bookings(
            vec![
                raw(Some(june_second), "Tree Tops Zipline Tour - Adult"),
                raw(None, "Sunset Kayak Tour"),
            ],
            &taxonomy,
            june_first,
        );

        assert_eq!(bookings[0].tour_type, "Tree Tops Zipline Tour");
        assert_eq!(bookings[0].date, june_second);
        assert!(bookings[0].is_classified());

        assert_eq!(bookings[1].tour_type, UNKNOWN_TOUR_TYPE);
        assert_eq!(bookings[1].date, june_first);
        assert!(!bookings[1].is_classified());
        assert_eq!(bookings[1].customer_name.as_deref(), Some("Grace"));
    }
}
