use std::ops::Range;
use std::sync::OnceLock;

use chrono::{NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use log::{debug, warn};
use regex::Regex;

use super::{ParseOutcome, RawBooking};
use crate::schedule::ClockTime;
use crate::taxonomy::{is_overnight_stay, reclassify_variant};

/// Properties collected between BEGIN:VEVENT and END:VEVENT
#[derive(Debug, Default, Clone)]
struct EventFields {
    summary: Option<String>,
    dtstart: Option<String>,
    dtstart_tzid: Option<String>,
    dtend: Option<String>,
    description: Option<String>,
}

fn guest_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // "2x Guest(s)", tolerant of whitespace left behind by line wrapping
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\s*x\s*Guest\s*\(\s*s\s*\)").expect("guest pattern is valid"))
}

fn property_start() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9-]*)[;:]").expect("property pattern is valid"))
}

// Component and property names a booking feed emits
const KNOWN_PROPERTIES: &[&str] = &[
    "ACTION", "ATTACH", "ATTENDEE", "BEGIN", "CALSCALE", "CATEGORIES", "CLASS", "COLOR", "COMMENT", "COMPLETED",
    "CONFERENCE", "CONTACT", "CREATED", "DESCRIPTION", "DTEND", "DTSTAMP", "DTSTART", "DUE", "DURATION", "END",
    "EXDATE", "EXRULE", "FREEBUSY", "GEO", "IMAGE", "LAST-MODIFIED", "LOCATION", "METHOD", "ORGANIZER",
    "PERCENT-COMPLETE", "PRIORITY", "PRODID", "RDATE", "RECURRENCE-ID", "REFRESH-INTERVAL", "RELATED-TO", "REPEAT",
    "REQUEST-STATUS", "RESOURCES", "RRULE", "SEQUENCE", "STATUS", "SUMMARY", "TRANSP", "TRIGGER", "TZID", "TZNAME",
    "TZOFFSETFROM", "TZOFFSETTO", "TZURL", "UID", "URL", "VERSION",
];

/// Whether a line opens a property rather than continuing wrapped text.
/// `Pickup: 2x Guest(s)` inside a description is text, not a property.
fn starts_property(line: &str) -> bool {
    let Some(caps) = property_start().captures(line) else {
        return false;
    };
    let name = caps[1].to_ascii_uppercase();
    name.starts_with("X-") || KNOWN_PROPERTIES.contains(&name.as_str())
}

/// Joins continuation lines onto the property they belong to.
///
/// RFC 5545 folding (a leading space or tab) is removed. Lines that do not
/// start a property are wrapped text from a sloppy feed and are kept with a
/// line break so guest-count normalization sees them.
fn unfold_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        if let Some(last) = lines.last_mut() {
            if let Some(rest) = line.strip_prefix(' ').or_else(|| line.strip_prefix('\t')) {
                last.push_str(rest);
                continue;
            }
            if !line.is_empty() && !starts_property(line) {
                last.push('\n');
                last.push_str(line);
                continue;
            }
        }
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    lines
}

/// Splits `NAME;PARAM=x:value` into the upper-cased name, the raw
/// parameter list and the value
fn split_property(line: &str) -> Option<(String, &str, &str)> {
    let colon = line.find(':')?;
    let head = &line[..colon];
    let (name, params) = head.split_once(';').unwrap_or((head, ""));
    Some((name.trim().to_uppercase(), params, &line[colon + 1..]))
}

/// Value of one `KEY=value` parameter, quotes stripped
fn param<'a>(params: &'a str, key: &str) -> Option<&'a str> {
    params.split(';').find_map(|p| {
        let (k, v) = p.split_once('=')?;
        k.trim().eq_ignore_ascii_case(key).then(|| v.trim().trim_matches('"'))
    })
}

/// Reverses iCalendar TEXT escaping (`\n`, `\,`, `\;`, `\\`)
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Sums every `<n>x Guest(s)` in an event description.
///
/// Line breaks are collapsed to spaces first since feeds wrap the token.
pub fn extract_guest_count(description: &str) -> u32 {
    let normalized = description.replace("\r\n", " ").replace(['\n', '\r'], " ");
    guest_pattern()
        .captures_iter(&normalized)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .fold(0u32, |total, n| total.saturating_add(n))
}

/// Reads a `YYYYMMDDThhmmss[Z]` start stamp as a local date and time.
///
/// A trailing `Z` marks a UTC instant, converted to `tz`. Without it the
/// stamp is already local wall-clock time.
pub fn parse_dtstart(value: &str, tz: &Tz) -> Option<(NaiveDate, ClockTime)> {
    parse_dtstart_in(value, None, tz)
}

/// Like [`parse_dtstart`], but a stamp without `Z` is wall-clock time in
/// `source` (the DTSTART `TZID`) and is converted to `tz`. A wall-clock
/// time skipped by a DST change is kept as written.
pub fn parse_dtstart_in(value: &str, source: Option<&Tz>, tz: &Tz) -> Option<(NaiveDate, ClockTime)> {
    let value = value.trim();
    if value.as_bytes().get(8) != Some(&b'T') {
        return None; // All-day or malformed
    }
    let num = |range: Range<usize>| -> Option<u32> { value.get(range)?.parse().ok() };

    let year = value.get(0..4)?.parse::<i32>().ok()?;
    let naive = NaiveDate::from_ymd_opt(year, num(4..6)?, num(6..8)?)?.and_hms_opt(num(9..11)?, num(11..13)?, 0)?;

    let local = if value.ends_with('Z') {
        Utc.from_utc_datetime(&naive).with_timezone(tz).naive_local()
    } else {
        match source.and_then(|source| source.from_local_datetime(&naive).earliest()) {
            Some(stamp) => stamp.with_timezone(tz).naive_local(),
            None => naive,
        }
    };

    let time = ClockTime::from_hm(local.hour() as u16, local.minute() as u16)?;
    Some((local.date(), time))
}

/// Parses an iCalendar feed into raw bookings.
///
/// Only SUMMARY, DTSTART, DTEND and DESCRIPTION of each VEVENT are read.
/// Incomplete events, overnight stays and events without confirmed guests
/// are counted in `skipped`. Output follows event order.
pub fn parse_ics_bookings(text: &str, tz: &Tz) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let mut current: Option<EventFields> = None;
    // Components nested in a VEVENT (VALARM) carry their own DESCRIPTION
    let mut nested_depth = 0usize;

    for line in unfold_lines(text) {
        let Some((name, params, value)) = split_property(&line) else {
            continue;
        };
        let value = value.trim();

        match name.as_str() {
            "BEGIN" if value.eq_ignore_ascii_case("VEVENT") => {
                current = Some(EventFields::default());
                nested_depth = 0;
            }
            "BEGIN" if current.is_some() => nested_depth += 1,
            "END" if value.eq_ignore_ascii_case("VEVENT") => {
                if let Some(event) = current.take() {
                    accept_event(event, tz, &mut outcome);
                }
            }
            "END" if nested_depth > 0 => nested_depth -= 1,
            _ if nested_depth > 0 => {}
            _ => {
                let Some(event) = current.as_mut() else {
                    continue;
                };
                match name.as_str() {
                    "SUMMARY" => event.summary = Some(unescape_text(value)),
                    "DTSTART" => {
                        event.dtstart = Some(value.to_string());
                        event.dtstart_tzid = param(params, "TZID").map(str::to_string);
                    }
                    "DTEND" => event.dtend = Some(value.to_string()),
                    "DESCRIPTION" => event.description = Some(unescape_text(value)),
                    _ => {}
                }
            }
        }
    }

    outcome
}

fn accept_event(event: EventFields, tz: &Tz, outcome: &mut ParseOutcome) {
    let (Some(summary), Some(dtstart), Some(description)) = (event.summary, event.dtstart, event.description) else {
        debug!("ICS event missing summary, start or description, skipped");
        outcome.skipped.incomplete += 1;
        return;
    };

    if is_overnight_stay(&summary) {
        debug!("ICS event '{}' is an overnight stay, skipped", summary);
        outcome.skipped.overnight_stays += 1;
        return;
    }

    let guest_count = extract_guest_count(&description);
    if guest_count == 0 {
        debug!("ICS event '{}' has no confirmed guests, skipped", summary);
        outcome.skipped.zero_guests += 1;
        return;
    }

    let source = event.dtstart_tzid.as_deref().and_then(|tzid| match tzid.parse::<Tz>() {
        Ok(source) => Some(source),
        Err(_) => {
            warn!("ICS event '{}' has unknown TZID '{}', read as local time", summary, tzid);
            None
        }
    });
    let Some((date, time)) = parse_dtstart_in(&dtstart, source.as_ref(), tz) else {
        debug!("ICS event '{}' has unreadable DTSTART '{}', skipped", summary, dtstart);
        outcome.skipped.incomplete += 1;
        return;
    };

    let raw_source = match &event.dtend {
        Some(dtend) => format!("{} [{}/{}]", summary, dtstart, dtend),
        None => format!("{} [{}]", summary, dtstart),
    };

    outcome.records.push(RawBooking {
        date: Some(date),
        time,
        product: reclassify_variant(&summary).into_owned(),
        guest_count,
        customer_name: None,
        raw_source,
    });
}
