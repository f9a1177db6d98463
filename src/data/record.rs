//! Earthquake Record Module
//! One immutable row of the earthquake dataset.

use chrono::NaiveDate;

use super::LoaderError;

/// Primary grammar for "{Date} {Year}", e.g. "March 11 2011".
const DATE_FORMAT: &str = "%B %d %Y";
/// Day-first fallback, e.g. "11 March 2011".
const DATE_FORMAT_DAY_FIRST: &str = "%d %B %Y";

/// A single earthquake event, as loaded from the CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeRecord {
    pub year: i32,
    pub earthquake_name: String,
    pub fatalities: u64,
    pub max_magnitude: f64,
    pub location: String,
    pub date: String,
    pub depth_km: f64,
    pub flag_code: String,
    /// Derived from `date` and `year`. Not used for rendering.
    pub full_date: NaiveDate,
}

/// Parse the calendar date formed by `date` ("March 11") followed by `year`.
///
/// Month names may be full or abbreviated and are matched case-insensitively.
pub fn parse_full_date(date: &str, year: i32) -> Result<NaiveDate, LoaderError> {
    let combined = format!("{} {}", date.trim(), year);

    let parsed = NaiveDate::parse_from_str(&combined, DATE_FORMAT)
        .or_else(|e| NaiveDate::parse_from_str(&combined, DATE_FORMAT_DAY_FIRST).map_err(|_| e));

    match parsed {
        Ok(date) => Ok(date),
        Err(source) => Err(LoaderError::DateParse {
            value: combined,
            source,
        }),
    }
}
