//! Parsing of individual spreadsheet cells and column labels.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static HOUR_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2}):00 Hrs").expect("valid hour column pattern"));
static PAIR_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})").expect("valid date pattern"));
static PAIR_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)Hrs-(\d+)hrs").expect("valid hour range pattern"));

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Hour of a station-hourly column label such as `05:00 Hrs To 06:00 Hrs`
/// or `23:00 Hrs To Last train`.
pub fn hour_from_column(label: &str) -> Option<u8> {
    let caps = HOUR_COLUMN.captures(label)?;
    caps[1].parse().ok().filter(|hour| *hour < 24)
}

/// Date and starting hour of a station-pair business date such as
/// `2025-01-06 05Hrs-06hrs`.
pub fn pair_date_hour(value: &str) -> Option<(NaiveDate, u8)> {
    let date = PAIR_DATE.captures(value)?;
    let date = NaiveDate::parse_from_str(&date[1], "%Y-%m-%d").ok()?;
    let hour = PAIR_HOUR.captures(value)?;
    let hour: u8 = hour[1].parse().ok()?;
    (hour < 24).then_some((date, hour))
}

/// Parses a business date in any of the layouts the exports use. A trailing
/// time of day (`2025-01-06 00:00:00`) is ignored.
pub fn business_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let day = value.split([' ', 'T']).next().unwrap_or(value);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(day, format).ok())
}

/// Parses a ridership cell. Empty cells are `Ok(None)`; integral decimals
/// such as `12.0` are accepted; anything else is `Err(())`.
pub fn ridership(value: &str) -> Result<Option<u64>, ()> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }

    let whole = match value.split_once('.') {
        Some((whole, fraction)) if fraction.bytes().all(|b| b == b'0') => whole,
        Some(_) => return Err(()),
        None => value,
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(());
    }
    whole.parse().map(Some).map_err(|_| ())
}

/// Strips a `CODE-` prefix from a raw station label.
pub fn station_label(raw: &str) -> &str {
    match raw.split_once('-') {
        Some((_, name)) => name.trim(),
        None => raw.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_from_column() {
        assert_eq!(hour_from_column("05:00 Hrs To     06:00 Hrs"), Some(5));
        assert_eq!(hour_from_column("23:00 Hrs To Last train"), Some(23));
        assert_eq!(hour_from_column("TOTAL"), None);
        assert_eq!(hour_from_column("25:00 Hrs To 26:00 Hrs"), None);
    }

    #[test]
    fn test_pair_date_hour() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(pair_date_hour("2025-01-06 05Hrs-06hrs"), Some((expected, 5)));
        assert_eq!(pair_date_hour("2025-01-06 23Hrs-24hrs"), Some((expected, 23)));
        assert_eq!(pair_date_hour("2025-01-06"), None);
        assert_eq!(pair_date_hour("Total"), None);
    }

    #[test]
    fn test_business_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 6);
        assert_eq!(business_date("2025-01-06"), expected);
        assert_eq!(business_date("2025-01-06 00:00:00"), expected);
        assert_eq!(business_date("06-01-2025"), expected);
        assert_eq!(business_date("06/01/2025"), expected);
        assert_eq!(business_date("January"), None);
    }

    #[test]
    fn test_ridership_cells() {
        assert_eq!(ridership("12"), Ok(Some(12)));
        assert_eq!(ridership(" 12.0 "), Ok(Some(12)));
        assert_eq!(ridership(""), Ok(None));
        assert_eq!(ridership("NaN"), Ok(None));
        assert_eq!(ridership("12.5"), Err(()));
        assert_eq!(ridership("-3"), Err(()));
        assert_eq!(ridership("many"), Err(()));
    }

    #[test]
    fn test_station_label() {
        assert_eq!(station_label("PUR12-Indiranagar"), "Indiranagar");
        assert_eq!(station_label("GRN3-Rashtreeya Vidyalaya Road"), "Rashtreeya Vidyalaya Road");
        assert_eq!(station_label(" MG Road "), "MG Road");
    }
}
