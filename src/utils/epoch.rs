use crate::error::IgrfError;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};

/// Converts a UTC date and time into a decimal year, e.g. 2000-07-02 00:00 -> 2000.5
pub fn decimal_year(datetime: NaiveDateTime) -> f64 {
    let year = datetime.year();
    let days_in_year = if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366.0
    } else {
        365.0
    };
    let day_fraction = datetime.num_seconds_from_midnight() as f64 / 86_400.0;
    year as f64 + (datetime.ordinal0() as f64 + day_fraction) / days_in_year
}

/// Decimal year of the current UTC time, the epoch used when none is requested.
pub fn current_decimal_year() -> f64 {
    decimal_year(Utc::now().naive_utc())
}

/// Reads an epoch given either as a decimal year (`2015.5`), a date (`20150702`) or a date
/// and time (`20150702 12:00`).
pub fn parse_epoch(text: &str) -> Result<f64, IgrfError> {
    let text = text.trim();
    if let Ok(year) = text.parse::<f64>() {
        if text.len() != 8 || text.contains('.') {
            return Ok(year);
        }
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, "%Y%m%d %H:%M") {
        return Ok(decimal_year(datetime));
    }
    NaiveDate::parse_from_str(text, "%Y%m%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(decimal_year)
        .ok_or_else(|| IgrfError::Epoch(format!("Unable to interpret {text} as an epoch")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn decimal_years() {
        assert_eq!(decimal_year(at(2000, 1, 1, 0)), 2000.0);
        // 2000 is a leap year, day 183 of 366 starts halfway through
        assert_eq!(decimal_year(at(2000, 7, 2, 0)), 2000.5);
        assert_eq!(decimal_year(at(2001, 1, 1, 12)), 2001.0 + 0.5 / 365.0);
        assert!(decimal_year(at(2015, 12, 31, 23)) < 2016.0);
    }

    #[test]
    fn epoch_strings() {
        assert_eq!(parse_epoch("2015.5").unwrap(), 2015.5);
        assert_eq!(parse_epoch("1995").unwrap(), 1995.0);
        assert_eq!(parse_epoch("20000702").unwrap(), 2000.5);
        assert_eq!(parse_epoch("20010101 12:00").unwrap(), 2001.0 + 0.5 / 365.0);
        assert!(matches!(parse_epoch("July 2000"), Err(IgrfError::Epoch(_))));
        assert!(matches!(parse_epoch("20001301"), Err(IgrfError::Epoch(_))));
    }

    #[test]
    fn today_is_plausible() {
        let now = current_decimal_year();
        assert!(now > 2020.0 && now < 2200.0);
    }
}
