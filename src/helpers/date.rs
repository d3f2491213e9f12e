//! Date helper functions
//!
//! Display dates are fixed to the Brazilian Portuguese calendar format the
//! site has always used, so the month names are carried here instead of
//! pulling in a locale database.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Abbreviated pt-BR month names, indexed by `month0`
const MONTHS_ABBR: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Format a publication date as `dd MMM yyyy` (e.g. "15 mar 2021")
pub fn format_date(date: &DateTime<Utc>) -> String {
    format!(
        "{:02} {} {}",
        date.day(),
        MONTHS_ABBR[date.month0() as usize],
        date.year()
    )
}

/// Format an edit timestamp as `dd MMM yyyy, às HH:mm`
/// (e.g. "19 mar 2021, às 15:49")
pub fn format_datetime(date: &DateTime<Utc>) -> String {
    format!(
        "{:02} {} {}, às {:02}:{:02}",
        date.day(),
        MONTHS_ABBR[date.month0() as usize],
        date.year(),
        date.hour(),
        date.minute()
    )
}

/// Generate a <time> HTML element with a machine-readable datetime attribute
pub fn time_tag(date: &DateTime<Utc>) -> String {
    let datetime = date.format("%Y-%m-%dT%H:%M:%S%:z").to_string();
    format!(r#"<time datetime="{}">{}</time>"#, datetime, format_date(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap();
        assert_eq!(format_date(&date), "15 mar 2021");

        let date = Utc.with_ymd_and_hms(2020, 12, 1, 0, 0, 0).unwrap();
        assert_eq!(format_date(&date), "01 dez 2020");
    }

    #[test]
    fn test_format_datetime() {
        let date = Utc.with_ymd_and_hms(2021, 3, 19, 15, 49, 0).unwrap();
        assert_eq!(format_datetime(&date), "19 mar 2021, às 15:49");
    }

    #[test]
    fn test_time_tag() {
        let date = Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap();
        let tag = time_tag(&date);
        assert!(tag.starts_with(r#"<time datetime="2021-03-15T19:25:28+00:00">"#));
        assert!(tag.contains("15 mar 2021"));
    }
}
