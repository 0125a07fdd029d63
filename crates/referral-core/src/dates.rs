//! Date formatting used on the printed forms

use chrono::{Datelike, NaiveDate, NaiveTime};

pub fn format_mm_dd_yyyy(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

pub fn format_hh_mm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// `YYYY-MM-DD` to `MM/DD/YYYY`; anything without three parts is dropped
pub fn iso_to_mm_dd_yyyy(iso: &str) -> String {
    let parts: Vec<&str> = iso.trim().split('-').collect();
    match parts.as_slice() {
        [yyyy, mm, dd] if !yyyy.is_empty() && !mm.is_empty() && !dd.is_empty() => {
            format!("{:0>2}/{:0>2}/{}", mm, dd, yyyy)
        }
        _ => String::new(),
    }
}

/// Parse either `YYYY-MM-DD` or `MM/DD/YYYY`
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
}

/// Whole years elapsed between `dob` and `today`
pub fn years_between(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    years
}

/// Age as printed on the referral; blank when implausible
pub fn age_text(dob: NaiveDate, today: NaiveDate) -> String {
    match years_between(dob, today) {
        y if (0..=120).contains(&y) => y.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_formats() {
        assert_eq!(format_mm_dd_yyyy(d(2025, 8, 2)), "08/02/2025");
        assert_eq!(
            format_hh_mm(NaiveTime::from_hms_opt(9, 5, 59).unwrap()),
            "09:05"
        );
    }

    #[test]
    fn test_iso_conversion() {
        assert_eq!(iso_to_mm_dd_yyyy("1946-01-10"), "01/10/1946");
        assert_eq!(iso_to_mm_dd_yyyy("1946-1-9"), "01/09/1946");
        assert_eq!(iso_to_mm_dd_yyyy(""), "");
        assert_eq!(iso_to_mm_dd_yyyy("01/10/1946"), "");
    }

    #[test]
    fn test_parse_flexible() {
        assert_eq!(parse_flexible_date("1946-01-10"), Some(d(1946, 1, 10)));
        assert_eq!(parse_flexible_date("01/10/1946"), Some(d(1946, 1, 10)));
        assert_eq!(parse_flexible_date("10 Jan 1946"), None);
    }

    #[test]
    fn test_years_between_birthday_boundary() {
        assert_eq!(years_between(d(1946, 8, 12), d(2025, 8, 11)), 78);
        assert_eq!(years_between(d(1946, 8, 12), d(2025, 8, 12)), 79);
    }

    #[test]
    fn test_age_text_bounds() {
        assert_eq!(age_text(d(1946, 1, 10), d(2025, 8, 12)), "79");
        assert_eq!(age_text(d(2030, 1, 1), d(2025, 8, 12)), "");
        assert_eq!(age_text(d(1800, 1, 1), d(2025, 8, 12)), "");
    }
}
