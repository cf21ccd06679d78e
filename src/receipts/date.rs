use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Two-digit years below this belong to the 2000s, the rest to the 1900s.
const CENTURY_PIVOT: i32 = 50;

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // 25/12/2024
        r"\b(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4})\b",
        // 2024-12-25
        r"\b(\d{4})[/\-.](\d{1,2})[/\-.](\d{1,2})\b",
        // 25-12-24
        r"\b(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{2})\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("date pattern is valid"))
    .collect()
});

/// Finds the first date printed on the receipt, or `today` when none is found.
///
/// Field order comes from field width: a four-digit first group is
/// year-month-day, a four-digit last group is day-month-year, and a two-digit
/// last group is a short year. Matches that are not real calendar dates
/// (`31/02/2024`, `13.45.2024`) are skipped.
///
/// Falling back to `today` can silently misdate an expense; callers that care
/// should let the user confirm the date.
pub fn extract_date(text: &str, today: NaiveDate) -> NaiveDate {
    find_date(text).unwrap_or(today)
}

pub fn find_date(text: &str) -> Option<NaiveDate> {
    DATE_PATTERNS.iter().find_map(|re| {
        re.captures_iter(text)
            .find_map(|caps| to_date(&caps[1], &caps[2], &caps[3]))
    })
}

fn to_date(first: &str, second: &str, third: &str) -> Option<NaiveDate> {
    let (year, month, day): (i32, &str, &str) = if first.len() == 4 {
        (first.parse().ok()?, second, third)
    } else if third.len() == 4 {
        (third.parse().ok()?, second, first)
    } else {
        let short: i32 = third.parse().ok()?;
        let century = if short < CENTURY_PIVOT { 2000 } else { 1900 };
        (century + short, second, first)
    };

    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        ymd(2025, 6, 1)
    }

    #[test]
    fn day_first_with_four_digit_year() {
        assert_eq!(extract_date("Tgl 25/12/2024 14:02", today()), ymd(2024, 12, 25));
        assert_eq!(extract_date("5.1.2024", today()), ymd(2024, 1, 5));
    }

    #[test]
    fn year_first() {
        assert_eq!(extract_date("2024-01-05", today()), ymd(2024, 1, 5));
        assert_eq!(extract_date("Date: 2023/7/9", today()), ymd(2023, 7, 9));
    }

    #[test]
    fn two_digit_year_uses_pivot() {
        assert_eq!(extract_date("03-04-23", today()), ymd(2023, 4, 3));
        assert_eq!(extract_date("01/02/99", today()), ymd(1999, 2, 1));
        assert_eq!(extract_date("01/02/49", today()), ymd(2049, 2, 1));
    }

    #[test]
    fn invalid_calendar_dates_are_skipped() {
        let text = "Ref 31/02/2024\nTanggal 28/02/2024";
        assert_eq!(extract_date(text, today()), ymd(2024, 2, 28));
    }

    #[test]
    fn missing_date_defaults_to_today() {
        assert_eq!(extract_date("TOTAL Rp 17.000", today()), today());
        assert_eq!(find_date(""), None);
    }
}
