use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Peru has no daylight saving time; Lima is always UTC-5.
const LIMA_OFFSET_SECONDS: i32 = -5 * 3600;

/// Calendar date in Lima at the given instant.
pub fn date_in_lima(now: DateTime<Utc>) -> NaiveDate {
    match FixedOffset::east_opt(LIMA_OFFSET_SECONDS) {
        Some(offset) => now.with_timezone(&offset).date_naive(),
        None => now.date_naive(),
    }
}

/// Default invoice date for a new request.
pub fn today_in_lima() -> NaiveDate {
    date_in_lima(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_evening_in_lima_is_still_the_same_day() {
        // 20:30 in Lima is already the next day in UTC
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 1, 30, 0).unwrap();
        assert_eq!(date_in_lima(now), NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
    }

    #[test]
    fn test_morning_matches_utc_date() {
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 14, 0, 0).unwrap();
        assert_eq!(date_in_lima(now), NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
    }
}
