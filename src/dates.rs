use chrono::{DateTime, Datelike, Duration, TimeZone};

/// Formats `when` relative to `now`, both in the same timezone:
/// `today HH:mm`, `yesterday HH:mm`, `MM-dd HH:mm` within the current year,
/// otherwise `yyyy-MM-dd HH:mm`.
pub fn format_relative<Tz: TimeZone>(when: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let day = when.date_naive();
    let today = now.date_naive();
    if day == today {
        format!("today {}", when.format("%H:%M"))
    } else if today.checked_sub_signed(Duration::days(1)) == Some(day) {
        format!("yesterday {}", when.format("%H:%M"))
    } else if day.year() == today.year() {
        when.format("%m-%d %H:%M").to_string()
    } else {
        format_timestamp(when)
    }
}

pub fn format_timestamp<Tz: TimeZone>(when: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    when.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn same_day_is_today() {
        let now = at(2024, 5, 10, 18, 0);
        assert_eq!(format_relative(&at(2024, 5, 10, 0, 5), &now), "today 00:05");
        assert_eq!(format_relative(&at(2024, 5, 10, 17, 59), &now), "today 17:59");
    }

    #[test]
    fn previous_day_is_yesterday() {
        let now = at(2024, 5, 10, 0, 1);
        assert_eq!(
            format_relative(&at(2024, 5, 9, 23, 59), &now),
            "yesterday 23:59"
        );
        let new_year = at(2024, 1, 1, 8, 0);
        assert_eq!(
            format_relative(&at(2023, 12, 31, 22, 15), &new_year),
            "yesterday 22:15"
        );
    }

    #[test]
    fn same_year_drops_the_year() {
        let now = at(2024, 5, 10, 12, 0);
        assert_eq!(format_relative(&at(2024, 5, 8, 9, 30), &now), "05-08 09:30");
        assert_eq!(format_relative(&at(2024, 1, 1, 0, 0), &now), "01-01 00:00");
    }

    #[test]
    fn other_years_use_the_full_date() {
        let now = at(2024, 5, 10, 12, 0);
        assert_eq!(
            format_relative(&at(2023, 5, 10, 12, 0), &now),
            "2023-05-10 12:00"
        );
        assert_eq!(
            format_relative(&at(2025, 1, 2, 3, 4), &now),
            "2025-01-02 03:04"
        );
    }

    #[test]
    fn day_boundaries_follow_the_given_zone() {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = at(2024, 5, 10, 16, 0).with_timezone(&tz); // 05-11 01:00 local
        let when = at(2024, 5, 10, 14, 30).with_timezone(&tz); // 05-10 23:30 local
        assert_eq!(format_relative(&when, &now), "yesterday 23:30");
    }
}
