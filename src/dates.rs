use chrono::{Local, NaiveDate, NaiveDateTime};

/// Source of wall-clock "now" for labels and the hourly window.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// e.g. "Monday, Oct 19, 2026"
pub fn current_date_label(now: NaiveDateTime) -> String {
    now.format("%A, %b %-d, %Y").to_string()
}

// Provider dates carry no time or offset, so they are formatted as calendar
// dates and never shifted by the local zone.
pub fn short_day_label(date: NaiveDate) -> String {
    date.format("%a").to_string()
}

pub fn full_day_label(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

pub fn hour_label(time: NaiveDateTime) -> String {
    time.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn current_date_is_long_form() {
        let now = date(2026, 10, 19).and_hms_opt(14, 5, 0).unwrap();
        assert_eq!(current_date_label(now), "Monday, Oct 19, 2026");
    }

    #[test]
    fn day_labels() {
        assert_eq!(short_day_label(date(2026, 10, 19)), "Mon");
        assert_eq!(full_day_label(date(2026, 10, 25)), "Sunday");
        // first of the month must not slip back to the previous day
        assert_eq!(full_day_label(date(2026, 11, 1)), "Sunday");
    }

    #[test]
    fn hour_label_is_24h() {
        let t = date(2026, 10, 19).and_hms_opt(7, 0, 0).unwrap();
        assert_eq!(hour_label(t), "07:00");
        let t = date(2026, 10, 19).and_hms_opt(19, 0, 0).unwrap();
        assert_eq!(hour_label(t), "19:00");
    }
}
