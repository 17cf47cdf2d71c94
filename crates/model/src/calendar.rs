use chrono::{Datelike, NaiveDate, Weekday};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::HasId;

/// serviceId, weekday bitmap, start/end date window (GTFS `calendar.txt`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Calendar {
    fn runs_on_weekday(&self, date: NaiveDate) -> bool {
        match date.weekday() {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    /// Whether the calendar window alone (ignoring exceptions) covers
    /// `date`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date && self.runs_on_weekday(date)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ExceptionType {
    Added,
    Removed,
}

/// serviceId/date/exceptionType addition or removal (GTFS
/// `calendar_dates.txt`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarException {
    pub date: NaiveDate,
    pub exception_type: ExceptionType,
}

/// A service is "active on date D" iff D is within the calendar's weekday
/// window AND no removal exception exists for (serviceId, D), OR an
/// addition exception exists for (serviceId, D) — regardless of the base
/// calendar window.
pub fn is_active_on(
    calendar: Option<&Calendar>,
    exceptions: &[CalendarException],
    date: NaiveDate,
) -> bool {
    let exception = exceptions.iter().find(|exception| exception.date == date);
    match exception {
        Some(exception) => exception.exception_type == ExceptionType::Added,
        None => calendar.is_some_and(|calendar| calendar.covers(date)),
    }
}

pub struct Service;

impl HasId for Service {
    type IdType = String;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar(start: (i32, u32, u32), end: (i32, u32, u32)) -> Calendar {
        Calendar {
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            saturday: false,
            sunday: false,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        }
    }

    #[test]
    fn weekday_window_governs_absent_exceptions() {
        let calendar = calendar((2026, 1, 1), (2026, 12, 31));
        // 2026-01-05 is a Monday.
        let monday = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        assert!(is_active_on(Some(&calendar), &[], monday));
        assert!(!is_active_on(Some(&calendar), &[], saturday));
    }

    #[test]
    fn removal_exception_overrides_window() {
        let calendar = calendar((2026, 1, 1), (2026, 12, 31));
        let monday = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let exceptions = vec![CalendarException {
            date: monday,
            exception_type: ExceptionType::Removed,
        }];
        assert!(!is_active_on(Some(&calendar), &exceptions, monday));
    }

    #[test]
    fn addition_exception_adds_service_outside_window() {
        let calendar = calendar((2026, 1, 1), (2026, 12, 31));
        let saturday = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        let exceptions = vec![CalendarException {
            date: saturday,
            exception_type: ExceptionType::Added,
        }];
        assert!(is_active_on(Some(&calendar), &exceptions, saturday));
    }

    #[test]
    fn no_calendar_and_no_addition_is_inactive() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert!(!is_active_on(None, &[], date));
    }
}
