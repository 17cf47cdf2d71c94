use chrono::NaiveDate;
use model::calendar::{Calendar, CalendarException, ExceptionType};

use crate::error::RowDecodeError;

#[derive(Debug, sqlx::FromRow)]
pub struct CalendarRow {
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

impl From<CalendarRow> for Calendar {
    fn from(row: CalendarRow) -> Self {
        Calendar {
            monday: row.monday,
            tuesday: row.tuesday,
            wednesday: row.wednesday,
            thursday: row.thursday,
            friday: row.friday,
            saturday: row.saturday,
            sunday: row.sunday,
            start_date: row.start_date,
            end_date: row.end_date,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct CalendarExceptionRow {
    pub date: NaiveDate,
    pub exception_type: i16,
}

impl TryFrom<CalendarExceptionRow> for CalendarException {
    type Error = RowDecodeError;

    fn try_from(row: CalendarExceptionRow) -> Result<Self, Self::Error> {
        let exception_type = match row.exception_type {
            0 => ExceptionType::Added,
            1 => ExceptionType::Removed,
            other => return Err(RowDecodeError::new("calendar_exceptions.exception_type", other)),
        };
        Ok(CalendarException {
            date: row.date,
            exception_type,
        })
    }
}
