use chrono::NaiveDate;
use model::calendar::{self, Calendar, CalendarException, Service};
use sqlx::PgPool;
use transit_engine::store::StoreResult;
use utility::id::Id;

use crate::{
    error::convert_error,
    rows::calendar::{CalendarExceptionRow, CalendarRow},
};

pub async fn calendar_for_service(
    pool: &PgPool,
    service_id: &Id<Service>,
) -> StoreResult<Option<Calendar>> {
    sqlx::query_as::<_, CalendarRow>(
        "SELECT monday, tuesday, wednesday, thursday, friday, saturday, sunday,
                start_date, end_date
         FROM calendars WHERE service_id = $1",
    )
    .bind(service_id.raw())
    .fetch_optional(pool)
    .await
    .map_err(convert_error)
    .map(|row| row.map(Calendar::from))
}

pub async fn calendar_exceptions_for_service(
    pool: &PgPool,
    service_id: &Id<Service>,
) -> StoreResult<Vec<CalendarException>> {
    let rows = sqlx::query_as::<_, CalendarExceptionRow>(
        "SELECT date, exception_type FROM calendar_exceptions WHERE service_id = $1",
    )
    .bind(service_id.raw())
    .fetch_all(pool)
    .await
    .map_err(convert_error)?;
    rows.into_iter()
        .map(CalendarException::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

#[derive(sqlx::FromRow)]
struct ServiceCalendarRow {
    service_id: String,
    monday: bool,
    tuesday: bool,
    wednesday: bool,
    thursday: bool,
    friday: bool,
    saturday: bool,
    sunday: bool,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(sqlx::FromRow)]
struct ServiceExceptionRow {
    service_id: String,
    date: NaiveDate,
    exception_type: i16,
}

/// All service ids active on `date` under `agency_id`. Fetches every
/// calendar and every same-day exception scoped to the agency, then
/// re-derives activity in Rust with `model::calendar::is_active_on` rather
/// than duplicating that invariant as SQL — the same function the engine
/// itself would call if it had the rows in hand, which also correctly
/// picks up calendar-dates-only services that have no base calendar row
/// at all.
pub async fn active_service_ids(
    pool: &PgPool,
    agency_id: &Id<model::agency::Agency>,
    date: NaiveDate,
) -> StoreResult<Vec<Id<Service>>> {
    let calendars = sqlx::query_as::<_, ServiceCalendarRow>(
        "SELECT service_id, monday, tuesday, wednesday, thursday, friday, saturday,
                sunday, start_date, end_date
         FROM calendars WHERE agency_id = $1",
    )
    .bind(agency_id.raw())
    .fetch_all(pool)
    .await
    .map_err(convert_error)?;

    let exceptions_on_date = sqlx::query_as::<_, ServiceExceptionRow>(
        "SELECT service_id, date, exception_type
         FROM calendar_exceptions WHERE agency_id = $1 AND date = $2",
    )
    .bind(agency_id.raw())
    .bind(date)
    .fetch_all(pool)
    .await
    .map_err(convert_error)?;

    let mut exceptions_by_service: std::collections::HashMap<String, CalendarException> =
        std::collections::HashMap::new();
    for row in exceptions_on_date {
        let service_id = row.service_id.clone();
        let exception = CalendarExceptionRow {
            date: row.date,
            exception_type: row.exception_type,
        }
        .try_into()?;
        exceptions_by_service.insert(service_id, exception);
    }

    let mut active: Vec<Id<Service>> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for row in calendars {
        let service_id = row.service_id.clone();
        seen.insert(service_id.clone());
        let calendar = Calendar::from(CalendarRow {
            monday: row.monday,
            tuesday: row.tuesday,
            wednesday: row.wednesday,
            thursday: row.thursday,
            friday: row.friday,
            saturday: row.saturday,
            sunday: row.sunday,
            start_date: row.start_date,
            end_date: row.end_date,
        });
        let exceptions = exceptions_by_service
            .get(&service_id)
            .cloned()
            .into_iter()
            .collect::<Vec<_>>();
        if calendar::is_active_on(Some(&calendar), &exceptions, date) {
            active.push(Id::new(service_id));
        }
    }

    // Calendar-dates-only services: an addition exception with no base
    // calendar row at all.
    for (service_id, exception) in &exceptions_by_service {
        if !seen.contains(service_id)
            && calendar::is_active_on(None, std::slice::from_ref(exception), date)
        {
            active.push(Id::new(service_id.clone()));
        }
    }

    Ok(active)
}
