use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use transit_engine::store::StoreResult;

use crate::error::convert_error;

/// Which entity a problem report concerns. Stored as the `code` column's
/// value rather than a Postgres enum so adding a report kind never needs a
/// migration that touches existing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportCode {
    Stop,
    Trip,
}

impl ReportCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Trip => "trip",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProblemReport {
    pub code: ReportCode,
    pub stop_id: Option<String>,
    pub trip_id: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub user_comment: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProblemReport {
    pub id: i64,
    pub code: String,
    pub stop_id: Option<String>,
    pub trip_id: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub user_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub async fn insert(pool: &PgPool, report: NewProblemReport) -> StoreResult<ProblemReport> {
    sqlx::query_as::<_, ProblemReport>(
        "INSERT INTO problem_reports (code, stop_id, trip_id, service_date, user_comment)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, code, stop_id, trip_id, service_date, user_comment, created_at",
    )
    .bind(report.code.as_str())
    .bind(report.stop_id)
    .bind(report.trip_id)
    .bind(report.service_date)
    .bind(report.user_comment)
    .fetch_one(pool)
    .await
    .map_err(convert_error)
}

pub async fn for_stop(pool: &PgPool, stop_id: &str) -> StoreResult<Vec<ProblemReport>> {
    sqlx::query_as::<_, ProblemReport>(
        "SELECT id, code, stop_id, trip_id, service_date, user_comment, created_at
         FROM problem_reports WHERE stop_id = $1 ORDER BY created_at DESC",
    )
    .bind(stop_id)
    .fetch_all(pool)
    .await
    .map_err(convert_error)
}

pub async fn for_trip(pool: &PgPool, trip_id: &str) -> StoreResult<Vec<ProblemReport>> {
    sqlx::query_as::<_, ProblemReport>(
        "SELECT id, code, stop_id, trip_id, service_date, user_comment, created_at
         FROM problem_reports WHERE trip_id = $1 ORDER BY created_at DESC",
    )
    .bind(trip_id)
    .fetch_all(pool)
    .await
    .map_err(convert_error)
}
