use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use database::{NewProblemReport, ProblemReport, ReportCode};
use serde::Serialize;

use crate::{
    envelope::{EntryData, Envelope, ListData},
    error::ApiError,
    AppState,
};

use super::params::{self, strip_json_suffix};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProblemReportEntry {
    id: i64,
    code: String,
    stop_id: Option<String>,
    trip_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_date: Option<chrono::NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_comment: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProblemReport> for ProblemReportEntry {
    fn from(report: ProblemReport) -> Self {
        Self {
            id: report.id,
            code: report.code,
            stop_id: report.stop_id,
            trip_id: report.trip_id,
            service_date: report.service_date,
            user_comment: report.user_comment,
            created_at: report.created_at,
        }
    }
}

/// `POST /report-problem-with-stop/{stopId}.json?serviceDate=&comment=`
/// (§6). Writes go straight to the database rather than through `Engine`
/// — there's no query-fusion involved, just an insert.
pub async fn report_problem_with_stop(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
    uri: Uri,
) -> Result<impl IntoResponse, ApiError> {
    let now = state.clock.now_millis();
    let stop_id = strip_json_suffix(&stop_id).to_owned();
    let service_date = optional_date(&uri, now)?;
    let comment = params::query_param(&uri, "comment").map(str::to_owned);

    let report = state
        .database
        .report_problem(NewProblemReport {
            code: ReportCode::Stop,
            stop_id: Some(stop_id),
            trip_id: None,
            service_date,
            user_comment: comment,
        })
        .await
        .map_err(|why| ApiError::from_engine_error(why.into(), now))?;

    Ok((StatusCode::CREATED, Json(Envelope::ok(now, EntryData::new(ProblemReportEntry::from(report))))))
}

pub async fn report_problem_with_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    uri: Uri,
) -> Result<impl IntoResponse, ApiError> {
    let now = state.clock.now_millis();
    let trip_id = strip_json_suffix(&trip_id).to_owned();
    let service_date = optional_date(&uri, now)?;
    let comment = params::query_param(&uri, "comment").map(str::to_owned);

    let report = state
        .database
        .report_problem(NewProblemReport {
            code: ReportCode::Trip,
            stop_id: None,
            trip_id: Some(trip_id),
            service_date,
            user_comment: comment,
        })
        .await
        .map_err(|why| ApiError::from_engine_error(why.into(), now))?;

    Ok((StatusCode::CREATED, Json(Envelope::ok(now, EntryData::new(ProblemReportEntry::from(report))))))
}

pub async fn problem_reports_for_stop(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
) -> Result<Json<Envelope<ListData<ProblemReportEntry>>>, ApiError> {
    let now = state.clock.now_millis();
    let stop_id = strip_json_suffix(&stop_id);

    let reports = state
        .database
        .problem_reports_for_stop(stop_id)
        .await
        .map_err(|why| ApiError::from_engine_error(why.into(), now))?;

    let entries = reports.into_iter().map(ProblemReportEntry::from).collect();
    Ok(Json(Envelope::ok(now, ListData::new(entries))))
}

pub async fn problem_reports_for_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Json<Envelope<ListData<ProblemReportEntry>>>, ApiError> {
    let now = state.clock.now_millis();
    let trip_id = strip_json_suffix(&trip_id);

    let reports = state
        .database
        .problem_reports_for_trip(trip_id)
        .await
        .map_err(|why| ApiError::from_engine_error(why.into(), now))?;

    let entries = reports.into_iter().map(ProblemReportEntry::from).collect();
    Ok(Json(Envelope::ok(now, ListData::new(entries))))
}

fn optional_date(uri: &Uri, now: i64) -> Result<Option<chrono::NaiveDate>, ApiError> {
    match params::query_param(uri, "serviceDate") {
        Some(raw) => chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ApiError::from_engine_error(
                    transit_engine::error::EngineError::validation("serviceDate", format!("'{raw}' is not a valid YYYY-MM-DD date")),
                    now,
                )
            }),
        None => Ok(None),
    }
}
