//! Query-parameter extraction and validation shared by every handler.
//! Kept centralized so the `fieldErrors` vocabulary (§7) stays consistent
//! across endpoints instead of each handler inventing its own wording.

use axum::http::Uri;
use chrono::{DateTime, NaiveDate, Utc};
use transit_engine::error::{EngineError, EngineResult};

/// axum's router matches a path parameter against a whole segment, so a
/// route registered as `/agency/:agency_id` captures `KVG.json` verbatim
/// when the client requests the OBA-style `agency/KVG.json`; every
/// id-taking handler strips the suffix back off before using the value.
pub fn strip_json_suffix(raw: &str) -> &str {
    raw.strip_suffix(".json").unwrap_or(raw)
}

/// Finds the first `name=value` pair in a URI's query string, percent-
/// decoding only the minimal `+`-as-space convention form submissions use;
/// combined/entity ids never contain characters that need full percent-
/// decoding, and every caller of this helper is reading either an id, a
/// small number, or an API key.
pub fn query_param<'a>(uri: &'a Uri, name: &str) -> Option<&'a str> {
    uri.query()?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then_some(value)
    })
}

pub fn parse_f64(uri: &Uri, name: &str) -> EngineResult<Option<f64>> {
    match query_param(uri, name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| EngineError::validation(name, format!("'{raw}' is not a valid number"))),
        None => Ok(None),
    }
}

pub fn parse_i64(uri: &Uri, name: &str) -> EngineResult<Option<i64>> {
    match query_param(uri, name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| EngineError::validation(name, format!("'{raw}' is not a valid integer"))),
        None => Ok(None),
    }
}

pub fn require_f64(uri: &Uri, name: &str) -> EngineResult<f64> {
    parse_f64(uri, name)?.ok_or_else(|| EngineError::validation(name, "required parameter is missing"))
}

/// `maxCount` must fall in `[1,100]` (§7); defaults to `default_value` when
/// absent.
pub fn max_count(uri: &Uri, default_value: i64) -> EngineResult<usize> {
    let value = parse_i64(uri, "maxCount")?.unwrap_or(default_value);
    if !(1..=100).contains(&value) {
        return Err(EngineError::validation(
            "maxCount",
            "must be between 1 and 100",
        ));
    }
    Ok(value as usize)
}

/// `?date=YYYY-MM-DD`, defaulting to `fallback` when absent.
pub fn date_or(uri: &Uri, fallback: NaiveDate) -> EngineResult<NaiveDate> {
    match query_param(uri, "date") {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| EngineError::validation("date", format!("'{raw}' is not a valid YYYY-MM-DD date"))),
        None => Ok(fallback),
    }
}

/// `?time=<epoch-ms>`, defaulting to `fallback` when absent.
pub fn time_or(uri: &Uri, fallback: DateTime<Utc>) -> EngineResult<DateTime<Utc>> {
    match parse_i64(uri, "time")? {
        Some(millis) => DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| EngineError::validation("time", format!("'{millis}' is not a valid epoch-ms timestamp"))),
        None => Ok(fallback),
    }
}

/// `?name=true|false|1|0`, OBA-style include flags default to `true` when
/// the client omits them entirely (§6).
pub fn bool_or(uri: &Uri, name: &str, default_value: bool) -> bool {
    match query_param(uri, name) {
        Some(raw) => matches!(raw, "true" | "1"),
        None => default_value,
    }
}
