//! Per-route-group `Cache-Control` values (§6): static lookups cache for
//! five minutes, realtime-backed endpoints for thirty seconds, writes and
//! errors never cache at all.

use axum::http::HeaderValue;
use tower_http::set_header::SetResponseHeaderLayer;

pub fn static_cache() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=300"),
    )
}

pub fn realtime_cache() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=30"),
    )
}

pub fn no_cache() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    )
}
