pub mod auth;
pub mod cache_control;
pub mod request_id;
