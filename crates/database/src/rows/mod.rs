//! Per-table row structs and their conversions into `model::*` types. No
//! generic `DatabaseRow`/origin-merge machinery (the teacher's `data_model`
//! module) — there is exactly one feed per store, so a row maps to a model
//! value one-to-one.

pub mod agency;
pub mod calendar;
pub mod route;
pub mod shape;
pub mod stop;
pub mod stop_time;
pub mod trip;
