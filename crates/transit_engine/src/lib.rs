//! The query-fusion engine: fuses the immutable static schedule (served
//! through [`store::ScheduleStore`]) with whatever real-time data the last
//! feed poll left in the [`snapshot::SnapshotHandle`] into the response
//! shapes a transit-information API exposes. Nothing in this crate speaks
//! HTTP or SQL; [`engine::Engine`] is the seam the `web` and `database`
//! crates build on from either side.

pub mod arrivals;
pub mod block;
pub mod engine;
pub mod error;
pub mod rate_limit;
pub mod reference;
pub mod request_id;
pub mod schedule;
pub mod search;
pub mod shape;
pub mod shape_geometry;
pub mod snapshot;
pub mod stale;
pub mod store;
pub mod time;
pub mod trip_status;

pub use engine::{Engine, EngineConfig};
pub use error::{EngineError, EngineResult};
