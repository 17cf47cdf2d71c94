use std::fmt::Debug;

use schemars::JsonSchema;
use serde::Serialize;
use utility::id::{HasId, Id};

pub mod agency;
pub mod block;
pub mod calendar;
pub mod realtime;
pub mod route;
pub mod shape;
pub mod stop;
pub mod trip;

/// Wraps a value together with the id it is addressed by. Response graphs
/// are built by id-lookup, not pointer chasing, which is what breaks the
/// natural cyclic ownership between agencies, routes, and trips.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct WithId<V>
where
    V: HasId,
    V::IdType: Serialize + Debug + Clone,
{
    pub id: Id<V>,
    #[serde(flatten)]
    pub content: V,
}

impl<V> WithId<V>
where
    V: HasId,
    V::IdType: Serialize + Debug + Clone,
{
    pub fn new(id: Id<V>, content: V) -> Self {
        Self { id, content }
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithDistance<T> {
    pub distance_meters: f64,
    #[serde(flatten)]
    pub content: T,
}

impl<T> WithDistance<T> {
    pub fn new(distance_meters: f64, content: T) -> Self {
        Self {
            distance_meters,
            content,
        }
    }
}
