use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::trip::Trip;

/// A block is not a stored entity of its own — it is the set of trips
/// sharing a `blockId`, identified only by that raw string. `Block` exists
/// as a nominal id anchor so `"{agencyId}_{blockId}"` composite ids have
/// somewhere to point (the `/block/{id}` endpoint of §6).
pub struct Block;

impl HasId for Block {
    type IdType = String;
}

/// One entry in a block's service-date-ordered trip sequence, as produced
/// by the block-sequence resolver.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockTripSummary {
    pub trip_id: Id<Trip>,
    /// Index of this trip within the block's service-active ordering for
    /// the queried date; a bijection onto `[0, trips.len())`.
    pub block_sequence: usize,
    pub accumulated_stop_time_count: usize,
}
