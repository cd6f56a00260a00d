use serde::{Deserialize, Serialize};

pub const DEFAULT_CHAIR_ID: &str = "chair-1";

/// Occupancy report for one chair, as accepted by `POST /api/chairs`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChairUpdate {
    #[serde(rename = "chairId")]
    pub chair_id: String,
    pub is_occupied: bool,
}

impl ChairUpdate {
    pub fn new(chair_id: impl Into<String>, is_occupied: bool) -> Self {
        Self {
            chair_id: chair_id.into(),
            is_occupied,
        }
    }
}

impl Default for ChairUpdate {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIR_ID, true)
    }
}
