//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Table occupancy status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
}

/// Dining table entity
///
/// Tables are a fixed set created once at store initialization. A table
/// is marked occupied by the order lifecycle, not derived live, so
/// peers may briefly disagree until the next sync event arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: u32,
    pub status: TableStatus,
    pub capacity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_order_id: Option<String>,
}

impl Table {
    /// Build the default dining floor: `count` tables, all available,
    /// with the stock capacity mix (every third table seats 6, every
    /// other remaining one seats 4, the rest seat 2).
    pub fn default_floor(count: u32) -> Vec<Table> {
        (0..count)
            .map(|i| Table {
                id: i + 1,
                status: TableStatus::Available,
                capacity: if i % 3 == 0 {
                    6
                } else if i % 2 == 0 {
                    4
                } else {
                    2
                },
                current_order_id: None,
            })
            .collect()
    }
}

/// Default number of tables on the floor
pub const DEFAULT_TABLE_COUNT: u32 = 20;
