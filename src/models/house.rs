use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A building, keyed externally by its cadastral number. Created on first
/// reference; street and floor count are immutable once set, only the
/// historical-monument flag may be back-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub id: i64,
    pub cadastral_number: String,
    pub street_name: String,
    pub number: String,
    pub floor_count: i32,
    pub is_historical: Option<bool>,
    pub created_at: NaiveDateTime,
}

/// New House for creation (without generated fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHouse {
    pub cadastral_number: String,
    pub street_name: String,
    pub number: String,
    pub floor_count: i32,
    pub is_historical: Option<bool>,
}

impl House {
    /// Display address of the house.
    pub fn address(&self) -> String {
        format!("{} {}", self.street_name, self.number)
    }
}
