use crate::state_machine::states::ListingState;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A room-for-sale record tracked through review. Deduplicated by URL;
/// never hard-deleted by the normal flow (cancellation is a status).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advertisement {
    pub id: i64,
    pub url: String,
    pub flat_id: i64,
    pub room_price: i64,
    pub room_area: f64,
    pub status: ListingState,
    pub contact_phone: String,
    pub contact_status: String,
    pub contact_name: String,
    pub description: String,
    pub ad_creation_date: Option<NaiveDate>,
    pub added_by: i64,
    pub added_at: NaiveDateTime,
    pub viewed_by: Option<i64>,
    pub viewed_at: Option<NaiveDateTime>,
    pub pinned_dispatcher: Option<i64>,
    pub pinned_agent: Option<i64>,
}

/// New Advertisement for creation (without generated fields). Always enters
/// the lifecycle in the initial state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdvertisement {
    pub url: String,
    pub room_price: i64,
    pub room_area: f64,
    pub contact_phone: String,
    pub contact_status: String,
    pub contact_name: String,
    pub description: String,
    pub ad_creation_date: Option<NaiveDate>,
    pub added_by: i64,
}

impl Advertisement {
    pub fn price_per_meter(&self) -> Option<i64> {
        if self.room_area > 0.0 {
            Some((self.room_price as f64 / self.room_area) as i64)
        } else {
            None
        }
    }
}
