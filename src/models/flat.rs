use super::enums::{EntranceType, ToiletType, ViewType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A flat inside a [`super::House`]. At most one flat may exist per cadastral
/// number; the workflow's duplicate check and the storage-layer unique
/// constraint both enforce this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flat {
    pub id: i64,
    pub house_id: i64,
    pub cadastral_number: Option<String>,
    pub flat_number: Option<String>,
    pub height: Option<f64>,
    pub room_count: Option<i32>,
    pub area: Option<f64>,
    pub floor: Option<i32>,
    pub plan_image_ref: Option<String>,
    pub elevator_nearby: Option<bool>,
    pub under_room_is_living: Option<bool>,
    pub house_entrance_type: Option<EntranceType>,
    pub view_types: Vec<ViewType>,
    pub toilet_type: Option<ToiletType>,
    pub created_at: NaiveDateTime,
}

/// New Flat for creation (without generated fields).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFlat {
    pub cadastral_number: Option<String>,
    pub flat_number: Option<String>,
    pub height: Option<f64>,
    pub room_count: Option<i32>,
    pub area: Option<f64>,
    pub floor: Option<i32>,
    pub plan_image_ref: Option<String>,
    pub elevator_nearby: Option<bool>,
    pub under_room_is_living: Option<bool>,
    pub house_entrance_type: Option<EntranceType>,
    pub view_types: Vec<ViewType>,
    pub toilet_type: Option<ToiletType>,
}
