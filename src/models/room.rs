use super::enums::{Person, RefusalStatus, RoomKind, RoomStatus};
use serde::{Deserialize, Serialize};

/// A single room of a [`super::Flat`]. Room sets are replaced wholesale;
/// there is no partial per-room edit operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub flat_id: i64,
    pub area: f64,
    pub number_on_plan: String,
    pub kind: RoomKind,
    pub status: RoomStatus,
    pub owners: Vec<Person>,
    pub occupants: Vec<Person>,
    pub refusal_status: RefusalStatus,
    pub comment: String,
}

/// New Room for creation (without generated fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRoom {
    pub area: f64,
    pub number_on_plan: String,
    pub kind: RoomKind,
    pub status: RoomStatus,
    pub owners: Vec<Person>,
    pub occupants: Vec<Person>,
    pub refusal_status: RefusalStatus,
    pub comment: String,
}

impl NewRoom {
    /// A room seeded from the rooms-info free-text step, carrying the fixed
    /// defaults for fields the text form does not collect.
    pub fn with_defaults(number_on_plan: String, area: f64, status: RoomStatus, comment: String) -> Self {
        Self {
            area,
            number_on_plan,
            kind: RoomKind::Living,
            status,
            owners: vec![Person::Male],
            occupants: vec![Person::Male],
            refusal_status: RefusalStatus::No,
            comment,
        }
    }
}
