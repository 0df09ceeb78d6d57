use serde::{Deserialize, Serialize};
use std::fmt;

/// Role mapped from the external identity of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Guest,
    Admin,
    Dispatcher,
    Agent,
}

impl UserRole {
    /// Reviewer roles that can be pinned to a listing.
    pub fn is_reviewer(&self) -> bool {
        matches!(self, Self::Dispatcher | Self::Agent)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guest => write!(f, "guest"),
            Self::Admin => write!(f, "admin"),
            Self::Dispatcher => write!(f, "dispatcher"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Self::Guest),
            "admin" => Ok(Self::Admin),
            "dispatcher" => Ok(Self::Dispatcher),
            "agent" => Ok(Self::Agent),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

/// Physical kind of a room on the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Living,
    Mop,
    Kitchen,
    Bathroom,
    Closet,
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Living => write!(f, "living"),
            Self::Mop => write!(f, "mop"),
            Self::Kitchen => write!(f, "kitchen"),
            Self::Bathroom => write!(f, "bathroom"),
            Self::Closet => write!(f, "closet"),
        }
    }
}

impl std::str::FromStr for RoomKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "living" => Ok(Self::Living),
            "mop" => Ok(Self::Mop),
            "kitchen" => Ok(Self::Kitchen),
            "bathroom" => Ok(Self::Bathroom),
            "closet" => Ok(Self::Closet),
            _ => Err(format!("Invalid room kind: {s}")),
        }
    }
}

/// Occupancy status of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Living,
    NonLiving,
    ForRent,
    Relative,
    Government,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Living => write!(f, "living"),
            Self::NonLiving => write!(f, "non_living"),
            Self::ForRent => write!(f, "for_rent"),
            Self::Relative => write!(f, "relative"),
            Self::Government => write!(f, "government"),
        }
    }
}

impl std::str::FromStr for RoomStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "living" => Ok(Self::Living),
            "non_living" => Ok(Self::NonLiving),
            "for_rent" => Ok(Self::ForRent),
            "relative" => Ok(Self::Relative),
            "government" => Ok(Self::Government),
            _ => Err(format!("Invalid room status: {s}")),
        }
    }
}

/// An owner or occupant of a room. Multisets of these describe who holds
/// and who lives in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Person {
    Male,
    Female,
    Old,
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
            Self::Old => write!(f, "old"),
        }
    }
}

impl std::str::FromStr for Person {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "old" => Ok(Self::Old),
            _ => Err(format!("Invalid person kind: {s}")),
        }
    }
}

/// Seller's refusal state for a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefusalStatus {
    No,
    DirectSale,
    CrossSale,
    Notarized,
    Written,
    OtherRoomOfSeller,
}

impl RefusalStatus {
    /// Whether this refusal state marks the room as sellable, which makes it
    /// eligible for the per-room sale breakdown in yield calculations.
    pub fn is_for_sale(&self) -> bool {
        matches!(self, Self::DirectSale | Self::CrossSale)
    }
}

impl fmt::Display for RefusalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::No => write!(f, "no"),
            Self::DirectSale => write!(f, "direct_sale"),
            Self::CrossSale => write!(f, "cross_sale"),
            Self::Notarized => write!(f, "notarized"),
            Self::Written => write!(f, "written"),
            Self::OtherRoomOfSeller => write!(f, "other_room_of_seller"),
        }
    }
}

impl std::str::FromStr for RefusalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no" => Ok(Self::No),
            "direct_sale" => Ok(Self::DirectSale),
            "cross_sale" => Ok(Self::CrossSale),
            "notarized" => Ok(Self::Notarized),
            "written" => Ok(Self::Written),
            "other_room_of_seller" => Ok(Self::OtherRoomOfSeller),
            _ => Err(format!("Invalid refusal status: {s}")),
        }
    }
}

/// Where the building entrance opens onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntranceType {
    Street,
    Yard,
    Arch,
    Separate,
}

impl fmt::Display for EntranceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Street => write!(f, "street"),
            Self::Yard => write!(f, "yard"),
            Self::Arch => write!(f, "arch"),
            Self::Separate => write!(f, "separate"),
        }
    }
}

impl std::str::FromStr for EntranceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "street" => Ok(Self::Street),
            "yard" => Ok(Self::Yard),
            "arch" => Ok(Self::Arch),
            "separate" => Ok(Self::Separate),
            _ => Err(format!("Invalid entrance type: {s}")),
        }
    }
}

/// What the room's windows look out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    Street,
    Yard,
    Park,
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Street => write!(f, "street"),
            Self::Yard => write!(f, "yard"),
            Self::Park => write!(f, "park"),
        }
    }
}

impl std::str::FromStr for ViewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "street" => Ok(Self::Street),
            "yard" => Ok(Self::Yard),
            "park" => Ok(Self::Park),
            _ => Err(format!("Invalid view type: {s}")),
        }
    }
}

/// Bathroom arrangement of the flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToiletType {
    Combined,
    Separate,
    WithoutBath,
    ShowerOnKitchen,
}

impl fmt::Display for ToiletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Combined => write!(f, "combined"),
            Self::Separate => write!(f, "separate"),
            Self::WithoutBath => write!(f, "without_bath"),
            Self::ShowerOnKitchen => write!(f, "shower_on_kitchen"),
        }
    }
}

impl std::str::FromStr for ToiletType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "combined" => Ok(Self::Combined),
            "separate" => Ok(Self::Separate),
            "without_bath" => Ok(Self::WithoutBath),
            "shower_on_kitchen" => Ok(Self::ShowerOnKitchen),
            _ => Err(format!("Invalid toilet type: {s}")),
        }
    }
}

/// Lifecycle status of a planned inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    Planned,
    Done,
    Canceled,
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planned => write!(f, "planned"),
            Self::Done => write!(f, "done"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

impl std::str::FromStr for InspectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(Self::Planned),
            "done" => Ok(Self::Done),
            "canceled" => Ok(Self::Canceled),
            _ => Err(format!("Invalid inspection status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_string_conversion() {
        assert_eq!(UserRole::Dispatcher.to_string(), "dispatcher");
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_refusal_sale_eligibility() {
        assert!(RefusalStatus::DirectSale.is_for_sale());
        assert!(RefusalStatus::CrossSale.is_for_sale());
        assert!(!RefusalStatus::No.is_for_sale());
        assert!(!RefusalStatus::Notarized.is_for_sale());
    }

    #[test]
    fn test_enum_serde() {
        let status = RoomStatus::NonLiving;
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"non_living\"");

        let parsed: RoomStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, status);
    }
}
