//! Data layer: the physical-unit hierarchy (House/Flat/Room), the tracked
//! Advertisement, operators, and planned inspections.

pub mod advertisement;
pub mod enums;
pub mod flat;
pub mod house;
pub mod inspection;
pub mod room;
pub mod user;

pub use advertisement::{Advertisement, NewAdvertisement};
pub use enums::{
    EntranceType, InspectionStatus, Person, RefusalStatus, RoomKind, RoomStatus, ToiletType,
    UserRole, ViewType,
};
pub use flat::{Flat, NewFlat};
pub use house::{House, NewHouse};
pub use inspection::{Inspection, NewInspection};
pub use room::{NewRoom, Room};
pub use user::{NewUser, User};
