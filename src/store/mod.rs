//! Persistence boundary for listings and their physical-unit hierarchy.
//!
//! The workflow engine and the lifecycle state machine talk to a
//! [`ListingStore`] trait object; the Postgres implementation enforces
//! uniqueness with storage-level constraints (the authoritative duplicate
//! signal), the in-memory implementation mirrors those semantics for tests.

pub mod memory;
pub mod postgres;

pub use memory::MemoryListingStore;
pub use postgres::PgListingStore;

use crate::models::{
    Advertisement, Flat, House, Inspection, InspectionStatus, NewAdvertisement, NewFlat, NewHouse,
    NewInspection, NewRoom, NewUser, Room, User, UserRole,
};
use crate::state_machine::states::ListingState;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("A listing with this URL already exists")]
    DuplicateListing,
    #[error("A flat with this cadastral number already exists")]
    DuplicateFlat,
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or_default();
                if constraint.contains("url") {
                    return StoreError::DuplicateListing;
                }
                if constraint.contains("flat") {
                    return StoreError::DuplicateFlat;
                }
            }
        }
        StoreError::Database(err.to_string())
    }
}

/// Everything a listing needs to be persisted in one atomic operation:
/// house (created on first reference), flat (deduplicated by cadastral
/// number), the wholesale room list, and the advertisement row itself.
#[derive(Debug, Clone)]
pub struct ListingBundle {
    pub house: NewHouse,
    pub flat: NewFlat,
    pub rooms: Vec<NewRoom>,
    pub advertisement: NewAdvertisement,
}

/// The full write set of one lifecycle transition. `None` fields keep their
/// stored value; `viewed_by` also stamps `viewed_at`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionChange {
    pub dispatcher_id: Option<i64>,
    pub agent_id: Option<i64>,
    pub viewed_by: Option<i64>,
}

#[async_trait]
pub trait ListingStore: Send + Sync {
    // Users
    async fn get_user(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn upsert_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn set_role(&self, user_id: i64, role: UserRole) -> Result<(), StoreError>;
    async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>, StoreError>;

    // Houses
    async fn get_house(&self, cadastral_number: &str) -> Result<Option<House>, StoreError>;
    async fn get_house_by_id(&self, id: i64) -> Result<Option<House>, StoreError>;
    async fn create_house(&self, house: NewHouse) -> Result<House, StoreError>;
    async fn set_house_historical(&self, house_id: i64, value: bool) -> Result<(), StoreError>;

    // Flats
    async fn get_flat(&self, cadastral_number: &str) -> Result<Option<Flat>, StoreError>;
    async fn get_flat_by_id(&self, id: i64) -> Result<Option<Flat>, StoreError>;
    async fn update_flat(&self, flat_id: i64, details: NewFlat) -> Result<Flat, StoreError>;

    // Rooms (wholesale replacement only)
    async fn get_rooms(&self, flat_id: i64) -> Result<Vec<Room>, StoreError>;
    async fn replace_rooms(&self, flat_id: i64, rooms: Vec<NewRoom>) -> Result<(), StoreError>;

    // Advertisements
    async fn get_advertisement(&self, id: i64) -> Result<Option<Advertisement>, StoreError>;
    async fn get_advertisement_by_url(
        &self,
        url: &str,
    ) -> Result<Option<Advertisement>, StoreError>;
    /// Atomic create of House (if new), Flat (deduplicated), Rooms, and
    /// Advertisement. A failure anywhere leaves no partial rows behind.
    async fn create_listing(&self, bundle: ListingBundle) -> Result<Advertisement, StoreError>;
    /// Persist one lifecycle transition as a single read-modify-write:
    /// status, attachments, and viewing stamp land together or not at all.
    /// Returns the advertisement as written.
    async fn apply_transition(
        &self,
        id: i64,
        new_status: ListingState,
        change: TransitionChange,
    ) -> Result<Advertisement, StoreError>;
    async fn update_contact(
        &self,
        id: i64,
        phone: &str,
        status: &str,
        name: &str,
    ) -> Result<(), StoreError>;

    // Inspections
    async fn create_inspection(&self, inspection: NewInspection)
        -> Result<Inspection, StoreError>;
    async fn get_inspections(&self, advertisement_id: i64) -> Result<Vec<Inspection>, StoreError>;
    async fn update_inspection_status(
        &self,
        id: i64,
        status: InspectionStatus,
    ) -> Result<(), StoreError>;
}
