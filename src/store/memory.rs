//! In-memory [`ListingStore`] with the same dedup and atomicity semantics as
//! the Postgres implementation; used by unit and integration tests.

use super::{ListingBundle, ListingStore, StoreError, TransitionChange};
use crate::models::{
    Advertisement, Flat, House, Inspection, NewFlat, NewHouse, NewInspection, NewRoom, NewUser,
    Room, User, UserRole,
};
use crate::state_machine::states::ListingState;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    houses: HashMap<i64, House>,
    flats: HashMap<i64, Flat>,
    rooms: HashMap<i64, Room>,
    advertisements: HashMap<i64, Advertisement>,
    inspections: HashMap<i64, Inspection>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryListingStore {
    inner: RwLock<Inner>,
    /// Test hook: make the next room insertion fail to exercise the
    /// all-or-nothing guarantee of `create_listing`.
    pub fail_next_room_insert: AtomicBool,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_flat(id: i64, house_id: i64, details: &NewFlat) -> Flat {
        Flat {
            id,
            house_id,
            cadastral_number: details.cadastral_number.clone(),
            flat_number: details.flat_number.clone(),
            height: details.height,
            room_count: details.room_count,
            area: details.area,
            floor: details.floor,
            plan_image_ref: details.plan_image_ref.clone(),
            elevator_nearby: details.elevator_nearby,
            under_room_is_living: details.under_room_is_living,
            house_entrance_type: details.house_entrance_type,
            view_types: details.view_types.clone(),
            toilet_type: details.toilet_type,
            created_at: Utc::now().naive_utc(),
        }
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn upsert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write();
        let entry = inner.users.entry(user.id).or_insert_with(|| User {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            system_first_name: None,
            system_last_name: None,
            system_sur_name: None,
            phone_number: None,
            created_at: Utc::now().naive_utc(),
        });
        if user.username.is_some() {
            entry.username = user.username;
        }
        Ok(entry.clone())
    }

    async fn set_role(&self, user_id: i64, role: UserRole) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let user = inner.users.get_mut(&user_id).ok_or(StoreError::NotFound {
            entity: "user",
            key: user_id.to_string(),
        })?;
        user.role = role;
        Ok(())
    }

    async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self
            .inner
            .read()
            .users
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn get_house(&self, cadastral_number: &str) -> Result<Option<House>, StoreError> {
        Ok(self
            .inner
            .read()
            .houses
            .values()
            .find(|h| h.cadastral_number == cadastral_number)
            .cloned())
    }

    async fn get_house_by_id(&self, id: i64) -> Result<Option<House>, StoreError> {
        Ok(self.inner.read().houses.get(&id).cloned())
    }

    async fn create_house(&self, house: NewHouse) -> Result<House, StoreError> {
        let mut inner = self.inner.write();
        if inner
            .houses
            .values()
            .any(|h| h.cadastral_number == house.cadastral_number)
        {
            return Err(StoreError::Database(format!(
                "house {} already exists",
                house.cadastral_number
            )));
        }
        let id = inner.next_id();
        let house = House {
            id,
            cadastral_number: house.cadastral_number,
            street_name: house.street_name,
            number: house.number,
            floor_count: house.floor_count,
            is_historical: house.is_historical,
            created_at: Utc::now().naive_utc(),
        };
        inner.houses.insert(id, house.clone());
        Ok(house)
    }

    async fn set_house_historical(&self, house_id: i64, value: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let house = inner.houses.get_mut(&house_id).ok_or(StoreError::NotFound {
            entity: "house",
            key: house_id.to_string(),
        })?;
        house.is_historical = Some(value);
        Ok(())
    }

    async fn get_flat(&self, cadastral_number: &str) -> Result<Option<Flat>, StoreError> {
        Ok(self
            .inner
            .read()
            .flats
            .values()
            .find(|f| f.cadastral_number.as_deref() == Some(cadastral_number))
            .cloned())
    }

    async fn get_flat_by_id(&self, id: i64) -> Result<Option<Flat>, StoreError> {
        Ok(self.inner.read().flats.get(&id).cloned())
    }

    async fn update_flat(&self, flat_id: i64, details: NewFlat) -> Result<Flat, StoreError> {
        let mut inner = self.inner.write();
        let house_id = inner
            .flats
            .get(&flat_id)
            .map(|f| f.house_id)
            .ok_or(StoreError::NotFound {
                entity: "flat",
                key: flat_id.to_string(),
            })?;
        let created_at = inner.flats[&flat_id].created_at;
        let mut flat = Self::build_flat(flat_id, house_id, &details);
        flat.created_at = created_at;
        inner.flats.insert(flat_id, flat.clone());
        Ok(flat)
    }

    async fn get_rooms(&self, flat_id: i64) -> Result<Vec<Room>, StoreError> {
        let mut rooms: Vec<Room> = self
            .inner
            .read()
            .rooms
            .values()
            .filter(|r| r.flat_id == flat_id)
            .cloned()
            .collect();
        rooms.sort_by_key(|r| r.id);
        Ok(rooms)
    }

    async fn replace_rooms(&self, flat_id: i64, rooms: Vec<NewRoom>) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        inner.rooms.retain(|_, r| r.flat_id != flat_id);
        for room in rooms {
            let id = inner.next_id();
            inner.rooms.insert(
                id,
                Room {
                    id,
                    flat_id,
                    area: room.area,
                    number_on_plan: room.number_on_plan,
                    kind: room.kind,
                    status: room.status,
                    owners: room.owners,
                    occupants: room.occupants,
                    refusal_status: room.refusal_status,
                    comment: room.comment,
                },
            );
        }
        Ok(())
    }

    async fn get_advertisement(&self, id: i64) -> Result<Option<Advertisement>, StoreError> {
        Ok(self.inner.read().advertisements.get(&id).cloned())
    }

    async fn get_advertisement_by_url(
        &self,
        url: &str,
    ) -> Result<Option<Advertisement>, StoreError> {
        Ok(self
            .inner
            .read()
            .advertisements
            .values()
            .find(|a| a.url == url)
            .cloned())
    }

    async fn create_listing(&self, bundle: ListingBundle) -> Result<Advertisement, StoreError> {
        let mut inner = self.inner.write();

        // Constraint checks first: nothing is inserted unless the whole
        // bundle can be.
        if inner
            .advertisements
            .values()
            .any(|a| a.url == bundle.advertisement.url)
        {
            return Err(StoreError::DuplicateListing);
        }
        if let Some(cadnum) = &bundle.flat.cadastral_number {
            if inner
                .flats
                .values()
                .any(|f| f.cadastral_number.as_deref() == Some(cadnum))
            {
                return Err(StoreError::DuplicateFlat);
            }
        }
        if self.fail_next_room_insert.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Database("room insert failed".to_string()));
        }

        let house_id = match inner
            .houses
            .values()
            .find(|h| h.cadastral_number == bundle.house.cadastral_number)
            .map(|h| h.id)
        {
            Some(id) => {
                // Back-fill a historical answer given for an already-known house
                if let Some(value) = bundle.house.is_historical {
                    if let Some(house) = inner.houses.get_mut(&id) {
                        house.is_historical = Some(value);
                    }
                }
                id
            }
            None => {
                let id = inner.next_id();
                inner.houses.insert(
                    id,
                    House {
                        id,
                        cadastral_number: bundle.house.cadastral_number.clone(),
                        street_name: bundle.house.street_name.clone(),
                        number: bundle.house.number.clone(),
                        floor_count: bundle.house.floor_count,
                        is_historical: bundle.house.is_historical,
                        created_at: Utc::now().naive_utc(),
                    },
                );
                id
            }
        };

        let flat_id = inner.next_id();
        let flat = Self::build_flat(flat_id, house_id, &bundle.flat);
        inner.flats.insert(flat_id, flat);

        for room in bundle.rooms {
            let id = inner.next_id();
            inner.rooms.insert(
                id,
                Room {
                    id,
                    flat_id,
                    area: room.area,
                    number_on_plan: room.number_on_plan,
                    kind: room.kind,
                    status: room.status,
                    owners: room.owners,
                    occupants: room.occupants,
                    refusal_status: room.refusal_status,
                    comment: room.comment,
                },
            );
        }

        let ad_id = inner.next_id();
        let ad = Advertisement {
            id: ad_id,
            url: bundle.advertisement.url,
            flat_id,
            room_price: bundle.advertisement.room_price,
            room_area: bundle.advertisement.room_area,
            status: ListingState::New,
            contact_phone: bundle.advertisement.contact_phone,
            contact_status: bundle.advertisement.contact_status,
            contact_name: bundle.advertisement.contact_name,
            description: bundle.advertisement.description,
            ad_creation_date: bundle.advertisement.ad_creation_date,
            added_by: bundle.advertisement.added_by,
            added_at: Utc::now().naive_utc(),
            viewed_by: None,
            viewed_at: None,
            pinned_dispatcher: None,
            pinned_agent: None,
        };
        inner.advertisements.insert(ad_id, ad.clone());
        Ok(ad)
    }

    async fn apply_transition(
        &self,
        id: i64,
        new_status: ListingState,
        change: TransitionChange,
    ) -> Result<Advertisement, StoreError> {
        let mut inner = self.inner.write();
        let ad = inner.advertisements.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "advertisement",
            key: id.to_string(),
        })?;
        ad.status = new_status;
        if let Some(dispatcher_id) = change.dispatcher_id {
            ad.pinned_dispatcher = Some(dispatcher_id);
        }
        if let Some(agent_id) = change.agent_id {
            ad.pinned_agent = Some(agent_id);
        }
        if let Some(viewed_by) = change.viewed_by {
            ad.viewed_by = Some(viewed_by);
            ad.viewed_at = Some(Utc::now().naive_utc());
        }
        Ok(ad.clone())
    }

    async fn update_contact(
        &self,
        id: i64,
        phone: &str,
        status: &str,
        name: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let ad = inner.advertisements.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "advertisement",
            key: id.to_string(),
        })?;
        ad.contact_phone = phone.to_string();
        ad.contact_status = status.to_string();
        ad.contact_name = name.to_string();
        Ok(())
    }

    async fn create_inspection(
        &self,
        inspection: NewInspection,
    ) -> Result<Inspection, StoreError> {
        let mut inner = self.inner.write();
        if !inner
            .advertisements
            .contains_key(&inspection.advertisement_id)
        {
            return Err(StoreError::NotFound {
                entity: "advertisement",
                key: inspection.advertisement_id.to_string(),
            });
        }
        let id = inner.next_id();
        let inspection = Inspection {
            id,
            advertisement_id: inspection.advertisement_id,
            inspection_date: inspection.inspection_date,
            period_start: inspection.period_start,
            period_end: inspection.period_end,
            status: crate::models::InspectionStatus::Planned,
            contact_phone: inspection.contact_phone,
            contact_status: inspection.contact_status,
            contact_name: inspection.contact_name,
            meeting_tip_text: inspection.meeting_tip_text,
            meeting_tip_photo_ref: inspection.meeting_tip_photo_ref,
            created_at: Utc::now().naive_utc(),
        };
        inner.inspections.insert(id, inspection.clone());
        Ok(inspection)
    }

    async fn get_inspections(&self, advertisement_id: i64) -> Result<Vec<Inspection>, StoreError> {
        let mut inspections: Vec<Inspection> = self
            .inner
            .read()
            .inspections
            .values()
            .filter(|i| i.advertisement_id == advertisement_id)
            .cloned()
            .collect();
        inspections.sort_by_key(|i| i.id);
        Ok(inspections)
    }

    async fn update_inspection_status(
        &self,
        id: i64,
        status: crate::models::InspectionStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let inspection = inner.inspections.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "inspection",
            key: id.to_string(),
        })?;
        inspection.status = status;
        Ok(())
    }
}
