//! Postgres-backed [`ListingStore`].
//!
//! Enum columns are stored as text via their wire form; person and view
//! lists are JSONB. Uniqueness of listing URLs and flat cadastral numbers
//! is enforced by database constraints, and `create_listing` runs inside a
//! transaction so a failed bundle leaves no partial rows.

use super::{ListingBundle, ListingStore, StoreError, TransitionChange};
use crate::models::{
    Advertisement, Flat, House, Inspection, InspectionStatus, NewFlat, NewHouse, NewInspection,
    NewRoom, NewUser, Person, Room, User, UserRole, ViewType,
};
use crate::state_machine::states::ListingState;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::debug;

pub struct PgListingStore {
    pool: PgPool,
}

impl PgListingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_enum<T: std::str::FromStr>(raw: &str, column: &str) -> Result<T, StoreError> {
    raw.parse()
        .map_err(|_| StoreError::Database(format!("invalid {column} value: {raw}")))
}

fn parse_enum_opt<T: std::str::FromStr>(
    raw: Option<String>,
    column: &str,
) -> Result<Option<T>, StoreError> {
    raw.map(|s| parse_enum(&s, column)).transpose()
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        role: parse_enum(row.get::<&str, _>("role"), "role")?,
        system_first_name: row.get("system_first_name"),
        system_last_name: row.get("system_last_name"),
        system_sur_name: row.get("system_sur_name"),
        phone_number: row.get("phone_number"),
        created_at: row.get("created_at"),
    })
}

fn house_from_row(row: &PgRow) -> House {
    House {
        id: row.get("id"),
        cadastral_number: row.get("cadastral_number"),
        street_name: row.get("street_name"),
        number: row.get("number"),
        floor_count: row.get("floor_count"),
        is_historical: row.get("is_historical"),
        created_at: row.get("created_at"),
    }
}

fn flat_from_row(row: &PgRow) -> Result<Flat, StoreError> {
    let view_types: serde_json::Value = row.get("view_types");
    let view_types: Vec<ViewType> = serde_json::from_value(view_types)
        .map_err(|e| StoreError::Database(format!("invalid view_types value: {e}")))?;
    Ok(Flat {
        id: row.get("id"),
        house_id: row.get("house_id"),
        cadastral_number: row.get("cadastral_number"),
        flat_number: row.get("flat_number"),
        height: row.get("height"),
        room_count: row.get("room_count"),
        area: row.get("area"),
        floor: row.get("floor"),
        plan_image_ref: row.get("plan_image_ref"),
        elevator_nearby: row.get("elevator_nearby"),
        under_room_is_living: row.get("under_room_is_living"),
        house_entrance_type: parse_enum_opt(row.get("house_entrance_type"), "house_entrance_type")?,
        view_types,
        toilet_type: parse_enum_opt(row.get("toilet_type"), "toilet_type")?,
        created_at: row.get("created_at"),
    })
}

fn room_from_row(row: &PgRow) -> Result<Room, StoreError> {
    let owners: serde_json::Value = row.get("owners");
    let occupants: serde_json::Value = row.get("occupants");
    let decode = |v: serde_json::Value, col: &str| -> Result<Vec<Person>, StoreError> {
        serde_json::from_value(v)
            .map_err(|e| StoreError::Database(format!("invalid {col} value: {e}")))
    };
    Ok(Room {
        id: row.get("id"),
        flat_id: row.get("flat_id"),
        area: row.get("area"),
        number_on_plan: row.get("number_on_plan"),
        kind: parse_enum(row.get::<&str, _>("kind"), "kind")?,
        status: parse_enum(row.get::<&str, _>("status"), "status")?,
        owners: decode(owners, "owners")?,
        occupants: decode(occupants, "occupants")?,
        refusal_status: parse_enum(row.get::<&str, _>("refusal_status"), "refusal_status")?,
        comment: row.get("comment"),
    })
}

fn advertisement_from_row(row: &PgRow) -> Result<Advertisement, StoreError> {
    Ok(Advertisement {
        id: row.get("id"),
        url: row.get("url"),
        flat_id: row.get("flat_id"),
        room_price: row.get("room_price"),
        room_area: row.get("room_area"),
        status: parse_enum(row.get::<&str, _>("status"), "status")?,
        contact_phone: row.get("contact_phone"),
        contact_status: row.get("contact_status"),
        contact_name: row.get("contact_name"),
        description: row.get("description"),
        ad_creation_date: row.get("ad_creation_date"),
        added_by: row.get("added_by"),
        added_at: row.get("added_at"),
        viewed_by: row.get("viewed_by"),
        viewed_at: row.get("viewed_at"),
        pinned_dispatcher: row.get("pinned_dispatcher"),
        pinned_agent: row.get("pinned_agent"),
    })
}

fn inspection_from_row(row: &PgRow) -> Result<Inspection, StoreError> {
    Ok(Inspection {
        id: row.get("id"),
        advertisement_id: row.get("advertisement_id"),
        inspection_date: row.get("inspection_date"),
        period_start: row.get("period_start"),
        period_end: row.get("period_end"),
        status: parse_enum(row.get::<&str, _>("status"), "status")?,
        contact_phone: row.get("contact_phone"),
        contact_status: row.get("contact_status"),
        contact_name: row.get("contact_name"),
        meeting_tip_text: row.get("meeting_tip_text"),
        meeting_tip_photo_ref: row.get("meeting_tip_photo_ref"),
        created_at: row.get("created_at"),
    })
}

async fn insert_flat(
    tx: &mut Transaction<'_, Postgres>,
    house_id: i64,
    details: &NewFlat,
) -> Result<Flat, StoreError> {
    let view_types = serde_json::to_value(&details.view_types)
        .map_err(|e| StoreError::Database(e.to_string()))?;
    let row = sqlx::query(
        r#"
        INSERT INTO flats
            (house_id, cadastral_number, flat_number, height, room_count, area,
             floor, plan_image_ref, elevator_nearby, under_room_is_living,
             house_entrance_type, view_types, toilet_type)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(house_id)
    .bind(&details.cadastral_number)
    .bind(&details.flat_number)
    .bind(details.height)
    .bind(details.room_count)
    .bind(details.area)
    .bind(details.floor)
    .bind(&details.plan_image_ref)
    .bind(details.elevator_nearby)
    .bind(details.under_room_is_living)
    .bind(details.house_entrance_type.map(|e| e.to_string()))
    .bind(view_types)
    .bind(details.toilet_type.map(|t| t.to_string()))
    .fetch_one(&mut **tx)
    .await?;
    flat_from_row(&row)
}

async fn insert_rooms(
    tx: &mut Transaction<'_, Postgres>,
    flat_id: i64,
    rooms: &[NewRoom],
) -> Result<(), StoreError> {
    for room in rooms {
        let owners = serde_json::to_value(&room.owners)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let occupants = serde_json::to_value(&room.occupants)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO rooms
                (flat_id, area, number_on_plan, kind, status, owners,
                 occupants, refusal_status, comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(flat_id)
        .bind(room.area)
        .bind(&room.number_on_plan)
        .bind(room.kind.to_string())
        .bind(room.status.to_string())
        .bind(owners)
        .bind(occupants)
        .bind(room.refusal_status.to_string())
        .bind(&room.comment)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn upsert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, username, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
                SET username = COALESCE(EXCLUDED.username, users.username)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(user.role.to_string())
        .fetch_one(&self.pool)
        .await?;
        user_from_row(&row)
    }

    async fn set_role(&self, user_id: i64, role: UserRole) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(user_id)
            .bind(role.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "user",
                key: user_id.to_string(),
            });
        }
        Ok(())
    }

    async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query("SELECT * FROM users WHERE role = $1 ORDER BY id")
            .bind(role.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn get_house(&self, cadastral_number: &str) -> Result<Option<House>, StoreError> {
        let row = sqlx::query("SELECT * FROM houses WHERE cadastral_number = $1")
            .bind(cadastral_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(house_from_row))
    }

    async fn get_house_by_id(&self, id: i64) -> Result<Option<House>, StoreError> {
        let row = sqlx::query("SELECT * FROM houses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(house_from_row))
    }

    async fn create_house(&self, house: NewHouse) -> Result<House, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO houses
                (cadastral_number, street_name, number, floor_count, is_historical)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&house.cadastral_number)
        .bind(&house.street_name)
        .bind(&house.number)
        .bind(house.floor_count)
        .bind(house.is_historical)
        .fetch_one(&self.pool)
        .await?;
        Ok(house_from_row(&row))
    }

    async fn set_house_historical(&self, house_id: i64, value: bool) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE houses SET is_historical = $2 WHERE id = $1")
            .bind(house_id)
            .bind(value)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "house",
                key: house_id.to_string(),
            });
        }
        Ok(())
    }

    async fn get_flat(&self, cadastral_number: &str) -> Result<Option<Flat>, StoreError> {
        let row = sqlx::query("SELECT * FROM flats WHERE cadastral_number = $1")
            .bind(cadastral_number)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(flat_from_row).transpose()
    }

    async fn get_flat_by_id(&self, id: i64) -> Result<Option<Flat>, StoreError> {
        let row = sqlx::query("SELECT * FROM flats WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(flat_from_row).transpose()
    }

    async fn update_flat(&self, flat_id: i64, details: NewFlat) -> Result<Flat, StoreError> {
        let view_types = serde_json::to_value(&details.view_types)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let row = sqlx::query(
            r#"
            UPDATE flats SET
                cadastral_number = $2, flat_number = $3, height = $4,
                room_count = $5, area = $6, floor = $7, plan_image_ref = $8,
                elevator_nearby = $9, under_room_is_living = $10,
                house_entrance_type = $11, view_types = $12, toilet_type = $13
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(flat_id)
        .bind(&details.cadastral_number)
        .bind(&details.flat_number)
        .bind(details.height)
        .bind(details.room_count)
        .bind(details.area)
        .bind(details.floor)
        .bind(&details.plan_image_ref)
        .bind(details.elevator_nearby)
        .bind(details.under_room_is_living)
        .bind(details.house_entrance_type.map(|e| e.to_string()))
        .bind(view_types)
        .bind(details.toilet_type.map(|t| t.to_string()))
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => flat_from_row(&row),
            None => Err(StoreError::NotFound {
                entity: "flat",
                key: flat_id.to_string(),
            }),
        }
    }

    async fn get_rooms(&self, flat_id: i64) -> Result<Vec<Room>, StoreError> {
        let rows = sqlx::query("SELECT * FROM rooms WHERE flat_id = $1 ORDER BY id")
            .bind(flat_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(room_from_row).collect()
    }

    async fn replace_rooms(&self, flat_id: i64, rooms: Vec<NewRoom>) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM rooms WHERE flat_id = $1")
            .bind(flat_id)
            .execute(&mut *tx)
            .await?;
        insert_rooms(&mut tx, flat_id, &rooms).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_advertisement(&self, id: i64) -> Result<Option<Advertisement>, StoreError> {
        let row = sqlx::query("SELECT * FROM advertisements WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(advertisement_from_row).transpose()
    }

    async fn get_advertisement_by_url(
        &self,
        url: &str,
    ) -> Result<Option<Advertisement>, StoreError> {
        let row = sqlx::query("SELECT * FROM advertisements WHERE url = $1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(advertisement_from_row).transpose()
    }

    async fn create_listing(&self, bundle: ListingBundle) -> Result<Advertisement, StoreError> {
        let mut tx = self.pool.begin().await?;

        let house_id = match sqlx::query("SELECT id FROM houses WHERE cadastral_number = $1")
            .bind(&bundle.house.cadastral_number)
            .fetch_optional(&mut *tx)
            .await?
        {
            Some(row) => {
                let id = row.get::<i64, _>("id");
                // Back-fill a historical answer given for an already-known house
                if let Some(value) = bundle.house.is_historical {
                    sqlx::query("UPDATE houses SET is_historical = $2 WHERE id = $1")
                        .bind(id)
                        .bind(value)
                        .execute(&mut *tx)
                        .await?;
                }
                id
            }
            None => {
                let row = sqlx::query(
                    r#"
                    INSERT INTO houses
                        (cadastral_number, street_name, number, floor_count, is_historical)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id
                    "#,
                )
                .bind(&bundle.house.cadastral_number)
                .bind(&bundle.house.street_name)
                .bind(&bundle.house.number)
                .bind(bundle.house.floor_count)
                .bind(bundle.house.is_historical)
                .fetch_one(&mut *tx)
                .await?;
                row.get::<i64, _>("id")
            }
        };

        let flat = insert_flat(&mut tx, house_id, &bundle.flat).await?;
        insert_rooms(&mut tx, flat.id, &bundle.rooms).await?;

        let ad = &bundle.advertisement;
        let row = sqlx::query(
            r#"
            INSERT INTO advertisements
                (url, flat_id, room_price, room_area, status, contact_phone,
                 contact_status, contact_name, description, ad_creation_date, added_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&ad.url)
        .bind(flat.id)
        .bind(ad.room_price)
        .bind(ad.room_area)
        .bind(ListingState::New.to_string())
        .bind(&ad.contact_phone)
        .bind(&ad.contact_status)
        .bind(&ad.contact_name)
        .bind(&ad.description)
        .bind(ad.ad_creation_date)
        .bind(ad.added_by)
        .fetch_one(&mut *tx)
        .await?;
        let advertisement = advertisement_from_row(&row)?;

        tx.commit().await?;
        debug!(
            advertisement_id = advertisement.id,
            flat_id = flat.id,
            house_id,
            "Created listing"
        );
        Ok(advertisement)
    }

    async fn apply_transition(
        &self,
        id: i64,
        new_status: ListingState,
        change: TransitionChange,
    ) -> Result<Advertisement, StoreError> {
        // One UPDATE carries the entire write set of the transition
        let row = sqlx::query(
            r#"
            UPDATE advertisements
            SET status = $2,
                pinned_dispatcher = COALESCE($3, pinned_dispatcher),
                pinned_agent = COALESCE($4, pinned_agent),
                viewed_by = COALESCE($5, viewed_by),
                viewed_at = CASE WHEN $5::BIGINT IS NULL THEN viewed_at ELSE $6 END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new_status.to_string())
        .bind(change.dispatcher_id)
        .bind(change.agent_id)
        .bind(change.viewed_by)
        .bind(Utc::now().naive_utc())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => advertisement_from_row(&row),
            None => Err(StoreError::NotFound {
                entity: "advertisement",
                key: id.to_string(),
            }),
        }
    }

    async fn update_contact(
        &self,
        id: i64,
        phone: &str,
        status: &str,
        name: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE advertisements
            SET contact_phone = $2, contact_status = $3, contact_name = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(phone)
        .bind(status)
        .bind(name)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "advertisement",
                key: id.to_string(),
            });
        }
        Ok(())
    }

    async fn create_inspection(
        &self,
        inspection: NewInspection,
    ) -> Result<Inspection, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO inspections
                (advertisement_id, inspection_date, period_start, period_end,
                 status, contact_phone, contact_status, contact_name,
                 meeting_tip_text, meeting_tip_photo_ref)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(inspection.advertisement_id)
        .bind(inspection.inspection_date)
        .bind(inspection.period_start)
        .bind(inspection.period_end)
        .bind(InspectionStatus::Planned.to_string())
        .bind(&inspection.contact_phone)
        .bind(&inspection.contact_status)
        .bind(&inspection.contact_name)
        .bind(&inspection.meeting_tip_text)
        .bind(&inspection.meeting_tip_photo_ref)
        .fetch_one(&self.pool)
        .await?;
        inspection_from_row(&row)
    }

    async fn get_inspections(&self, advertisement_id: i64) -> Result<Vec<Inspection>, StoreError> {
        let rows = sqlx::query("SELECT * FROM inspections WHERE advertisement_id = $1 ORDER BY id")
            .bind(advertisement_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(inspection_from_row).collect()
    }

    async fn update_inspection_status(
        &self,
        id: i64,
        status: InspectionStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE inspections SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "inspection",
                key: id.to_string(),
            });
        }
        Ok(())
    }
}
