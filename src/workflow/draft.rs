use crate::models::{NewAdvertisement, NewFlat, NewHouse, NewRoom};
use crate::store::ListingBundle;
use crate::validation::ContactInfo;
use serde::{Deserialize, Serialize};

/// The progressively filled, not-yet-persisted listing. Every field is
/// optional until the workflow reaches completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftListing {
    pub url: Option<String>,
    pub room_price: Option<i64>,
    pub room_area: Option<f64>,
    pub description: Option<String>,
    /// Display address from the scrape, used as the enrichment query base
    pub house_address: Option<String>,
    pub house: Option<NewHouse>,
    pub flat: NewFlat,
    pub rooms: Option<Vec<NewRoom>>,
    pub contact: Option<ContactInfo>,
}

impl DraftListing {
    /// Assemble the atomic creation bundle. Returns `None` while any of the
    /// mandatory pieces is still missing.
    pub fn into_bundle(self, added_by: i64) -> Option<ListingBundle> {
        let contact = self.contact?;
        Some(ListingBundle {
            house: self.house?,
            flat: self.flat,
            rooms: self.rooms.unwrap_or_default(),
            advertisement: NewAdvertisement {
                url: self.url?,
                room_price: self.room_price?,
                room_area: self.room_area?,
                contact_phone: contact.phone,
                contact_status: contact.status,
                contact_name: contact.name,
                description: self.description.unwrap_or_default(),
                ad_creation_date: None,
                added_by,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_draft_yields_no_bundle() {
        let draft = DraftListing {
            url: Some("https://www.avito.ru/spb/komnaty/1".to_string()),
            ..Default::default()
        };
        assert!(draft.into_bundle(1).is_none());
    }

    #[test]
    fn test_complete_draft_yields_bundle() {
        let draft = DraftListing {
            url: Some("https://www.avito.ru/spb/komnaty/1".to_string()),
            room_price: Some(1_500_000),
            room_area: Some(18.0),
            description: Some("описание".to_string()),
            house_address: Some("Лиговский пр-т 12".to_string()),
            house: Some(NewHouse {
                cadastral_number: "78:01:01:1".to_string(),
                street_name: "Лиговский пр-т".to_string(),
                number: "12".to_string(),
                floor_count: 5,
                is_historical: None,
            }),
            flat: NewFlat::default(),
            rooms: None,
            contact: Some(ContactInfo {
                phone: "89219876543".to_string(),
                status: "А".to_string(),
                name: "Анна".to_string(),
            }),
        };
        let bundle = draft.into_bundle(7).unwrap();
        assert_eq!(bundle.advertisement.added_by, 7);
        assert_eq!(bundle.advertisement.room_price, 1_500_000);
        assert!(bundle.rooms.is_empty());
    }

    #[test]
    fn test_draft_with_contact_round_trips_through_json() {
        let draft = DraftListing {
            url: Some("https://www.avito.ru/spb/komnaty/1".to_string()),
            contact: Some(ContactInfo {
                phone: "89219876543".to_string(),
                status: "С".to_string(),
                name: "Мария".to_string(),
            }),
            ..Default::default()
        };
        let json = serde_json::to_string(&draft).unwrap();
        let restored: DraftListing = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.contact, draft.contact);
        assert_eq!(restored.url, draft.url);
    }
}
