use super::draft::DraftListing;
use super::session::{EditScope, WorkflowMode};
use crate::models::{EntranceType, ToiletType, ViewType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Steps of the draft-collection sequence. The ordering lives in
/// [`next_step`]; the enum itself is just the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStep {
    SubmitUrl,
    PlanImage,
    ContactPhone,
    FlatNumber,
    CadastralNumber,
    FlatArea,
    FlatHeight,
    HouseIsHistorical,
    ElevatorNearby,
    RoomUnderIsLiving,
    EntranceType,
    WindowsType,
    ToiletType,
    RoomsInfo,
    Complete,
}

impl DraftStep {
    /// User-facing prompt for the step
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::SubmitUrl => "Пришлите ссылку на объявление",
            Self::PlanImage => "Пришлите план квартиры",
            Self::ContactPhone => "Телефон, статус и имя продавца (например: 89219876543 А-Анна)",
            Self::FlatNumber => "Номер квартиры (/0 чтобы пропустить)",
            Self::CadastralNumber => "Кадастровый номер квартиры (/0 чтобы пропустить)",
            Self::FlatArea => "Площадь квартиры (/0 чтобы пропустить)",
            Self::FlatHeight => "Высота потолков (/0 чтобы пропустить)",
            Self::HouseIsHistorical => "Дом является памятником?",
            Self::ElevatorNearby => "Лифт рядом с квартирой?",
            Self::RoomUnderIsLiving => "Помещение этажом ниже жилое?",
            Self::EntranceType => "Тип входа в парадную",
            Self::WindowsType => "Куда выходят окна",
            Self::ToiletType => "Тип санузла",
            Self::RoomsInfo => "Комнаты: номер/площадь-Ж(комментарий), через запятую",
            Self::Complete => "Готово",
        }
    }

    /// Whether the step may be skipped with an explicit skip input
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::FlatNumber
                | Self::CadastralNumber
                | Self::FlatArea
                | Self::FlatHeight
                | Self::HouseIsHistorical
                | Self::ElevatorNearby
                | Self::RoomUnderIsLiving
                | Self::EntranceType
                | Self::WindowsType
                | Self::ToiletType
                | Self::RoomsInfo
        )
    }
}

impl fmt::Display for DraftStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubmitUrl => write!(f, "submit_url"),
            Self::PlanImage => write!(f, "plan_image"),
            Self::ContactPhone => write!(f, "contact_phone"),
            Self::FlatNumber => write!(f, "flat_number"),
            Self::CadastralNumber => write!(f, "cadastral_number"),
            Self::FlatArea => write!(f, "flat_area"),
            Self::FlatHeight => write!(f, "flat_height"),
            Self::HouseIsHistorical => write!(f, "house_is_historical"),
            Self::ElevatorNearby => write!(f, "elevator_nearby"),
            Self::RoomUnderIsLiving => write!(f, "room_under_is_living"),
            Self::EntranceType => write!(f, "entrance_type"),
            Self::WindowsType => write!(f, "windows_type"),
            Self::ToiletType => write!(f, "toilet_type"),
            Self::RoomsInfo => write!(f, "rooms_info"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// One selected value of a fixed-option keyboard, decoded at the transport
/// boundary into a typed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "choice", content = "value", rename_all = "snake_case")]
pub enum ChoiceInput {
    YesNo(bool),
    Entrance(EntranceType),
    View(ViewType),
    Toilet(ToiletType),
}

/// Operator input, already shaped by the transport layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "input", content = "value", rename_all = "snake_case")]
pub enum StepInput {
    Text(String),
    Image(String),
    Choice(ChoiceInput),
    Skip,
    Cancel,
}

/// The one place where step ordering and its branch conditions live.
///
/// Branches:
/// - `CadastralNumber` is reached only when `FlatNumber` could not resolve a
///   flat cadastral identifier;
/// - `FlatArea` is skipped when enrichment already supplied the area;
/// - `RoomUnderIsLiving` is asked only on the second floor.
pub fn next_step(current: DraftStep, draft: &DraftListing, mode: &WorkflowMode) -> DraftStep {
    if let WorkflowMode::Edit {
        scope: EditScope::Media,
        ..
    } = mode
    {
        if current == DraftStep::ContactPhone {
            return DraftStep::Complete;
        }
    }

    match current {
        DraftStep::SubmitUrl => DraftStep::PlanImage,
        DraftStep::PlanImage => DraftStep::ContactPhone,
        DraftStep::ContactPhone => DraftStep::FlatNumber,
        DraftStep::FlatNumber => {
            if draft.flat.cadastral_number.is_some() {
                after_cadastral(draft)
            } else {
                DraftStep::CadastralNumber
            }
        }
        DraftStep::CadastralNumber => after_cadastral(draft),
        DraftStep::FlatArea => DraftStep::FlatHeight,
        DraftStep::FlatHeight => DraftStep::HouseIsHistorical,
        DraftStep::HouseIsHistorical => DraftStep::ElevatorNearby,
        DraftStep::ElevatorNearby => {
            if draft.flat.floor == Some(2) {
                DraftStep::RoomUnderIsLiving
            } else {
                DraftStep::EntranceType
            }
        }
        DraftStep::RoomUnderIsLiving => DraftStep::EntranceType,
        DraftStep::EntranceType => DraftStep::WindowsType,
        DraftStep::WindowsType => DraftStep::ToiletType,
        DraftStep::ToiletType => DraftStep::RoomsInfo,
        DraftStep::RoomsInfo | DraftStep::Complete => DraftStep::Complete,
    }
}

fn after_cadastral(draft: &DraftListing) -> DraftStep {
    if draft.flat.area.is_some() {
        DraftStep::FlatHeight
    } else {
        DraftStep::FlatArea
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewFlat;

    fn draft_with_flat(flat: NewFlat) -> DraftListing {
        DraftListing {
            flat,
            ..Default::default()
        }
    }

    #[test]
    fn test_cadastral_step_skipped_when_resolved() {
        let draft = draft_with_flat(NewFlat {
            cadastral_number: Some("78:01:01:1:10".to_string()),
            ..Default::default()
        });
        assert_eq!(
            next_step(DraftStep::FlatNumber, &draft, &WorkflowMode::Create),
            DraftStep::FlatArea
        );
    }

    #[test]
    fn test_area_step_skipped_when_prefilled() {
        let draft = draft_with_flat(NewFlat {
            cadastral_number: Some("78:01:01:1:10".to_string()),
            area: Some(80.0),
            ..Default::default()
        });
        assert_eq!(
            next_step(DraftStep::FlatNumber, &draft, &WorkflowMode::Create),
            DraftStep::FlatHeight
        );
    }

    #[test]
    fn test_room_under_only_on_second_floor() {
        let second = draft_with_flat(NewFlat {
            floor: Some(2),
            ..Default::default()
        });
        let fifth = draft_with_flat(NewFlat {
            floor: Some(5),
            ..Default::default()
        });
        assert_eq!(
            next_step(DraftStep::ElevatorNearby, &second, &WorkflowMode::Create),
            DraftStep::RoomUnderIsLiving
        );
        assert_eq!(
            next_step(DraftStep::ElevatorNearby, &fifth, &WorkflowMode::Create),
            DraftStep::EntranceType
        );
    }

    #[test]
    fn test_media_edit_stops_after_contact() {
        let mode = WorkflowMode::Edit {
            advertisement_id: 1,
            flat_id: 1,
            scope: EditScope::Media,
        };
        assert_eq!(
            next_step(DraftStep::ContactPhone, &DraftListing::default(), &mode),
            DraftStep::Complete
        );
    }
}
