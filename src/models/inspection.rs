use super::enums::InspectionStatus;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A scheduled on-site visit, created once when a listing is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub id: i64,
    pub advertisement_id: i64,
    pub inspection_date: NaiveDate,
    pub period_start: NaiveTime,
    pub period_end: NaiveTime,
    pub status: InspectionStatus,
    pub contact_phone: String,
    pub contact_status: String,
    pub contact_name: String,
    pub meeting_tip_text: Option<String>,
    pub meeting_tip_photo_ref: Option<String>,
    pub created_at: NaiveDateTime,
}

/// New Inspection for creation (without generated fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInspection {
    pub advertisement_id: i64,
    pub inspection_date: NaiveDate,
    pub period_start: NaiveTime,
    pub period_end: NaiveTime,
    pub contact_phone: String,
    pub contact_status: String,
    pub contact_name: String,
    pub meeting_tip_text: Option<String>,
    pub meeting_tip_photo_ref: Option<String>,
}
