//! Pure parsing and validation for operator-typed input.
//!
//! Every workflow prompt that accepts free text funnels through one of these
//! functions; a [`ValidationError`] always means "re-prompt the same step".

use crate::models::enums::RoomStatus;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static LISTING_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(www|m)\.avito\.ru/.*?/komnaty/.*").unwrap());

static CONTACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^((?:\+7|8)?(?:\d{10}))[\s-]*([АВСХавсх])[\s-](.*)$").unwrap());

static INSPECTION_CONTACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^((?:\+7|8)?(?:\d{10}))[\s-]*([АСПЖаспж])[\s-](.*)$").unwrap());

static FLAT_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[а-яА-Я]*$").unwrap());

static CADASTRAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+:\d+:\d+:\d+$").unwrap());

static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+([.,]\d+)?$").unwrap());

static ROOMS_INFO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)/(\d+(?:[.,]\d+)?)(?:[\s-]([ЖН]))?\(([^)]*)\)").unwrap()
});

static DAY_MONTH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{2})\.(\d{2})$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Input does not match the expected format")]
    Format,
    #[error("Inspection date cannot precede today")]
    DateInPast,
    #[error("Expected {expected} room entries, got {actual}")]
    RoomCountMismatch { expected: usize, actual: usize },
}

/// Seller contact parsed from a `phone status-name` line. Serializable so
/// it can travel inside a draft aggregate.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContactInfo {
    pub phone: String,
    pub status: String,
    pub name: String,
}

/// One group parsed out of the rooms-info free text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRoomInfo {
    pub number_on_plan: String,
    pub area: f64,
    pub status: RoomStatus,
    pub comment: String,
}

/// Whether the text is a marketplace rooms-listing URL.
pub fn is_listing_url(text: &str) -> bool {
    LISTING_URL_RE.is_match(text)
}

/// Rewrite a mobile-host listing URL to the canonical host.
pub fn canonicalize_listing_url(url: &str) -> String {
    url.replace("m.avito.ru", "www.avito.ru")
}

/// Normalize a phone to the leading-8 form: `+7XXXXXXXXXX` loses the prefix,
/// a bare 10-digit number starting with 9 gains a leading 8. Idempotent.
pub fn normalize_phone(phone: &str) -> String {
    let mut phone = phone.to_string();
    if let Some(rest) = phone.strip_prefix("+7") {
        phone = rest.to_string();
    }
    if phone.starts_with('9') {
        phone = format!("8{phone}");
    }
    phone
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str().to_lowercase().as_str(),
        None => String::new(),
    }
}

fn parse_contact_with(re: &Regex, input: &str, collapse: bool) -> Result<ContactInfo, ValidationError> {
    let caps = re.captures(input.trim()).ok_or(ValidationError::Format)?;

    let phone = normalize_phone(&caps[1]);
    let mut status = caps[2].to_uppercase();
    let name = capitalize(&caps[3]);

    // Two raw relationship codes collapse into one normalized code.
    if collapse && (status == "В" || status == "Х") {
        status = "С".to_string();
    }

    Ok(ContactInfo { phone, status, name })
}

/// Parse a seller contact line: optional +7/8 prefix, 10 digits, a single
/// relationship letter and a free-text name.
pub fn parse_contact(input: &str) -> Result<ContactInfo, ValidationError> {
    parse_contact_with(&CONTACT_RE, input, true)
}

/// Parse an inspection contact line (wider relationship-letter set, no
/// collapsing).
pub fn parse_inspection_contact(input: &str) -> Result<ContactInfo, ValidationError> {
    parse_contact_with(&INSPECTION_CONTACT_RE, input, false)
}

/// Parse a comma-or-dot decimal number.
pub fn parse_decimal(input: &str) -> Result<f64, ValidationError> {
    let input = input.trim();
    if !DECIMAL_RE.is_match(input) {
        return Err(ValidationError::Format);
    }
    input
        .replace(',', ".")
        .parse()
        .map_err(|_| ValidationError::Format)
}

/// Validate a flat number: digits plus optional Cyrillic letters.
pub fn parse_flat_number(input: &str) -> Result<String, ValidationError> {
    let input = input.trim();
    if FLAT_NUMBER_RE.is_match(input) {
        Ok(input.to_string())
    } else {
        Err(ValidationError::Format)
    }
}

/// Validate a manually entered cadastral number.
pub fn parse_cadastral_number(input: &str) -> Result<String, ValidationError> {
    let input = input.trim();
    if CADASTRAL_RE.is_match(input) {
        Ok(input.to_string())
    } else {
        Err(ValidationError::Format)
    }
}

/// Parse the rooms-info free text into its `<number>/<area>[-<marker>](<text>)`
/// groups. The caller enforces that the group count matches the flat's room
/// count.
pub fn parse_rooms_info(input: &str) -> Result<Vec<ParsedRoomInfo>, ValidationError> {
    let mut rooms = Vec::new();

    for caps in ROOMS_INFO_RE.captures_iter(input) {
        let area: f64 = caps[2]
            .replace(',', ".")
            .parse()
            .map_err(|_| ValidationError::Format)?;
        let status = match caps.get(3).map(|m| m.as_str()) {
            Some("Н") => RoomStatus::NonLiving,
            _ => RoomStatus::Living,
        };
        rooms.push(ParsedRoomInfo {
            number_on_plan: caps[1].to_string(),
            area,
            status,
            comment: caps[4].to_string(),
        });
    }

    if rooms.is_empty() {
        return Err(ValidationError::Format);
    }

    Ok(rooms)
}

/// Parse a `ДД.ММ` date in the current year; must not precede `today`.
pub fn parse_day_month(input: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let caps = DAY_MONTH_RE.captures(input.trim()).ok_or(ValidationError::Format)?;
    let day: u32 = caps[1].parse().map_err(|_| ValidationError::Format)?;
    let month: u32 = caps[2].parse().map_err(|_| ValidationError::Format)?;

    let date =
        NaiveDate::from_ymd_opt(today.year(), month, day).ok_or(ValidationError::Format)?;

    if date < today {
        return Err(ValidationError::DateInPast);
    }

    Ok(date)
}
