use super::enums::UserRole;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An operator, keyed by external identity id. Created lazily on first
/// interaction; role changes are an explicit admin action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub role: UserRole,
    pub system_first_name: Option<String>,
    pub system_last_name: Option<String>,
    pub system_sur_name: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: NaiveDateTime,
}

/// New User for lazy creation on first interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub id: i64,
    pub username: Option<String>,
    pub role: UserRole,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Short display form: first name plus initials of last and middle name.
    pub fn short_fio(&self) -> String {
        let first = self.system_first_name.as_deref().unwrap_or("");
        let last = self
            .system_last_name
            .as_deref()
            .and_then(|s| s.chars().next())
            .map(|c| format!(" {c}."))
            .unwrap_or_default();
        let sur = self
            .system_sur_name
            .as_deref()
            .and_then(|s| s.chars().next())
            .map(|c| format!("{c}."))
            .unwrap_or_default();
        format!("{first}{last}{sur}")
    }
}
