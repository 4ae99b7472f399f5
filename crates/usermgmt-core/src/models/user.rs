use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Role literal that grants access to admin-only routes. Compared case-sensitively.
pub const ADMIN_ROLE: &str = "ADMIN";

/// A user record as returned by the server.
///
/// Only `id` is required on the wire; the server omits null fields in some
/// responses and older session files may carry a reduced record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    /// Best name for display: full name, then username, then the numeric id.
    pub fn display_name(&self) -> String {
        self.full_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.username.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("user #{}", self.id))
    }

    pub fn status(&self) -> UserStatus {
        UserStatus::from_str(self.status.as_deref())
    }
}

/// Account status as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Inactive,
    Unknown,
}

impl UserStatus {
    pub fn from_str(s: Option<&str>) -> Self {
        match s {
            Some("ACTIVE") => UserStatus::Active,
            Some("INACTIVE") => UserStatus::Inactive,
            _ => UserStatus::Unknown,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UserStatus::Active => "Active",
            UserStatus::Inactive => "Inactive",
            UserStatus::Unknown => "Unknown",
        }
    }
}

/// Partial update for `PUT users/{id}`. Unset fields are left unchanged by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.full_name.is_none()
            && self.phone.is_none()
            && self.role.is_none()
            && self.status.is_none()
    }

    /// Apply a `key=value` assignment. Returns false for an unknown key.
    pub fn set_field(&mut self, key: &str, value: &str) -> bool {
        let value = Some(value.to_string());
        match key {
            "email" => self.email = value,
            "fullName" | "full_name" | "name" => self.full_name = value,
            "phone" => self.phone = value,
            "role" => self.role = value,
            "status" => self.status = value,
            _ => return false,
        }
        true
    }
}
