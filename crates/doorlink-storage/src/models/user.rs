use chrono::{DateTime, Utc};
use doorlink_core::AccessCode;
use serde::{Deserialize, Serialize};

/// A person allowed to open the door with a keypad code.
///
/// # Database Schema
///
/// Maps to the `users` table; `access_code` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub access_code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Identifier as recorded in audit entries and access responses.
    #[must_use]
    pub fn subject_id(&self) -> String {
        self.id.to_string()
    }
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub access_code: AccessCode,
    pub is_active: bool,
}

impl NewUser {
    pub fn new(name: impl Into<String>, access_code: AccessCode) -> Self {
        Self {
            name: name.into(),
            access_code,
            is_active: true,
        }
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub access_code: Option<AccessCode>,
    pub is_active: Option<bool>,
}

impl UserUpdate {
    /// Returns `true` if the update would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.access_code.is_none() && self.is_active.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults_active() {
        let user = NewUser::new("Admin", AccessCode::new("1234").unwrap());
        assert!(user.is_active);
        assert!(!user.active(false).is_active);
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let user = User {
            id: 3,
            name: "Usuario1".to_string(),
            access_code: "5678".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["accessCode"], "5678");
        assert_eq!(json["isActive"], true);
        assert_eq!(user.subject_id(), "3");
    }

    #[test]
    fn test_empty_update() {
        assert!(UserUpdate::default().is_empty());
        let update = UserUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
