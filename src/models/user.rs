//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account.
///
/// Accounts created through a login provider carry the provider name and the
/// provider's user id; locally registered accounts leave both empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub admin: bool,
    pub provider: String,
    pub provider_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether `self` may edit a resource authored by `author_id`
    pub fn can_edit(&self, author_id: i64) -> bool {
        self.admin || self.id == author_id
    }
}

/// Input for registering a local account
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

/// Input for updating an account. Blank password and email mean "unchanged".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
    /// Checkbox value; only honoured when the editor is an admin
    #[serde(default)]
    pub admin: Option<String>,
}

impl UpdateUserInput {
    /// Interpret the admin checkbox
    pub fn admin_flag(&self) -> bool {
        matches!(
            self.admin.as_deref(),
            Some("on") | Some("true") | Some("1")
        )
    }
}

/// Email + password login form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, admin: bool) -> User {
        let now = Utc::now();
        User {
            id,
            name: "Ada".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            admin,
            provider: String::new(),
            provider_id: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_can_edit() {
        assert!(user(1, false).can_edit(1));
        assert!(!user(1, false).can_edit(2));
        assert!(user(1, true).can_edit(2));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_string(&user(1, false)).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(json.contains("\"username\":\"ada\""));
    }

    #[test]
    fn test_admin_flag() {
        let mut input = UpdateUserInput::default();
        assert!(!input.admin_flag());
        input.admin = Some("on".to_string());
        assert!(input.admin_flag());
    }
}
