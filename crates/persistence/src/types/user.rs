//! Storefront users.

use serde::{Deserialize, Serialize};

use super::validate;
use super::{Entity, EntityKind};
use crate::credentials;
use crate::error::ValidationError;

/// Access role of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Storage spellings, default first.
    pub const VALUES: &'static [&'static str] = &["user", "admin"];
}

/// A registered user.
///
/// The stored password hash is loaded for verification but is never
/// serialized back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(rename = "password", default, skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Checks a plaintext password against the stored hash.
    ///
    /// Users without a password (e.g. imported customers) never verify.
    pub fn verify_password(&self, password: &str) -> bool {
        self.password_hash
            .as_deref()
            .is_some_and(|hash| credentials::verify_password(password, hash))
    }

    /// Returns `true` for administrators.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for creating a user. `password` is plaintext and hashed before it is
/// persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::email(EntityKind::User, "email", &self.email)
    }
}

/// Partial update for a user. A provided `password` is plaintext.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.email {
            Some(email) => validate::email(EntityKind::User, "email", email),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_never_serializes_password() {
        let user: User = serde_json::from_value(json!({
            "id": "u-1",
            "email": "lan@example.vn",
            "name": "Lan",
            "role": "admin",
            "password": "$argon2id$v=19$stub",
            "createdAt": 1,
            "updatedAt": 1
        }))
        .unwrap();
        assert!(user.password_hash.is_some());
        assert!(user.is_admin());

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password").is_none());
    }

    #[test]
    fn test_role_default() {
        assert_eq!(Role::default(), Role::User);
        assert_eq!(Role::VALUES[0], "user");
    }
}
