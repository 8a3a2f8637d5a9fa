use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::store::{Role, User};

/// Request body for POST /signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub password: String,
}

/// Form body for POST /token.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Response for POST /token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// Request body for POST /reset-password. Both fields must identify the
/// same user.
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub username: String,
    pub email: String,
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub disabled: Option<bool>,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            disabled: user.disabled,
            role: user.role,
            created_at: user.created_at.to_time_0_3(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_never_serializes_hash() {
        let user = User {
            username: "alice".into(),
            email: "a@x.com".into(),
            full_name: None,
            disabled: None,
            role: Role::User,
            password_hash: "$argon2id$secret".into(),
            created_at: bson::DateTime::now(),
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("alice"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }
}
