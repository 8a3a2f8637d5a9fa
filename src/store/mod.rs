use async_trait::async_trait;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Closed set of roles accepted at signup. The wire format is lowercase
/// ("admin", "user"); anything else fails deserialization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::User => f.write_str("user"),
        }
    }
}

/// User record as persisted in the `users` collection.
///
/// `password_hash` only ever holds argon2 output; plaintext passwords are
/// hashed in the signup handler and never reach the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub disabled: Option<bool>,
    pub role: Role,
    pub password_hash: String,
    pub created_at: bson::DateTime,
}

/// Shipment record as persisted in the `shipments` collection.
///
/// `id` is assigned by the store on insert. `user_id` is the creating
/// user's username and is never updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub item_name: String,
    pub quantity: i64,
    pub description: Option<String>,
    pub status: String,
    pub user_id: String,
    pub created_at: bson::DateTime,
}

/// Document-store surface the handlers run against: lookup by key, insert,
/// and update-by-filter. Backed by MongoDB in production and by
/// [`MemoryStore`] in tests.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, username: &str) -> anyhow::Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    /// Both fields must match the same document (used by password reset).
    async fn find_user_by_username_and_email(
        &self,
        username: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>>;

    /// Fails if the username or email is already taken.
    async fn insert_user(&self, user: User) -> anyhow::Result<()>;

    async fn set_password_hash(&self, username: &str, password_hash: &str) -> anyhow::Result<()>;

    /// Inserts the shipment and returns it with the store-assigned id.
    async fn insert_shipment(&self, shipment: Shipment) -> anyhow::Result<Shipment>;

    async fn find_shipment(
        &self,
        id: ObjectId,
        user_id: &str,
    ) -> anyhow::Result<Option<Shipment>>;

    /// Shipments created by `user_id`, newest first.
    async fn list_shipments(&self, user_id: &str) -> anyhow::Result<Vec<Shipment>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_lowercase() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn role_rejects_unknown_strings() {
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
        assert!(serde_json::from_str::<Role>("\"Admin\"").is_err());
    }

    #[test]
    fn shipment_without_id_skips_id_field() {
        let shipment = Shipment {
            id: None,
            item_name: "Widget".into(),
            quantity: 5,
            description: None,
            status: "created".into(),
            user_id: "alice".into(),
            created_at: bson::DateTime::now(),
        };
        let doc = bson::to_document(&shipment).unwrap();
        assert!(!doc.contains_key("_id"));
    }
}
