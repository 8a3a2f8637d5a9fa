use std::collections::HashMap;

use async_trait::async_trait;
use bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{Shipment, Store, User};

/// In-memory store with the same contract as the Mongo one. Used by the
/// test suite and by `AppState::fake()`; ids are real ObjectIds so handler
/// code can't tell the difference.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    shipments: RwLock<Vec<Shipment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_username_and_email(
        &self,
        username: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .get(username)
            .filter(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(&self, user: User) -> anyhow::Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            anyhow::bail!("duplicate username: {}", user.username);
        }
        if users.values().any(|u| u.email == user.email) {
            anyhow::bail!("duplicate email: {}", user.email);
        }
        users.insert(user.username.clone(), user);
        Ok(())
    }

    async fn set_password_hash(&self, username: &str, password_hash: &str) -> anyhow::Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(username)
            .ok_or_else(|| anyhow::anyhow!("no such user: {username}"))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn insert_shipment(&self, mut shipment: Shipment) -> anyhow::Result<Shipment> {
        shipment.id = Some(ObjectId::new());
        self.shipments.write().await.push(shipment.clone());
        Ok(shipment)
    }

    async fn find_shipment(
        &self,
        id: ObjectId,
        user_id: &str,
    ) -> anyhow::Result<Option<Shipment>> {
        Ok(self
            .shipments
            .read()
            .await
            .iter()
            .find(|s| s.id == Some(id) && s.user_id == user_id)
            .cloned())
    }

    async fn list_shipments(&self, user_id: &str) -> anyhow::Result<Vec<Shipment>> {
        let mut shipments: Vec<Shipment> = self
            .shipments
            .read()
            .await
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        shipments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shipments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Role;

    fn user(username: &str, email: &str) -> User {
        User {
            username: username.into(),
            email: email.into(),
            full_name: None,
            disabled: None,
            role: Role::User,
            password_hash: "hash".into(),
            created_at: bson::DateTime::now(),
        }
    }

    fn shipment(user_id: &str, item: &str) -> Shipment {
        Shipment {
            id: None,
            item_name: item.into(),
            quantity: 1,
            description: None,
            status: "created".into(),
            user_id: user_id.into(),
            created_at: bson::DateTime::now(),
        }
    }

    #[tokio::test]
    async fn insert_and_find_user() {
        let store = MemoryStore::new();
        store.insert_user(user("alice", "a@x.com")).await.unwrap();
        let found = store.find_user("alice").await.unwrap().unwrap();
        assert_eq!(found.email, "a@x.com");
        assert!(store.find_user("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let store = MemoryStore::new();
        store.insert_user(user("alice", "a@x.com")).await.unwrap();
        assert!(store.insert_user(user("alice", "b@x.com")).await.is_err());
    }

    #[tokio::test]
    async fn find_user_by_email_matches_any_username() {
        let store = MemoryStore::new();
        store.insert_user(user("alice", "a@x.com")).await.unwrap();
        let found = store.find_user_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.username, "alice");
        assert!(store.find_user_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_username_and_email_requires_both() {
        let store = MemoryStore::new();
        store.insert_user(user("alice", "a@x.com")).await.unwrap();
        assert!(store
            .find_user_by_username_and_email("alice", "a@x.com")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_user_by_username_and_email("alice", "wrong@x.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn set_password_hash_overwrites() {
        let store = MemoryStore::new();
        store.insert_user(user("alice", "a@x.com")).await.unwrap();
        store.set_password_hash("alice", "new-hash").await.unwrap();
        let found = store.find_user("alice").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "new-hash");
    }

    #[tokio::test]
    async fn shipments_assigned_ids_and_scoped_to_owner() {
        let store = MemoryStore::new();
        let a = store.insert_shipment(shipment("alice", "Widget")).await.unwrap();
        let b = store.insert_shipment(shipment("alice", "Gadget")).await.unwrap();
        store.insert_shipment(shipment("bob", "Gizmo")).await.unwrap();

        assert!(a.id.is_some());
        assert_ne!(a.id, b.id);

        let listed = store.list_shipments("alice").await.unwrap();
        assert_eq!(listed.len(), 2);

        // bob cannot see alice's shipment by id
        assert!(store
            .find_shipment(a.id.unwrap(), "bob")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_shipment(a.id.unwrap(), "alice")
            .await
            .unwrap()
            .is_some());
    }
}
