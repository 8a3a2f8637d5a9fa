use anyhow::Context;
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{
    options::{FindOptions, IndexOptions},
    Collection, Database, IndexModel,
};
use tracing::info;

use super::{Shipment, Store, User};

/// MongoDB-backed store. One instance per process, shared through
/// `Arc<dyn Store>` in [`crate::state::AppState`].
#[derive(Clone)]
pub struct MongoStore {
    users: Collection<User>,
    shipments: Collection<Shipment>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            users: db.collection("users"),
            shipments: db.collection("shipments"),
        }
    }

    /// Creates the unique indexes on `users.username` and `users.email`.
    /// Duplicate signups racing past the handler's existence check hit
    /// these instead of producing two documents.
    pub async fn ensure_indexes(&self) -> anyhow::Result<()> {
        for field in ["username", "email"] {
            let index = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.users
                .create_index(index, None)
                .await
                .with_context(|| format!("create unique index on users.{field}"))?;
        }
        info!("unique indexes on users.username and users.email ensured");
        Ok(())
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn find_user(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = self
            .users
            .find_one(doc! { "username": username }, None)
            .await
            .context("find user by username")?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = self
            .users
            .find_one(doc! { "email": email }, None)
            .await
            .context("find user by email")?;
        Ok(user)
    }

    async fn find_user_by_username_and_email(
        &self,
        username: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = self
            .users
            .find_one(doc! { "username": username, "email": email }, None)
            .await
            .context("find user by username and email")?;
        Ok(user)
    }

    async fn insert_user(&self, user: User) -> anyhow::Result<()> {
        self.users
            .insert_one(&user, None)
            .await
            .context("insert user")?;
        Ok(())
    }

    async fn set_password_hash(&self, username: &str, password_hash: &str) -> anyhow::Result<()> {
        self.users
            .update_one(
                doc! { "username": username },
                doc! { "$set": { "password_hash": password_hash } },
                None,
            )
            .await
            .context("update password hash")?;
        Ok(())
    }

    async fn insert_shipment(&self, mut shipment: Shipment) -> anyhow::Result<Shipment> {
        let result = self
            .shipments
            .insert_one(&shipment, None)
            .await
            .context("insert shipment")?;
        let id = result
            .inserted_id
            .as_object_id()
            .context("inserted shipment id is not an ObjectId")?;
        shipment.id = Some(id);
        Ok(shipment)
    }

    async fn find_shipment(
        &self,
        id: ObjectId,
        user_id: &str,
    ) -> anyhow::Result<Option<Shipment>> {
        let shipment = self
            .shipments
            .find_one(doc! { "_id": id, "user_id": user_id }, None)
            .await
            .context("find shipment")?;
        Ok(shipment)
    }

    async fn list_shipments(&self, user_id: &str) -> anyhow::Result<Vec<Shipment>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();
        let shipments = self
            .shipments
            .find(doc! { "user_id": user_id }, options)
            .await
            .context("list shipments")?
            .try_collect()
            .await
            .context("drain shipment cursor")?;
        Ok(shipments)
    }
}
