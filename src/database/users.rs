use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime},
    Collection, Database,
};

use crate::errors::Result;
use crate::models::user::User;

/// Account lookup and the two mutations the verification flows perform.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> Result<()>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>>;
    async fn mark_verified(&self, id: &ObjectId) -> Result<()>;
    async fn set_password_hash(&self, id: &ObjectId, password_hash: &str) -> Result<()>;
    async fn delete(&self, id: &ObjectId) -> Result<()>;
}

pub struct MongoUserStore {
    collection: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, user: &User) -> Result<()> {
        self.collection.insert_one(user).await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self.collection.find_one(doc! { "email": email }).await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>> {
        let user = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(user)
    }

    async fn mark_verified(&self, id: &ObjectId) -> Result<()> {
        let update = doc! {
            "$set": {
                "is_verified": true,
                "updated_at": DateTime::now(),
            }
        };
        self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(())
    }

    async fn set_password_hash(&self, id: &ObjectId, password_hash: &str) -> Result<()> {
        let update = doc! {
            "$set": {
                "password_hash": password_hash,
                "updated_at": DateTime::now(),
            }
        };
        self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(())
    }

    async fn delete(&self, id: &ObjectId) -> Result<()> {
        self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(())
    }
}
