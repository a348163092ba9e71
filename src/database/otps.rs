use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime},
    Collection, Database,
};

use crate::errors::Result;
use crate::models::otp::OtpAttempt;

/// Persistence for OTP rows. The counter updates are conditional writes
/// keyed on the expected prior value, so two racing requests cannot both
/// claim the same transition.
#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn create(&self, attempt: &OtpAttempt) -> Result<()>;

    /// Most recently created row for the user, if any.
    async fn find_latest(&self, user_id: &ObjectId) -> Result<Option<OtpAttempt>>;

    /// Write a failed verification: bump `attempts` from `prev_attempts` and
    /// optionally set the lock in the same update. Returns false when another
    /// request already advanced the counter.
    async fn record_failed_attempt(
        &self,
        id: &ObjectId,
        prev_attempts: i32,
        attempts: i32,
        locked_until: Option<DateTime>,
    ) -> Result<bool>;

    /// Lock a still-unlocked row (resend-limit path). Returns false when the
    /// row was already locked by a concurrent request.
    async fn lock(&self, id: &ObjectId, locked_until: DateTime) -> Result<bool>;

    async fn delete_all_for_user(&self, user_id: &ObjectId) -> Result<()>;

    /// Maintenance: drop expired rows that carry no lock.
    async fn purge_expired(&self, now: DateTime) -> Result<u64>;

    /// Maintenance: clear lapsed locks and reset their attempt counters.
    async fn release_expired_locks(&self, now: DateTime) -> Result<u64>;
}

pub struct MongoOtpStore {
    collection: Collection<OtpAttempt>,
}

impl MongoOtpStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("otps"),
        }
    }
}

#[async_trait]
impl OtpStore for MongoOtpStore {
    async fn create(&self, attempt: &OtpAttempt) -> Result<()> {
        self.collection.insert_one(attempt).await?;
        Ok(())
    }

    async fn find_latest(&self, user_id: &ObjectId) -> Result<Option<OtpAttempt>> {
        let attempt = self
            .collection
            .find_one(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(attempt)
    }

    async fn record_failed_attempt(
        &self,
        id: &ObjectId,
        prev_attempts: i32,
        attempts: i32,
        locked_until: Option<DateTime>,
    ) -> Result<bool> {
        let filter = doc! { "_id": id, "attempts": prev_attempts };
        let mut fields = doc! { "attempts": attempts };
        if let Some(locked_until) = locked_until {
            fields.insert("locked_until", locked_until);
        }
        let result = self
            .collection
            .update_one(filter, doc! { "$set": fields })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn lock(&self, id: &ObjectId, locked_until: DateTime) -> Result<bool> {
        let filter = doc! { "_id": id, "locked_until": null };
        let update = doc! { "$set": { "locked_until": locked_until } };
        let result = self.collection.update_one(filter, update).await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_all_for_user(&self, user_id: &ObjectId) -> Result<()> {
        self.collection
            .delete_many(doc! { "user_id": user_id })
            .await?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime) -> Result<u64> {
        let filter = doc! {
            "expires_at": { "$lt": now },
            "locked_until": null,
        };
        let result = self.collection.delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    async fn release_expired_locks(&self, now: DateTime) -> Result<u64> {
        let filter = doc! { "locked_until": { "$lte": now } };
        let update = doc! { "$set": { "locked_until": null, "attempts": 0 } };
        let result = self.collection.update_many(filter, update).await?;
        Ok(result.modified_count)
    }
}
