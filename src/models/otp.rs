use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};

/// One issued OTP code. Only the most recently created row per user is ever
/// consulted; older rows stay behind until a successful verification purges
/// the whole history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpAttempt {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub code: String,
    pub attempts: i32,
    pub resend_count: i32,
    pub created_at: bson::DateTime,
    pub expires_at: bson::DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<bson::DateTime>,
}

impl OtpAttempt {
    pub fn new(
        user_id: ObjectId,
        code: String,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        resend_count: i32,
    ) -> Self {
        Self {
            _id: Some(ObjectId::new()),
            user_id,
            code,
            attempts: 0,
            resend_count,
            created_at: bson::DateTime::from_chrono(created_at),
            expires_at: bson::DateTime::from_chrono(expires_at),
            locked_until: None,
        }
    }

    pub fn object_id(&self) -> Result<ObjectId> {
        self._id
            .ok_or_else(|| AppError::invalid_data("OTP record missing id"))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at.to_chrono()
    }

    /// The lock timestamp, if a lock is still in force at `now`. A
    /// `locked_until` in the past counts as unlocked without any mutation.
    pub fn active_lock(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.locked_until
            .map(|lu| lu.to_chrono())
            .filter(|lu| now < *lu)
    }
}
