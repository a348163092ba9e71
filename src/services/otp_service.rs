use std::sync::Arc;

use bcrypt::{hash, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use mongodb::bson;
use rand::{rngs::OsRng, Rng};

use crate::database::otps::OtpStore;
use crate::database::users::UserStore;
use crate::errors::Result;
use crate::models::otp::OtpAttempt;
use crate::models::user::User;
use crate::services::email_service::Mailer;
use crate::services::lockout;

pub const EXPIRY_MINUTES: i64 = 10;
pub const MAX_ATTEMPTS: i32 = 3;
pub const MAX_RESEND_COUNT: i32 = 2;
pub const RESEND_COOLDOWN_SECONDS: i64 = 30;
pub const LOCKOUT_HOURS: i64 = 24;

/// Generate a 4-digit code (1000-9999) from the OS CSPRNG.
pub fn generate_code() -> String {
    OsRng.gen_range(1000..=9999).to_string()
}

/// Source of current time for all expiry and lockout math.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Why a code is being issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    EmailVerification,
    PasswordReset,
}

/// Domain effect applied once a submitted code checks out.
pub enum VerifiedAction<'a> {
    MarkVerified,
    ResetPassword { new_password: &'a str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    Sent { can_resend_at: DateTime<Utc> },
    AlreadyVerified,
    Throttled { can_resend_at: DateTime<Utc> },
    Locked { locked_until: DateTime<Utc> },
    /// The row was created but the email could not be delivered. A retried
    /// request lands in the cooldown path instead of minting a second code.
    DeliveryFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    NoCodeFound,
    Expired,
    Invalid { remaining_attempts: i32 },
    Locked { locked_until: DateTime<Utc> },
}

/// OTP lifecycle engine, shared by the signup-verification and
/// forgot-password flows. All coordination state lives in the persisted
/// rows; only the latest row per user is ever consulted.
pub struct OtpService {
    users: Arc<dyn UserStore>,
    otps: Arc<dyn OtpStore>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
}

impl OtpService {
    pub fn new(users: Arc<dyn UserStore>, otps: Arc<dyn OtpStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self::with_clock(users, otps, mailer, Arc::new(SystemClock))
    }

    pub fn with_clock(
        users: Arc<dyn UserStore>,
        otps: Arc<dyn OtpStore>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            otps,
            mailer,
            clock,
        }
    }

    /// Issue a fresh code and email it, unless the latest row forbids it
    /// (active lock, exhausted resend allowance, or cooldown).
    pub async fn issue_code(&self, user: &User, purpose: OtpPurpose) -> Result<IssueOutcome> {
        let user_id = user.object_id()?;

        if purpose == OtpPurpose::EmailVerification && user.is_verified {
            return Ok(IssueOutcome::AlreadyVerified);
        }

        let now = self.clock.now();
        let latest = self.otps.find_latest(&user_id).await?;

        if let Some(latest) = &latest {
            if let Some(locked_until) = latest.active_lock(now) {
                return Ok(IssueOutcome::Locked { locked_until });
            }
        }

        let resend_count = match &latest {
            Some(latest) if !latest.is_expired(now) => {
                if let Some(locked_until) =
                    lockout::lock_decision(latest.resend_count, MAX_RESEND_COUNT, now)
                {
                    let won = self
                        .otps
                        .lock(&latest.object_id()?, bson::DateTime::from_chrono(locked_until))
                        .await?;
                    if won {
                        self.notify_locked(user, locked_until).await;
                    }
                    return Ok(IssueOutcome::Locked { locked_until });
                }

                let elapsed = now - latest.created_at.to_chrono();
                if elapsed < Duration::seconds(RESEND_COOLDOWN_SECONDS) {
                    return Ok(IssueOutcome::Throttled {
                        can_resend_at: latest.created_at.to_chrono()
                            + Duration::seconds(RESEND_COOLDOWN_SECONDS),
                    });
                }

                latest.resend_count + 1
            }
            // No outstanding code, or the previous window already expired.
            _ => 0,
        };

        let code = generate_code();
        let expires_at = now + Duration::minutes(EXPIRY_MINUTES);
        let attempt = OtpAttempt::new(user_id, code.clone(), now, expires_at, resend_count);
        self.otps.create(&attempt).await?;

        if let Err(e) = self
            .mailer
            .send_otp_code(&user.email, &user.first_name, &code)
            .await
        {
            tracing::error!("Failed to send OTP email to user {}: {}", user_id, e);
            return Ok(IssueOutcome::DeliveryFailed);
        }

        Ok(IssueOutcome::Sent {
            can_resend_at: now + Duration::seconds(RESEND_COOLDOWN_SECONDS),
        })
    }

    /// Check a submitted code against the latest row and, on success, apply
    /// the purpose-specific side effect and purge the user's OTP history.
    pub async fn verify_code(
        &self,
        user: &User,
        submitted_code: &str,
        action: VerifiedAction<'_>,
    ) -> Result<VerifyOutcome> {
        let user_id = user.object_id()?;
        let now = self.clock.now();

        let Some(latest) = self.otps.find_latest(&user_id).await? else {
            return Ok(VerifyOutcome::NoCodeFound);
        };

        if let Some(locked_until) = latest.active_lock(now) {
            return Ok(VerifyOutcome::Locked { locked_until });
        }

        if latest.is_expired(now) {
            return Ok(VerifyOutcome::Expired);
        }

        if latest.code != submitted_code {
            let attempts = latest.attempts + 1;
            let lock = lockout::lock_decision(attempts, MAX_ATTEMPTS, now);
            let won = self
                .otps
                .record_failed_attempt(
                    &latest.object_id()?,
                    latest.attempts,
                    attempts,
                    lock.map(bson::DateTime::from_chrono),
                )
                .await?;
            if !won {
                // A concurrent request advanced the counter first; its write
                // and any lock notification stand.
                tracing::debug!("Lost attempt-counter race for user {}", user_id);
            }

            return Ok(match lock {
                Some(locked_until) => {
                    if won {
                        self.notify_locked(user, locked_until).await;
                    }
                    VerifyOutcome::Locked { locked_until }
                }
                None => VerifyOutcome::Invalid {
                    remaining_attempts: MAX_ATTEMPTS - attempts,
                },
            });
        }

        match action {
            VerifiedAction::MarkVerified => {
                self.users.mark_verified(&user_id).await?;
            }
            VerifiedAction::ResetPassword { new_password } => {
                let password_hash = hash(new_password, DEFAULT_COST)?;
                self.users.set_password_hash(&user_id, &password_hash).await?;
            }
        }

        self.otps.delete_all_for_user(&user_id).await?;

        Ok(VerifyOutcome::Verified)
    }

    /// Store hygiene. Expiry and lock release are evaluated lazily at read
    /// time either way; this only trims rows nothing will consult again.
    pub async fn run_maintenance(&self) -> Result<(u64, u64)> {
        let now = bson::DateTime::from_chrono(self.clock.now());
        let purged = self.otps.purge_expired(now).await?;
        let released = self.otps.release_expired_locks(now).await?;
        Ok((purged, released))
    }

    async fn notify_locked(&self, user: &User, locked_until: DateTime<Utc>) {
        if let Err(e) = self
            .mailer
            .send_account_locked(&user.email, &user.first_name, locked_until)
            .await
        {
            tracing::warn!("Failed to send account-locked email: {}", e);
        }
    }
}
