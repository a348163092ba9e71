use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::json;

use crate::errors::{AppError, Result};

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Outbound notifications for the OTP flows. Implementations must not log
/// the code.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp_code(&self, email: &str, first_name: &str, code: &str) -> Result<()>;

    async fn send_account_locked(
        &self,
        email: &str,
        first_name: &str,
        unlock_at: DateTime<Utc>,
    ) -> Result<()>;
}

#[derive(Clone)]
pub struct EmailService {
    api_key: String,
    from: String,
    client: Client,
}

impl EmailService {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            api_key,
            from,
            client: Client::new(),
        }
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<()> {
        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from },
            "subject": subject,
            "content": [{ "type": "text/plain", "value": body }],
        });

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::delivery(format!("SendGrid API error: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::delivery(format!(
                "Email sending failed with status: {}",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send_otp_code(&self, email: &str, first_name: &str, code: &str) -> Result<()> {
        let body = format!(
            "Hello {},\n\nYour SwiftEats verification code is: {}\n\nThis code will expire in 10 minutes. After 3 incorrect attempts your account will be locked for 24 hours.\n\nIf you didn't request this code, please ignore this email.\n\nBest regards,\nSwiftEats Team",
            first_name, code
        );
        self.send(email, "Your SwiftEats verification code", body)
            .await
    }

    async fn send_account_locked(
        &self,
        email: &str,
        first_name: &str,
        unlock_at: DateTime<Utc>,
    ) -> Result<()> {
        let body = format!(
            "Hello {},\n\nYour account has been temporarily locked due to multiple failed verification attempts.\n\nYour account will be automatically unlocked at: {}\n\nIf this wasn't you, please contact our support team immediately.\n\nBest regards,\nSwiftEats Team",
            first_name,
            unlock_at.to_rfc3339()
        );
        self.send(email, "Account temporarily locked - SwiftEats", body)
            .await
    }
}
