use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::UserRole;

// Request DTOs
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 7, message = "Phone number is required"))]
    pub phone: String,

    #[validate(length(min = 8, max = 16, message = "Password must be 8-16 characters"))]
    pub password: String,

    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    pub user_id: String,

    #[validate(length(min = 4, max = 4, message = "Code must be 4 digits"))]
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendOtpRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub new_password: String,

    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub user_id: String,

    #[validate(length(min = 4, max = 4, message = "Code must be 4 digits"))]
    pub code: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub new_password: String,
}

// Response DTOs
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_resend_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct OtpFlowResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_resend_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<DateTime<Utc>>,
}

impl OtpFlowResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            user_id: None,
            can_resend_at: None,
            locked_until: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            user_id: None,
            can_resend_at: None,
            locked_until: None,
        }
    }

    pub fn with_user_id(mut self, user_id: String) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_can_resend_at(mut self, at: DateTime<Utc>) -> Self {
        self.can_resend_at = Some(at);
        self
    }

    pub fn with_locked_until(mut self, at: DateTime<Utc>) -> Self {
        self.locked_until = Some(at);
        self
    }
}
