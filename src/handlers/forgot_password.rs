use axum::{extract::State, http::StatusCode, Json};
use mongodb::bson::oid::ObjectId;
use validator::Validate;

use crate::dtos::auth_dtos::{ForgotPasswordRequest, OtpFlowResponse, ResetPasswordRequest};
use crate::errors::{AppError, Result};
use crate::handlers::auth::{issue_response, verify_response};
use crate::models::user::AccountStatus;
use crate::services::otp_service::{OtpPurpose, VerifiedAction};
use crate::state::AppState;

// 1. Forgot password - validate the new password and send a reset code
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<OtpFlowResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    if payload.new_password != payload.confirm_password {
        return Err(AppError::invalid_data("Passwords do not match"));
    }

    let user = state
        .users
        .find_by_email(&payload.email)
        .await?
        .ok_or(AppError::UserNotFound)?;

    // Administrative suspension, distinct from the OTP-level lockout.
    if user.account_status == AccountStatus::Locked {
        return Err(AppError::AccountSuspended);
    }

    let outcome = state
        .otp_service
        .issue_code(&user, OtpPurpose::PasswordReset)
        .await?;

    let (status, body) = issue_response(outcome, "A password reset code has been sent to your email");
    let body = if body.success {
        body.with_user_id(user.object_id()?.to_hex())
    } else {
        body
    };
    Ok((status, Json(body)))
}

// 2. Verify the reset code and overwrite the password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<(StatusCode, Json<OtpFlowResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let user_id = ObjectId::parse_str(&payload.user_id)?;
    let user = state
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let outcome = state
        .otp_service
        .verify_code(
            &user,
            &payload.code,
            VerifiedAction::ResetPassword {
                new_password: &payload.new_password,
            },
        )
        .await?;

    let (status, body) = verify_response(outcome, "Password reset successfully");
    Ok((status, Json(body)))
}
