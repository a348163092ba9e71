use axum::{extract::State, http::StatusCode, Json};
use bcrypt::{hash, DEFAULT_COST};
use mongodb::bson::oid::ObjectId;
use validator::Validate;

use crate::dtos::auth_dtos::{
    OtpFlowResponse, ResendOtpRequest, SignupRequest, SignupResponse, VerifyOtpRequest,
};
use crate::errors::{AppError, Result};
use crate::models::user::{User, UserRole};
use crate::services::otp_service::{
    IssueOutcome, OtpPurpose, VerifiedAction, VerifyOutcome, RESEND_COOLDOWN_SECONDS,
};
use crate::state::AppState;

// 1. Signup - create the account and send a verification code
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    if let Some(existing) = state.users.find_by_email(&payload.email).await? {
        if existing.is_verified {
            return Err(AppError::EmailTaken);
        }
        // Leftover from an abandoned signup: clear it and start over.
        let existing_id = existing.object_id()?;
        state.otps.delete_all_for_user(&existing_id).await?;
        state.users.delete(&existing_id).await?;
    }

    let password_hash = hash(&payload.password, DEFAULT_COST)?;
    let user = User::new(
        payload.first_name,
        payload.last_name,
        payload.email,
        payload.phone,
        password_hash,
        payload.role.unwrap_or(UserRole::Customer),
    );
    state.users.insert(&user).await?;
    let user_id = user.object_id()?;

    let outcome = state
        .otp_service
        .issue_code(&user, OtpPurpose::EmailVerification)
        .await?;

    let response = match outcome {
        IssueOutcome::Sent { can_resend_at } => (
            StatusCode::CREATED,
            Json(SignupResponse {
                success: true,
                message: "Signup successful. Please verify your email with the code sent."
                    .to_string(),
                user_id: user_id.to_hex(),
                email: user.email,
                can_resend_at: Some(can_resend_at),
            }),
        ),
        IssueOutcome::DeliveryFailed => (
            StatusCode::BAD_GATEWAY,
            Json(SignupResponse {
                success: false,
                message:
                    "Account created but the verification email could not be sent. Please resend."
                        .to_string(),
                user_id: user_id.to_hex(),
                email: user.email,
                can_resend_at: None,
            }),
        ),
        // A brand-new account cannot be verified, throttled or locked.
        _ => (
            StatusCode::BAD_REQUEST,
            Json(SignupResponse {
                success: false,
                message: "Could not issue a verification code".to_string(),
                user_id: user_id.to_hex(),
                email: user.email,
                can_resend_at: None,
            }),
        ),
    };

    Ok(response)
}

// 2. Verify the emailed code and mark the account verified
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
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
        .verify_code(&user, &payload.code, VerifiedAction::MarkVerified)
        .await?;

    let (status, body) = verify_response(
        outcome,
        "Email verified successfully. You can now log in.",
    );
    Ok((status, Json(body)))
}

// 3. Resend the verification code
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(payload): Json<ResendOtpRequest>,
) -> Result<(StatusCode, Json<OtpFlowResponse>)> {
    let user_id = ObjectId::parse_str(&payload.user_id)?;
    let user = state
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let outcome = state
        .otp_service
        .issue_code(&user, OtpPurpose::EmailVerification)
        .await?;

    let (status, body) = issue_response(
        outcome,
        "A new verification code has been sent to your email",
    );
    Ok((status, Json(body)))
}

pub(crate) fn issue_response(
    outcome: IssueOutcome,
    sent_message: &str,
) -> (StatusCode, OtpFlowResponse) {
    match outcome {
        IssueOutcome::Sent { can_resend_at } => (
            StatusCode::OK,
            OtpFlowResponse::ok(sent_message).with_can_resend_at(can_resend_at),
        ),
        IssueOutcome::AlreadyVerified => (
            StatusCode::BAD_REQUEST,
            OtpFlowResponse::fail("Email already verified"),
        ),
        IssueOutcome::Throttled { can_resend_at } => (
            StatusCode::BAD_REQUEST,
            OtpFlowResponse::fail(format!(
                "Please wait {} seconds before requesting a new code",
                RESEND_COOLDOWN_SECONDS
            ))
            .with_can_resend_at(can_resend_at),
        ),
        IssueOutcome::Locked { locked_until } => (
            StatusCode::BAD_REQUEST,
            OtpFlowResponse::fail("Too many attempts. Account locked for 24 hours.")
                .with_locked_until(locked_until),
        ),
        IssueOutcome::DeliveryFailed => (
            StatusCode::BAD_GATEWAY,
            OtpFlowResponse::fail("Failed to send the code. Please try again later."),
        ),
    }
}

pub(crate) fn verify_response(
    outcome: VerifyOutcome,
    verified_message: &str,
) -> (StatusCode, OtpFlowResponse) {
    match outcome {
        VerifyOutcome::Verified => (StatusCode::OK, OtpFlowResponse::ok(verified_message)),
        VerifyOutcome::NoCodeFound => (
            StatusCode::BAD_REQUEST,
            OtpFlowResponse::fail("No code found. Please request a new one."),
        ),
        VerifyOutcome::Expired => (
            StatusCode::BAD_REQUEST,
            OtpFlowResponse::fail("Code has expired. Please request a new one."),
        ),
        VerifyOutcome::Invalid { remaining_attempts } => (
            StatusCode::BAD_REQUEST,
            OtpFlowResponse::fail(format!(
                "Invalid code. {} attempt{} remaining.",
                remaining_attempts,
                if remaining_attempts == 1 { "" } else { "s" }
            )),
        ),
        VerifyOutcome::Locked { locked_until } => (
            StatusCode::BAD_REQUEST,
            OtpFlowResponse::fail("Too many failed attempts. Account locked for 24 hours.")
                .with_locked_until(locked_until),
        ),
    }
}
