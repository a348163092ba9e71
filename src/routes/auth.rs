use axum::{routing::post, Router};

use crate::{
    handlers::{auth, forgot_password},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/verify-otp", post(auth::verify_otp))
        .route("/resend-otp", post(auth::resend_otp))
        .route("/forgot-password", post(forgot_password::forgot_password))
        .route("/reset-password", post(forgot_password::reset_password))
}
