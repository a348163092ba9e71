use std::sync::Arc;
use mongodb::Database;

use crate::config::AppConfig;
use crate::database::otps::{MongoOtpStore, OtpStore};
use crate::database::users::{MongoUserStore, UserStore};
use crate::services::email_service::{EmailService, Mailer};
use crate::services::otp_service::OtpService;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub users: Arc<dyn UserStore>,
    pub otps: Arc<dyn OtpStore>,
    pub otp_service: Arc<OtpService>,
}

impl AppState {
    pub fn new(db: Database, config: &AppConfig) -> Self {
        let users: Arc<dyn UserStore> = Arc::new(MongoUserStore::new(&db));
        let otps: Arc<dyn OtpStore> = Arc::new(MongoOtpStore::new(&db));
        let mailer: Arc<dyn Mailer> = Arc::new(EmailService::new(
            config.sendgrid_api_key.clone(),
            config.email_from.clone(),
        ));
        let otp_service = Arc::new(OtpService::new(users.clone(), otps.clone(), mailer));

        AppState {
            db,
            users,
            otps,
            otp_service,
        }
    }
}
