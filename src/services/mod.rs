pub mod email_service;
pub mod lockout;
pub mod otp_service;
