use chrono::{DateTime, Duration, Utc};

use crate::services::otp_service::LOCKOUT_HOURS;

/// Lock policy shared by the failed-attempt and resend-limit paths: once a
/// counter has reached its threshold, the account is locked until
/// `now + LOCKOUT_HOURS`. The caller that performs the lock transition is
/// responsible for sending the lock notification exactly once.
pub fn lock_decision(count: i32, threshold: i32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if count >= threshold {
        Some(now + Duration::hours(LOCKOUT_HOURS))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn below_threshold_does_not_lock() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(lock_decision(0, 3, now), None);
        assert_eq!(lock_decision(2, 3, now), None);
    }

    #[test]
    fn reaching_threshold_locks_for_24_hours() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let expected = now + Duration::hours(24);
        assert_eq!(lock_decision(3, 3, now), Some(expected));
        assert_eq!(lock_decision(7, 3, now), Some(expected));
    }
}
