use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ApiError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ShowSession {
    pub id: i64,
    pub astronomy_show_id: i64,
    pub planetarium_dome_id: i64,
    pub show_time: DateTime<Utc>,
}

impl ShowSession {
    /// A session must be scheduled strictly in the future. `now` comes from
    /// the injected clock; the error message renders it in the configured
    /// timezone so clients see wall-clock time.
    pub fn validate_show_time(
        show_time: DateTime<Utc>,
        now: DateTime<Utc>,
        timezone: Tz,
    ) -> Result<(), ApiError> {
        if show_time <= now {
            let local_now = now.with_timezone(&timezone);
            return Err(ApiError::validation(
                "show_time",
                format!(
                    "Show time should be later than {}!",
                    local_now.format("%Y-%m-%d %H:%M")
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use chrono_tz::Tz;

    const ZONE: Tz = chrono_tz::Europe::Kiev;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn future_show_time_passes() {
        let result = ShowSession::validate_show_time(now() + Duration::hours(1), now(), ZONE);
        assert!(result.is_ok());
    }

    #[test]
    fn past_show_time_fails_with_local_now_in_message() {
        let result = ShowSession::validate_show_time(now() - Duration::days(1), now(), ZONE);
        match result {
            Err(ApiError::Validation { field, message }) => {
                assert_eq!(field, "show_time");
                // 12:00 UTC is 15:00 in Kyiv during summer time
                assert_eq!(message, "Show time should be later than 2025-06-15 15:00!");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn show_time_equal_to_now_fails() {
        let result = ShowSession::validate_show_time(now(), now(), ZONE);
        assert!(result.is_err());
    }
}
