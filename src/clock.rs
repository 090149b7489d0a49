use chrono::{DateTime, Utc};

/// Source of "now" for time-based validation. Injected through `AppState`
/// so that handlers and tests share the same notion of the current instant.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_returns_the_configured_instant() {
        let instant = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let clock: &dyn Clock = &FixedClock(instant);
        assert_eq!(clock.now_utc(), instant);
    }
}
