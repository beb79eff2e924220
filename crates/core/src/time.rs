use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

/// Time source shared by services and tests.
///
/// `Manual` clocks are shared handles: every clone observes the same instant,
/// so a test can advance the clock while a service holds a copy of it.
#[derive(Debug, Clone, Default)]
pub enum Clock {
    #[default]
    System,
    Manual(Arc<Mutex<DateTime<Utc>>>),
}

impl Clock {
    /// Returns a clock that reads the current system time.
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    /// Returns a manually driven clock starting at `at`.
    #[must_use]
    pub fn manual(at: DateTime<Utc>) -> Self {
        Self::Manual(Arc::new(Mutex::new(at)))
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Manual(at) => *at.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Moves a manual clock forward. Has no effect on `Clock::System`.
    pub fn advance(&self, delta: Duration) {
        if let Clock::Manual(at) = self {
            let mut guard = at.lock().unwrap_or_else(PoisonError::into_inner);
            *guard += delta;
        }
    }

    pub fn advance_ms(&self, millis: i64) {
        self.advance(Duration::milliseconds(millis));
    }

    /// Milliseconds elapsed since `start`, saturating at zero when the clock
    /// reads earlier than `start`.
    #[must_use]
    pub fn elapsed_ms_since(&self, start: DateTime<Utc>) -> u64 {
        let elapsed = self.now().signed_duration_since(start).num_milliseconds();
        u64::try_from(elapsed).unwrap_or(0)
    }

    #[must_use]
    pub fn is_manual(&self) -> bool {
        matches!(self, Clock::Manual(_))
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a manual clock starting at the deterministic test timestamp.
#[must_use]
pub fn manual_clock() -> Clock {
    Clock::manual(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = manual_clock();
        let held_by_service = clock.clone();

        clock.advance_ms(1_200);

        assert_eq!(held_by_service.now(), fixed_now() + Duration::milliseconds(1_200));
        assert_eq!(held_by_service.elapsed_ms_since(fixed_now()), 1_200);
    }

    #[test]
    fn elapsed_saturates_when_start_is_in_the_future() {
        let clock = manual_clock();
        let later = fixed_now() + Duration::seconds(5);
        assert_eq!(clock.elapsed_ms_since(later), 0);
    }

    #[test]
    fn system_clock_ignores_advance() {
        let clock = Clock::system();
        clock.advance(Duration::days(365));
        assert!(clock.now() < Utc::now() + Duration::days(1));
        assert!(!clock.is_manual());
    }
}
