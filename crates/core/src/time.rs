use chrono::{DateTime, Duration, Utc};

/// Stamps captured frames.
///
/// `Default` reads the wall clock. `Fixed` only moves when advanced, which
/// keeps hold and display timing deterministic in tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Steps a fixed clock by one frame interval. No effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// A fixed clock starting at [`fixed_now`].
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_steps_by_frame_interval() {
        let mut clock = fixed_clock();
        assert_eq!(clock.now(), fixed_now());

        for _ in 0..45 {
            clock.advance(Duration::milliseconds(100));
        }
        assert_eq!(clock.now() - fixed_now(), Duration::milliseconds(4500));
    }

    #[test]
    fn default_clock_follows_wall_time() {
        let before = Utc::now();
        let read = Clock::default_clock().now();
        assert!(read >= before);
    }
}
