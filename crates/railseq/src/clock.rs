use chrono::{Local, NaiveDate};

/// A source for the current calendar date.
///
/// This abstraction lets the allocator run against the real system clock in
/// production and a fixed or stepped date in tests, where cadence-boundary
/// behavior (e.g. allocations spanning New Year's Eve) must be exercised
/// deterministically.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use railseq::Clock;
///
/// struct FixedClock(NaiveDate);
/// impl Clock for FixedClock {
///     fn today(&self) -> NaiveDate {
///         self.0
///     }
/// }
///
/// let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
/// assert_eq!(clock.today().to_string(), "2025-01-01");
/// ```
pub trait Clock {
    /// Returns today's date.
    fn today(&self) -> NaiveDate;
}

/// The host's wall clock, read in the system's configured time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
