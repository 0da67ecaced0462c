//! Effective-time clock for scheduler ticks.
//!
//! # Responsibility
//! - Compute effective wall-clock time as system time plus the stored
//!   signed offset.
//! - Derive time-of-day, weekday and the minute-slot key from one instant.
//!
//! # Invariants
//! - All derived values come from the same effective timestamp; weekday and
//!   time-of-day can never disagree within a tick.
//! - The minute-slot key is zero-padded and lexicographically sortable.

use crate::model::bell::TimeOfDay;
use crate::model::weekday::Weekday;
use chrono::{Datelike, Duration, Local, NaiveDateTime, Timelike};

/// A single tick's effective instant, truncated views derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInstant {
    datetime: NaiveDateTime,
}

impl TickInstant {
    /// Captures the current local time shifted by `offset_secs`.
    ///
    /// The offset is read fresh from settings by the caller on every tick;
    /// nothing here caches it.
    pub fn effective_now(offset_secs: i64) -> Self {
        Self::from_datetime(Local::now().naive_local() + Duration::seconds(offset_secs))
    }

    /// Builds an instant from an explicit timestamp.
    ///
    /// This is the deterministic entry point used by the engine's
    /// `run_tick_at` and by tests.
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self { datetime }
    }

    /// Minute-granular time of day of the effective instant.
    pub fn time_of_day(&self) -> TimeOfDay {
        // chrono keeps hour/minute in range; the fallback is unreachable.
        TimeOfDay::new(self.datetime.hour() as u8, self.datetime.minute() as u8)
            .unwrap_or_default()
    }

    /// Weekday of the effective instant in the canonical vocabulary.
    pub fn weekday(&self) -> Weekday {
        Weekday::from_chrono(self.datetime.weekday())
    }

    /// Sortable minute-slot key, `YYYYMMDD_HHMM`.
    ///
    /// Scopes ledger markers to one calendar minute; a marker for minute M
    /// never suppresses minute M+1.
    pub fn minute_slot(&self) -> String {
        self.datetime.format("%Y%m%d_%H%M").to_string()
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }
}
