//! Reconciliation of the sub-header's day/minute fields with the relay's receipt time.
//!
//! Some observatories suffer from GPS week-number rollovers that leave the
//! instrument's day counter months away from reality while the minute of day stays
//! correct. The relay stamps every message independently on receipt, so a data time
//! that cannot be reached within a plausible transmission delay is rebuilt on the
//! transmission day.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

pub const DEFAULT_MAX_TRANSMIT_DELAY_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciledTime {
    pub data_time: DateTime<Utc>,
    pub transmit_time: DateTime<Utc>,
    pub corrected: bool,
}

impl ReconciledTime {
    /// How long after its first sample the message was transmitted.
    pub fn delay(&self) -> Duration {
        self.transmit_time - self.data_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeReconciler {
    pub max_transmit_delay: Duration,
}

impl Default for TimeReconciler {
    fn default() -> Self {
        Self {
            max_transmit_delay: Duration::minutes(DEFAULT_MAX_TRANSMIT_DELAY_MINUTES),
        }
    }
}

impl TimeReconciler {
    pub fn new(max_transmit_delay: Duration) -> Self {
        Self { max_transmit_delay }
    }

    /// Returns the epoch of the first sample. Never fails; `corrected` reports whether
    /// the reported day of year had to be replaced by the transmission day.
    pub fn reconcile(
        &self,
        transmit_time: DateTime<Utc>,
        day_of_year: u16,
        minute_of_day: u16,
    ) -> ReconciledTime {
        let reported = reported_data_time(transmit_time, day_of_year, minute_of_day);
        if (transmit_time - reported).abs() < self.max_transmit_delay {
            return ReconciledTime {
                data_time: reported,
                transmit_time,
                corrected: false,
            };
        }

        let mut data_time = start_of_day(transmit_time) + Duration::minutes(i64::from(minute_of_day));
        if data_time > transmit_time {
            data_time -= Duration::days(1);
        }

        ReconciledTime {
            data_time,
            transmit_time,
            corrected: true,
        }
    }
}

/// Day/minute anchored in the transmission year, or the year before when that would
/// place the data after its own transmission.
fn reported_data_time(
    transmit_time: DateTime<Utc>,
    day_of_year: u16,
    minute_of_day: u16,
) -> DateTime<Utc> {
    let offset =
        Duration::days(i64::from(day_of_year) - 1) + Duration::minutes(i64::from(minute_of_day));
    let this_year = start_of_year(transmit_time);
    let candidate = this_year + offset;
    if candidate > transmit_time {
        start_of_year(this_year - Duration::days(1)) + offset
    } else {
        candidate
    }
}

fn start_of_day(time: DateTime<Utc>) -> DateTime<Utc> {
    time.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn start_of_year(time: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(time) - Duration::days(i64::from(time.ordinal0()))
}
