use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone};
use std::fmt;

/// When a recurring job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSchedule {
    /// On every multiple of `minutes` since the Unix epoch, so 15 fires at
    /// :00, :15, :30 and :45.
    Every { minutes: u32 },
    /// Once a day at the given wall-clock time of the schedule's time zone.
    DailyAt(NaiveTime),
}

impl JobSchedule {
    /// First firing strictly after `now`.
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        match *self {
            JobSchedule::Every { minutes } => {
                let step = i64::from(minutes.max(1)) * 60;
                let next = (now.timestamp().div_euclid(step) + 1) * step;
                match DateTime::from_timestamp(next, 0) {
                    Some(utc) => utc.with_timezone(&now.timezone()),
                    None => now.clone() + Duration::seconds(step),
                }
            }
            JobSchedule::DailyAt(time) => {
                let tz = now.timezone();
                let today = now.naive_local().date();

                (0..=2)
                    .filter_map(|days| resolve_local(&tz, (today + Duration::days(days)).and_time(time)))
                    .find(|candidate| candidate > now)
                    .unwrap_or_else(|| now.clone() + Duration::days(1))
            }
        }
    }
}

/// Maps a local wall-clock time to an instant. A time skipped by a DST jump
/// moves forward an hour; an ambiguous one takes the earlier instant.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
}

impl fmt::Display for JobSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobSchedule::Every { minutes } => write!(f, "every {} min", minutes),
            JobSchedule::DailyAt(time) => write!(f, "daily at {}", time.format("%H:%M")),
        }
    }
}
