use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};

/// Clock abstraction for testability
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day of `at` in the user's time zone, using the offset in
    /// force at that instant rather than the current one
    fn local_day(&self, at: &DateTime<Utc>) -> NaiveDate;

    /// Today's local calendar day
    fn today(&self) -> NaiveDate {
        self.local_day(&self.now())
    }
}

/// System clock implementation
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_day(&self, at: &DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&Local).date_naive()
    }
}

/// Clock frozen at a given instant, in a zone without daylight saving
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }

    pub fn utc(now: DateTime<Utc>) -> Self {
        Self::new(now, Utc.fix())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn local_day(&self, at: &DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }
}
