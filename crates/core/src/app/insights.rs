//! Aggregations over the live list for the dashboard panels: todos per
//! month for the trend chart and todos per day for the calendar.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::domain::Todo;
use crate::ports::Clock;

/// Number of todos created in a calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCount {
    /// First day of the month
    pub month: NaiveDate,
    pub count: usize,
}

fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Counts for the last `months` months, oldest first, ending with the
/// current one. Todos outside the window are ignored.
pub fn monthly_counts(todos: &[Todo], clock: &dyn Clock, months: u32) -> Vec<MonthCount> {
    let current = month_start(clock.today());
    let mut buckets: Vec<MonthCount> = (0..months)
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .map(|month| MonthCount { month, count: 0 })
        .collect();

    for todo in todos {
        let month = month_start(clock.local_day(&todo.created_at));
        if let Some(bucket) = buckets.iter_mut().find(|b| b.month == month) {
            bucket.count += 1;
        }
    }

    buckets
}

/// Todos per local calendar day
pub fn day_marks(todos: &[Todo], clock: &dyn Clock) -> BTreeMap<NaiveDate, usize> {
    let mut marks = BTreeMap::new();
    for todo in todos {
        *marks.entry(clock.local_day(&todo.created_at)).or_insert(0) += 1;
    }
    marks
}

/// Six Sunday-first weeks covering the month that contains `day`
pub fn calendar_weeks(day: NaiveDate) -> Vec<[NaiveDate; 7]> {
    let first = month_start(day);
    let lead = i64::from(first.weekday().num_days_from_sunday());
    let start = first - Duration::days(lead);

    (0..6)
        .map(|week| std::array::from_fn(|d| start + Duration::days(week * 7 + d as i64)))
        .collect()
}
