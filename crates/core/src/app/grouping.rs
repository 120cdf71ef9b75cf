use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{StatusFilter, Todo};

/// A todo with its position inside its day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberedTodo<'a> {
    pub number: usize,
    pub todo: &'a Todo,
}

/// Todos created on the same local calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup<'a> {
    pub day: NaiveDate,
    pub entries: Vec<NumberedTodo<'a>>,
}

/// Group the live list by local calendar day for display.
///
/// Filters by `status`, orders newest first (ties keep list order), and
/// numbers entries from 1 inside each day. Numbers restart for every day;
/// they are not positions in the flattened list. `local_day` maps each
/// creation instant to its own calendar day.
pub fn group_by_day<F>(todos: &[Todo], status: StatusFilter, local_day: F) -> Vec<DayGroup<'_>>
where
    F: Fn(&DateTime<Utc>) -> NaiveDate,
{
    let mut filtered: Vec<&Todo> = todos
        .iter()
        .filter(|todo| status.matches(todo.is_finished))
        .collect();
    filtered.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut groups: Vec<DayGroup<'_>> = Vec::new();
    for todo in filtered {
        let day = local_day(&todo.created_at);
        match groups.last_mut() {
            Some(group) if group.day == day => {
                let number = group.entries.len() + 1;
                group.entries.push(NumberedTodo { number, todo });
            }
            _ => groups.push(DayGroup {
                day,
                entries: vec![NumberedTodo { number: 1, todo }],
            }),
        }
    }

    groups
}
