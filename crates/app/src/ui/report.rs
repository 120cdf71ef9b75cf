use super::model::UiModel;
use chrono::Datelike;
use std::fmt::Write;
use tasklist_core::app::insights::{calendar_weeks, day_marks, monthly_counts};
use tasklist_core::domain::{StatusFilter, Todo};
use tasklist_core::ports::Clock;

/// Months shown by the trend chart
pub const CHART_MONTHS: u32 = 6;

const CHART_WIDTH: usize = 30;

/// Plain-text rendering of the model, printed by the one-shot commands
pub struct UiReport;

impl UiReport {
    /// Render the whole listing
    pub fn render(model: &UiModel, clock: &dyn Clock) -> String {
        let mut out = String::new();
        Self::render_header(&mut out, model);
        Self::render_snapshots(&mut out, model);
        Self::render_list(&mut out, model, clock);
        Self::render_pages(&mut out, model);
        Self::render_notices(&mut out, model);
        out
    }

    fn render_header(out: &mut String, model: &UiModel) {
        let stats = model.projection.stats;
        let query = &model.projection.query;
        let meta = &model.projection.meta;

        let _ = writeln!(out, "{stats}");

        let mut filter = format!("status: {}", query.status);
        if !query.search.is_empty() {
            let _ = write!(filter, ", search: \"{}\"", query.search);
        }
        if model.search_input != query.search {
            let _ = write!(filter, " (typing \"{}\")", model.search_input);
        }
        let _ = write!(filter, ", page {}/{}", meta.current_page.max(1), meta.last_page.max(1));
        if model.projection.loading {
            filter.push_str(", loading...");
        }
        if model.creating > 0 {
            let _ = write!(filter, ", saving {} new", model.creating);
        }
        let _ = writeln!(out, "{filter}");
    }

    fn render_snapshots(out: &mut String, model: &UiModel) {
        let store = &model.projection.store;

        let _ = writeln!(out, "\nToday ({})", store.todays().len());
        if store.todays().is_empty() {
            let _ = writeln!(out, "  nothing created today");
        }
        for todo in store.todays() {
            let _ = writeln!(out, "  {}", describe(model, todo));
        }

        if !store.recent().is_empty() {
            let _ = writeln!(out, "\nRecent");
            for todo in store.recent() {
                let _ = writeln!(out, "  {}", describe(model, todo));
            }
        }
    }

    fn render_list(out: &mut String, model: &UiModel, clock: &dyn Clock) {
        let groups = model.projection.groups(clock);
        if groups.is_empty() {
            let empty = match model.projection.query.status {
                StatusFilter::All => "No todos yet",
                StatusFilter::Completed => "No completed todos",
                StatusFilter::Pending => "No pending todos",
            };
            let _ = writeln!(out, "\n{empty}");
            return;
        }

        for group in groups {
            let _ = writeln!(out, "\n{}", group.day.format("%a %d %b %Y"));
            for entry in group.entries {
                let _ = writeln!(out, "  {:>2}. {}", entry.number, describe(model, entry.todo));
            }
        }
    }

    fn render_pages(out: &mut String, model: &UiModel) {
        let buttons = model.projection.page_buttons();
        if buttons.len() < 2 {
            return;
        }

        let labels: Vec<String> = buttons
            .iter()
            .map(|b| match (b.active, b.target.is_some()) {
                (true, _) => format!("[{}]", b.label),
                (false, true) => b.label.clone(),
                (false, false) => format!("({})", b.label),
            })
            .collect();
        let prev = if model.projection.previous_page().is_some() { "<" } else { " " };
        let next = if model.projection.next_page().is_some() { ">" } else { " " };
        let _ = writeln!(out, "\n{prev} {} {next}", labels.join(" "));
    }

    fn render_notices(out: &mut String, model: &UiModel) {
        if model.messages.is_empty() && model.errors.is_empty() {
            return;
        }
        out.push('\n');
        for message in &model.messages {
            let _ = writeln!(out, "ok: {message}");
        }
        for error in &model.errors {
            let _ = writeln!(out, "error: {error}");
        }
    }

    /// Counters, the monthly trend and this month's calendar
    pub fn render_insights(model: &UiModel, clock: &dyn Clock) -> String {
        let mut out = String::new();
        let stats = model.projection.stats;
        let todos = model.projection.store.live();

        let _ = writeln!(out, "Total:      {}", stats.total);
        let _ = writeln!(out, "Completed:  {}", stats.completed);
        let _ = writeln!(out, "Pending:    {}", stats.pending);
        let _ = writeln!(out, "This month: {}", stats.month_total);
        let _ = writeln!(out, "Done:       {}%", stats.completion_rate());

        let counts = monthly_counts(todos, clock, CHART_MONTHS);
        let peak = counts.iter().map(|c| c.count).max().unwrap_or(0).max(1);
        let _ = writeln!(out, "\nCreated per month");
        for count in &counts {
            let bar = "#".repeat(count.count * CHART_WIDTH / peak);
            let _ = writeln!(out, "  {} {:>3} {bar}", count.month.format("%b %Y"), count.count);
        }

        let today = clock.today();
        let marks = day_marks(todos, clock);
        let _ = writeln!(out, "\n{}", today.format("%B %Y"));
        let _ = writeln!(out, "  Su  Mo  Tu  We  Th  Fr  Sa");
        for week in calendar_weeks(today) {
            let mut row = String::from(" ");
            for day in week {
                let cell = if day.month() != today.month() {
                    "   ".to_string()
                } else if marks.contains_key(&day) {
                    format!("{:>2}*", day.day())
                } else {
                    format!("{:>2} ", day.day())
                };
                let _ = write!(row, " {cell}");
            }
            let _ = writeln!(out, "{}", row.trim_end());
        }

        out
    }
}

/// One todo with its cover and in-flight markers
pub(crate) fn describe(model: &UiModel, todo: &Todo) -> String {
    let mut line = todo.to_string();
    if todo.cover.is_some() {
        line.push_str(" [cover]");
    }
    if let Some(kind) = model.in_flight.get(&todo.id) {
        let _ = write!(line, " ({kind} pending)");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tasklist_core::domain::{Event, ListQuery, MutationKind, Stats, TodoId, TodoPage};
    use tasklist_core::ports::FixedClock;

    fn clock() -> FixedClock {
        FixedClock::utc(Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap())
    }

    fn todo(id: u64, day: u32, finished: bool) -> Todo {
        Todo {
            id: TodoId(id),
            title: format!("todo {id}"),
            description: None,
            is_finished: finished,
            cover: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 9, id as u32, 0).unwrap(),
            updated_at: None,
        }
    }

    fn model() -> UiModel {
        let mut model = UiModel::new(6);
        let page = TodoPage {
            items: vec![todo(2, 2, false), todo(1, 2, true), todo(3, 1, false)],
            stats: Stats::new(3, 1, 2),
            ..TodoPage::default()
        };
        model.apply_event(
            &Event::PageLoaded { query: ListQuery::default(), page },
            &clock(),
        );
        model
    }

    #[test]
    fn test_render_groups_and_numbers() {
        let mut model = model();
        model.apply_event(
            &Event::MutationStarted { kind: MutationKind::Toggle, id: Some(TodoId(3)) },
            &clock(),
        );
        let screen = UiReport::render(&model, &clock());

        assert!(screen.contains("Today (2)"));
        assert!(screen.contains("Tue 02 Jan 2024"));
        assert!(screen.contains("Mon 01 Jan 2024"));
        assert!(screen.contains(" 1. [ ] #2 todo 2"));
        assert!(screen.contains(" 2. [x] #1 todo 1"));
        assert!(screen.contains(" 1. [ ] #3 todo 3 (toggle pending)"));
        assert!(screen.contains("33% complete"));
    }

    #[test]
    fn test_render_notices_and_empty_list() {
        let mut model = UiModel::new(6);
        model.add_message("saved");
        model.add_error("boom");
        let screen = UiReport::render(&model, &clock());
        assert!(screen.contains("No todos yet"));
        assert!(screen.contains("ok: saved"));
        assert!(screen.contains("error: boom"));
    }

    #[test]
    fn test_render_insights_marks_calendar() {
        let screen = UiReport::render_insights(&model(), &clock());
        assert!(screen.contains("Completed:  1"));
        assert!(screen.contains("Jan 2024   3"));
        assert!(screen.contains(" 1*"));
        assert!(screen.contains(" 2*"));
        assert!(screen.contains("January 2024"));
    }
}
