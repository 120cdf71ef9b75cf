use chrono::Datelike;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use tasklist_core::app::insights::{calendar_weeks, day_marks, monthly_counts};
use tasklist_core::domain::{StatusFilter, Todo};
use tasklist_core::ports::Clock;

use super::model::{InputMode, UiModel, ViewMode};
use super::report::{describe, CHART_MONTHS};

const KEY_HELP: [(&str, &str); 14] = [
    ("j/k, arrows", "move the selection"),
    ("space, x", "toggle the selected todo"),
    ("a", "add a todo (title | description)"),
    ("e", "edit the selected title"),
    ("d", "delete the selected todo"),
    ("/", "search as you type"),
    ("s", "cycle status: all, pending, completed"),
    ("r", "reset filters"),
    ("n, p", "next / previous page"),
    ("1-9", "jump to a numbered page"),
    ("i", "statistics"),
    (":", "command line"),
    ("?", "this help"),
    ("q, Esc", "quit"),
];

const COMMAND_HELP: [&str; 5] = [
    "add <title> [| <description>]",
    "edit <id> title <text> | desc <text>|- | finished yes|no",
    "toggle <id>    delete <id>",
    "search [text]    status all|completed|pending    reset",
    "page <n>    next    prev    stats    help    quit",
];

/// The View component of MVU - renders the model into a terminal frame
pub struct UiView;

impl UiView {
    /// Render the entire UI based on the current model state
    pub fn render(model: &UiModel, clock: &dyn Clock, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title bar
                Constraint::Min(0),    // Main content
                Constraint::Length(3), // Status/input bar
            ])
            .split(frame.area());

        Self::render_title_bar(model, frame, chunks[0]);

        match model.mode {
            ViewMode::List => Self::render_list_view(model, clock, frame, chunks[1]),
            ViewMode::Insights => Self::render_insights(model, clock, frame, chunks[1]),
            ViewMode::Help => Self::render_help(frame, chunks[1]),
        }

        Self::render_status_bar(model, frame, chunks[2]);

        if !model.errors.is_empty() {
            Self::render_error_overlay(model, frame, frame.area());
        }
    }

    fn render_title_bar(model: &UiModel, frame: &mut Frame, area: Rect) {
        let mut title = format!("tasklist | {}", model.projection.stats);
        if model.projection.loading {
            title.push_str(" [LOADING...]");
        }
        if model.creating > 0 {
            title.push_str(&format!(" [SAVING {}]", model.creating));
        }

        let paragraph = Paragraph::new(title)
            .style(Style::default().fg(Color::White).bg(Color::Blue))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_list_view(model: &UiModel, clock: &dyn Clock, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);

        Self::render_groups(model, clock, frame, chunks[0]);
        Self::render_side_panel(model, frame, chunks[1]);
    }

    /// Day groups with their numbered entries
    fn render_groups(model: &UiModel, clock: &dyn Clock, frame: &mut Frame, area: Rect) {
        let query = &model.projection.query;
        let meta = &model.projection.meta;
        let mut title = format!(
            "Todos [{}] page {}/{}",
            query.status,
            meta.current_page.max(1),
            meta.last_page.max(1)
        );
        if !query.search.is_empty() {
            title.push_str(&format!(" search \"{}\"", query.search));
        }
        let block = Block::default().borders(Borders::ALL).title(title);

        let groups = model.projection.groups(clock);
        if groups.is_empty() {
            let empty = match query.status {
                StatusFilter::All => "No todos yet. Press 'a' to add one.",
                StatusFilter::Completed => "No completed todos",
                StatusFilter::Pending => "No pending todos",
            };
            let paragraph = Paragraph::new(empty)
                .block(block)
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let entry_count: usize = groups.iter().map(|g| g.entries.len()).sum();
        let cursor = model.cursor.min(entry_count.saturating_sub(1));

        let mut items = Vec::new();
        let mut selected_row = None;
        let mut index = 0;
        for group in &groups {
            let header = Line::from(vec![
                Span::styled(
                    group.day.format("%a %d %b %Y").to_string(),
                    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(" ({})", group.entries.len())),
            ]);
            items.push(ListItem::new(header));

            for entry in &group.entries {
                if index == cursor {
                    selected_row = Some(items.len());
                }
                let line = Line::from(vec![
                    Span::raw(format!("{:>3}. ", entry.number)),
                    Span::styled(describe(model, entry.todo), Self::todo_style(model, entry.todo)),
                ]);
                items.push(ListItem::new(line));
                index += 1;
            }
        }

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
        let mut state = ListState::default().with_selected(selected_row);
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn todo_style(model: &UiModel, todo: &Todo) -> Style {
        if model.is_busy(todo.id) {
            Style::default().fg(Color::Yellow)
        } else if todo.is_finished {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        }
    }

    /// Completion gauge and the today / recent snapshots
    fn render_side_panel(model: &UiModel, frame: &mut Frame, area: Rect) {
        let store = &model.projection.store;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Percentage(50),
                Constraint::Min(0),
            ])
            .split(area);

        let stats = model.projection.stats;
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Done"))
            .gauge_style(Style::default().fg(Color::Green))
            .percent(u16::from(stats.completion_rate()));
        frame.render_widget(gauge, chunks[0]);

        let snapshot = |todos: &[Todo], title: String, empty: &'static str| {
            let items: Vec<ListItem> = if todos.is_empty() {
                vec![ListItem::new(Span::styled(empty, Style::default().fg(Color::DarkGray)))]
            } else {
                todos
                    .iter()
                    .map(|todo| ListItem::new(Span::styled(describe(model, todo), Self::todo_style(model, todo))))
                    .collect()
            };
            List::new(items).block(Block::default().borders(Borders::ALL).title(title))
        };

        let today = snapshot(
            store.todays(),
            format!("Today ({})", store.todays().len()),
            "nothing created today",
        );
        frame.render_widget(today, chunks[1]);

        let recent = snapshot(store.recent(), "Recent".to_string(), "nothing yet");
        frame.render_widget(recent, chunks[2]);
    }

    /// Counters, the monthly trend and this month's calendar
    fn render_insights(model: &UiModel, clock: &dyn Clock, frame: &mut Frame, area: Rect) {
        let stats = model.projection.stats;
        let todos = model.projection.store.live();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(8), Constraint::Length(10)])
            .split(area);

        let counters = vec![
            Line::from(format!("Total:      {}", stats.total)),
            Line::from(format!("Completed:  {}", stats.completed)),
            Line::from(format!("Pending:    {}", stats.pending)),
            Line::from(format!("This month: {}", stats.month_total)),
            Line::from(format!("Done:       {}%", stats.completion_rate())),
        ];
        let counters = Paragraph::new(counters).block(Block::default().borders(Borders::ALL).title("Statistics"));
        frame.render_widget(counters, chunks[0]);

        let counts = monthly_counts(todos, clock, CHART_MONTHS);
        let labels: Vec<String> = counts.iter().map(|c| c.month.format("%b").to_string()).collect();
        let data: Vec<(&str, u64)> = labels
            .iter()
            .zip(&counts)
            .map(|(label, count)| (label.as_str(), count.count as u64))
            .collect();
        let chart = BarChart::default()
            .block(Block::default().borders(Borders::ALL).title("Created per month"))
            .bar_width(5)
            .bar_gap(2)
            .bar_style(Style::default().fg(Color::Blue))
            .data(data.as_slice());
        frame.render_widget(chart, chunks[1]);

        let today = clock.today();
        let marks = day_marks(todos, clock);
        let mut lines = vec![Line::from(Span::styled(
            " Su  Mo  Tu  We  Th  Fr  Sa",
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        for week in calendar_weeks(today) {
            let spans: Vec<Span> = week
                .iter()
                .map(|day| {
                    if day.month() != today.month() {
                        Span::raw("    ")
                    } else if marks.contains_key(day) {
                        Span::styled(format!("{:>3}*", day.day()), Style::default().fg(Color::Green))
                    } else if *day == today {
                        Span::styled(format!("{:>3} ", day.day()), Style::default().add_modifier(Modifier::REVERSED))
                    } else {
                        Span::raw(format!("{:>3} ", day.day()))
                    }
                })
                .collect();
            lines.push(Line::from(spans));
        }
        let calendar = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(today.format("%B %Y").to_string()));
        frame.render_widget(calendar, chunks[2]);
    }

    fn render_help(frame: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let mut lines = vec![Line::from(Span::styled("Keys", bold))];
        lines.extend(
            KEY_HELP
                .iter()
                .map(|(keys, action)| Line::from(format!("  {keys:<12} {action}"))),
        );
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Command line (:)", bold)));
        lines.extend(COMMAND_HELP.iter().map(|usage| Line::from(format!("  {usage}"))));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    /// Input prompt while typing, otherwise page buttons and the latest notice
    fn render_status_bar(model: &UiModel, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title(Self::page_title(model));

        if model.input.mode != InputMode::None {
            let prompt = model.input.mode.prompt();
            let text = format!("{prompt}{}", model.input.text);
            let width = text.chars().count() as u16;
            frame.render_widget(Paragraph::new(text).block(block), area);
            frame.set_cursor_position((area.x + 1 + width, area.y + 1));
            return;
        }

        let line = match model.messages.last() {
            Some(message) => Line::from(Span::styled(message.as_str(), Style::default().fg(Color::Green))),
            None => Line::from(Self::key_hints(model)),
        };
        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn page_title(model: &UiModel) -> String {
        let buttons = model.projection.page_buttons();
        if buttons.len() < 2 {
            return String::new();
        }
        let labels: Vec<String> = buttons
            .iter()
            .map(|b| match (b.active, b.target.is_some()) {
                (true, _) => format!("[{}]", b.label),
                (false, true) => b.label.clone(),
                (false, false) => format!("({})", b.label),
            })
            .collect();
        format!(" Pages: {} ", labels.join(" "))
    }

    fn key_hints(model: &UiModel) -> String {
        match model.mode {
            ViewMode::List => "? Help | a Add | space Toggle | e Edit | d Delete | / Search | s Status | q Quit",
            ViewMode::Insights | ViewMode::Help => "Any key to go back",
        }
        .to_string()
    }

    fn render_error_overlay(model: &UiModel, frame: &mut Frame, area: Rect) {
        let popup_area = Self::centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let mut lines: Vec<Line> = model.errors.iter().map(|error| Line::from(error.as_str())).collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("press any key", Style::default().fg(Color::DarkGray))));

        let popup = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Errors"))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        frame.render_widget(popup, popup_area);
    }

    /// Helper to create centered rectangle
    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}
