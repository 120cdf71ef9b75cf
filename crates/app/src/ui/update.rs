use super::model::{InputMode, UiModel, ViewMode};
use anyhow::{anyhow, bail, Context, Result};
use crossterm::event::{KeyCode, KeyModifiers};
use tasklist_core::app::Command;
use tasklist_core::domain::{FieldUpdate, NewTodo, StatusFilter, TodoId, TodoPatch};
use tasklist_core::ports::Clock;

/// What a key press or command line asks for
#[derive(Debug, Clone)]
pub enum UiMessage {
    /// Send a command to the controller
    Command(Command),

    /// No action needed
    None,
}

/// The Update function - handles user input and updates the model
pub struct UiUpdate;

impl UiUpdate {
    /// Handle a key press and update the model accordingly.
    /// Returns a UiMessage that should be sent to the controller.
    pub fn handle_key(
        model: &mut UiModel,
        key: KeyCode,
        modifiers: KeyModifiers,
        clock: &dyn Clock,
    ) -> Result<UiMessage> {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(UiMessage::Command(Command::Quit));
        }

        if model.input.mode != InputMode::None {
            return Self::handle_input_keys(model, key);
        }

        // The error popup swallows the key that dismisses it
        if !model.errors.is_empty() {
            model.clear_notices();
            return Ok(UiMessage::None);
        }
        model.messages.clear();

        match model.mode {
            ViewMode::List => Self::handle_list_keys(model, key, clock),
            ViewMode::Insights | ViewMode::Help => {
                // Any key goes back to the list
                model.mode = ViewMode::List;
                Ok(UiMessage::None)
            }
        }
    }

    fn handle_list_keys(model: &mut UiModel, key: KeyCode, clock: &dyn Clock) -> Result<UiMessage> {
        let selected = model.selected(clock).map(|todo| (todo.id, todo.title.clone()));

        let command = match key {
            KeyCode::Up | KeyCode::Char('k') => {
                model.move_cursor(false, clock);
                return Ok(UiMessage::None);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                model.move_cursor(true, clock);
                return Ok(UiMessage::None);
            }

            KeyCode::Char(' ') | KeyCode::Char('x') => match selected {
                Some((id, _)) => Command::Toggle { id },
                None => return Ok(UiMessage::None),
            },
            KeyCode::Char('d') | KeyCode::Delete => match selected {
                Some((id, _)) => Command::Delete { id },
                None => return Ok(UiMessage::None),
            },
            KeyCode::Char('e') => {
                if let Some((id, title)) = selected {
                    model.begin_input(InputMode::EditTitle { id }, title);
                }
                return Ok(UiMessage::None);
            }
            KeyCode::Char('a') => {
                model.begin_input(InputMode::NewTodo, "");
                return Ok(UiMessage::None);
            }
            KeyCode::Char('/') => {
                let text = model.search_input.clone();
                model.begin_input(InputMode::Search, text);
                return Ok(UiMessage::None);
            }
            KeyCode::Char(':') => {
                model.begin_input(InputMode::Command, "");
                return Ok(UiMessage::None);
            }

            KeyCode::Char('s') => Command::SetStatus {
                status: next_status(model.status_input),
            },
            KeyCode::Char('r') => {
                model.search_input.clear();
                Command::ResetFilters
            }
            KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => Command::NextPage,
            KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => Command::PreviousPage,
            KeyCode::Char(digit) if digit.is_ascii_digit() => Self::parse_page(model, &digit.to_string())?,

            KeyCode::Char('i') => {
                model.mode = ViewMode::Insights;
                return Ok(UiMessage::None);
            }
            KeyCode::Char('?') => {
                model.mode = ViewMode::Help;
                return Ok(UiMessage::None);
            }
            KeyCode::Char('q') | KeyCode::Esc => Command::Quit,

            _ => return Ok(UiMessage::None),
        };

        Ok(UiMessage::Command(command))
    }

    /// Handle keys when in text input mode
    fn handle_input_keys(model: &mut UiModel, key: KeyCode) -> Result<UiMessage> {
        match key {
            KeyCode::Char(c) => {
                model.input.text.push(c);
                Ok(Self::live_search(model))
            }

            KeyCode::Backspace => {
                model.input.text.pop();
                Ok(Self::live_search(model))
            }

            KeyCode::Enter => {
                let (mode, text) = model.take_input();
                Self::process_input_submission(model, mode, text)
            }

            KeyCode::Esc => {
                // Search keeps what was typed; other inputs are discarded
                model.take_input();
                Ok(UiMessage::None)
            }

            _ => Ok(UiMessage::None),
        }
    }

    fn live_search(model: &mut UiModel) -> UiMessage {
        if model.input.mode != InputMode::Search {
            return UiMessage::None;
        }
        model.search_input = model.input.text.clone();
        UiMessage::Command(Command::Search {
            text: model.input.text.clone(),
        })
    }

    /// Process submitted input text
    fn process_input_submission(model: &mut UiModel, mode: InputMode, text: String) -> Result<UiMessage> {
        match mode {
            InputMode::None | InputMode::Search => Ok(UiMessage::None),
            InputMode::Command => Self::handle_line(model, &text),
            InputMode::NewTodo => Ok(UiMessage::Command(Self::parse_add(&text))),
            InputMode::EditTitle { id } => Ok(UiMessage::Command(Command::Update {
                id,
                patch: TodoPatch {
                    title: Some(text),
                    ..TodoPatch::default()
                },
            })),
        }
    }

    /// Handle one command line.
    ///
    /// Grammar:
    /// `add <title> [| <description>]`, `edit <id> title|desc|finished <value>`,
    /// `toggle <id>`, `delete <id>`, `search [text]`, `status <filter>`,
    /// `page <n>`, `next`, `prev`, `reset`, `stats`, `help`, `quit`.
    pub fn handle_line(model: &mut UiModel, line: &str) -> Result<UiMessage> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "" => return Ok(UiMessage::None),
            "help" | "?" => {
                model.mode = ViewMode::Help;
                return Ok(UiMessage::None);
            }
            "stats" => {
                model.mode = ViewMode::Insights;
                return Ok(UiMessage::None);
            }
            "quit" | "exit" | "q" => Command::Quit,

            "add" => Self::parse_add(rest),
            "edit" => Self::parse_edit(rest)?,
            "toggle" => Command::Toggle { id: Self::parse_id(rest)? },
            "delete" | "rm" => Command::Delete { id: Self::parse_id(rest)? },

            "search" => {
                model.search_input = rest.to_string();
                Command::Search { text: rest.to_string() }
            }
            "status" => Command::SetStatus {
                status: rest
                    .parse::<StatusFilter>()
                    .map_err(|err| anyhow!("{err}; expected all, completed or pending"))?,
            },
            "page" => Self::parse_page(model, rest)?,
            "next" | "n" => Command::NextPage,
            "prev" | "p" => Command::PreviousPage,
            "reset" => {
                model.search_input.clear();
                Command::ResetFilters
            }

            other => bail!("Unknown command '{other}', press ? for help"),
        };

        Ok(UiMessage::Command(command))
    }

    fn parse_id(text: &str) -> Result<TodoId> {
        let text = text.trim().trim_start_matches('#');
        if text.is_empty() {
            bail!("Missing todo id");
        }
        text.parse::<TodoId>()
            .with_context(|| format!("'{text}' is not a todo id"))
    }

    fn parse_add(rest: &str) -> Command {
        let (title, description) = match rest.split_once('|') {
            Some((title, description)) => (title.trim(), Some(description.trim())),
            None => (rest.trim(), None),
        };

        let mut todo = NewTodo::new(title);
        if let Some(description) = description.filter(|d| !d.is_empty()) {
            todo = todo.with_description(description);
        }
        Command::Create { todo }
    }

    fn parse_edit(rest: &str) -> Result<Command> {
        let mut parts = rest.splitn(3, char::is_whitespace);
        let id = Self::parse_id(parts.next().unwrap_or_default())?;
        let field = parts
            .next()
            .ok_or_else(|| anyhow!("Usage: edit <id> title|desc|finished <value>"))?;
        let value = parts.next().unwrap_or_default().trim();

        let mut patch = TodoPatch::default();
        match field.to_ascii_lowercase().as_str() {
            "title" => patch.title = Some(value.to_string()),
            "desc" | "description" => {
                patch.description = if value.is_empty() || value == "-" {
                    FieldUpdate::Clear
                } else {
                    FieldUpdate::Set(value.to_string())
                };
            }
            "finished" | "done" => patch.is_finished = Some(parse_flag(value)?),
            other => bail!("Unknown field '{other}', expected title, desc or finished"),
        }

        Ok(Command::Update { id, patch })
    }

    /// Follow the paginator link of a numbered page button
    fn parse_page(model: &UiModel, rest: &str) -> Result<Command> {
        let label = rest.trim();
        let button = model
            .projection
            .page_buttons()
            .into_iter()
            .find(|button| button.label == label)
            .ok_or_else(|| anyhow!("No page '{label}' in the current listing"))?;

        if button.target.is_none() {
            bail!("Page '{label}' is not available");
        }
        Ok(Command::FollowLink { url: button.url })
    }
}

/// All -> pending -> completed -> all
fn next_status(status: StatusFilter) -> StatusFilter {
    match status {
        StatusFilter::All => StatusFilter::Pending,
        StatusFilter::Pending => StatusFilter::Completed,
        StatusFilter::Completed => StatusFilter::All,
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "done" => Ok(true),
        "0" | "false" | "no" | "n" | "pending" => Ok(false),
        other => bail!("'{other}' is not a yes/no value"),
    }
}
