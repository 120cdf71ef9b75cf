use std::collections::HashMap;
use tasklist_core::app::{FollowUp, TodoProjection};
use tasklist_core::domain::{Event, MutationKind, StatusFilter, Todo, TodoId};
use tasklist_core::ports::Clock;

/// The UI Model - the reconciled projection plus everything only the
/// screen cares about: which items are busy, the filter inputs, the cursor
/// and notices.
#[derive(Debug, Default)]
pub struct UiModel {
    /// Core state, changed only through events
    pub projection: TodoProjection,

    /// Mutations awaiting a server answer, keyed by item
    pub in_flight: HashMap<TodoId, MutationKind>,

    /// Create requests awaiting a server answer
    pub creating: usize,

    /// Search text as typed, ahead of the debounced query
    pub search_input: String,

    /// Status filter last asked for, ahead of the page that answers it
    pub status_input: StatusFilter,

    /// Status messages to display
    pub messages: Vec<String>,

    /// Error messages to display
    pub errors: Vec<String>,

    /// Per-field validation messages of the last failed form
    pub field_errors: HashMap<String, String>,

    /// Current text input, if any
    pub input: InputState,

    /// Current view mode
    pub mode: ViewMode,

    /// Row of the selected todo in the grouped list
    pub cursor: usize,

    /// Whether the application should quit
    pub should_quit: bool,
}

/// Input state for text entry
#[derive(Debug, Default)]
pub struct InputState {
    pub mode: InputMode,
    pub text: String,
}

/// What the text being typed is for
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    None,

    /// Live search; every keystroke reschedules the query
    Search,

    /// A shell command line such as `edit 4 desc -`
    Command,

    /// `title | description` of a new todo
    NewTodo,

    /// New title for an existing todo
    EditTitle { id: TodoId },
}

impl InputMode {
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Search => "Search: ",
            Self::Command => ":",
            Self::NewTodo => "New todo (title | description): ",
            Self::EditTitle { .. } => "Title: ",
        }
    }
}

/// Different screens of the terminal UI
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    List,

    /// Counters, monthly trend and calendar
    Insights,

    Help,
}

impl UiModel {
    pub fn new(recent_limit: usize) -> Self {
        Self {
            projection: TodoProjection::new(recent_limit),
            ..Self::default()
        }
    }

    /// Apply an event to update both projection and UI state
    pub fn apply_event(&mut self, event: &Event, clock: &dyn Clock) -> FollowUp {
        let follow_up = self.projection.apply(event, clock);

        match event {
            Event::NavigationStarted { .. } => {}

            Event::PageLoaded { query, .. } => {
                self.status_input = query.status;
            }

            Event::NavigationFailed { error, .. } => {
                self.add_error(format!("Could not load todos: {error}"));
            }

            Event::MutationStarted { kind, id } => {
                match id {
                    Some(id) => {
                        self.in_flight.insert(*id, *kind);
                    }
                    None => self.creating += 1,
                }
                if matches!(kind, MutationKind::Create | MutationKind::Update) {
                    self.field_errors.clear();
                }
            }

            Event::TodoCreated { message, .. } => {
                self.release(MutationKind::Create, None);
                self.add_message(message);
            }

            Event::TodoUpdated { todo, message } => {
                self.release(MutationKind::Update, Some(todo.id));
                self.add_message(message);
            }

            Event::TodoToggled { todo, message } => {
                self.release(MutationKind::Toggle, Some(todo.id));
                self.add_message(message);
            }

            Event::TodoDeleted { id, message } => {
                self.release(MutationKind::Delete, Some(*id));
                self.add_message(message);
            }

            Event::MutationAcknowledged { kind, id, message } => {
                self.release(*kind, *id);
                self.add_message(message);
            }

            Event::MutationFailed { kind, id, error } => {
                self.release(*kind, *id);
                if let Some(field) = error.field() {
                    self.field_errors.insert(field.to_string(), error.to_string());
                }
                self.add_error(match id {
                    Some(id) => format!("Failed to {kind} #{id}: {error}"),
                    None => format!("Failed to {kind}: {error}"),
                });
            }

            Event::QuitRequested => {
                self.should_quit = true;
            }
        }

        follow_up
    }

    fn release(&mut self, kind: MutationKind, id: Option<TodoId>) {
        match id {
            Some(id) if kind != MutationKind::Create => {
                self.in_flight.remove(&id);
            }
            _ => self.creating = self.creating.saturating_sub(1),
        }
    }

    /// Whether a request for this item is still pending
    pub fn is_busy(&self, id: TodoId) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// Todos in the order the list shows them
    pub fn visible(&self, clock: &dyn Clock) -> Vec<&Todo> {
        self.projection
            .groups(clock)
            .into_iter()
            .flat_map(|group| group.entries.into_iter().map(|entry| entry.todo))
            .collect()
    }

    /// Todo under the cursor, clamped to the visible list
    pub fn selected(&self, clock: &dyn Clock) -> Option<&Todo> {
        let visible = self.visible(clock);
        let last = visible.len().checked_sub(1)?;
        visible.get(self.cursor.min(last)).copied()
    }

    pub fn move_cursor(&mut self, down: bool, clock: &dyn Clock) {
        let last = self.visible(clock).len().saturating_sub(1);
        self.cursor = if down {
            (self.cursor + 1).min(last)
        } else {
            self.cursor.min(last).saturating_sub(1)
        };
    }

    /// Start typing into the input bar
    pub fn begin_input(&mut self, mode: InputMode, text: impl Into<String>) {
        self.input.mode = mode;
        self.input.text = text.into();
    }

    /// Leave the input bar, returning what was typed and what for
    pub fn take_input(&mut self) -> (InputMode, String) {
        let mode = std::mem::take(&mut self.input.mode);
        (mode, std::mem::take(&mut self.input.text))
    }

    pub fn add_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !message.is_empty() {
            self.messages.push(message);
        }
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Drop notices once they have been shown
    pub fn clear_notices(&mut self) {
        self.messages.clear();
        self.errors.clear();
    }
}
