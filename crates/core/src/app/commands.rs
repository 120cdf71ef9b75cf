use crate::domain::{ListQuery, NewTodo, StatusFilter, TodoId, TodoPatch};

/// Commands that can be sent to the todo controller
#[derive(Debug, Clone)]
pub enum Command {
    /// Load a page from the server, replacing the current one
    Navigate { query: ListQuery },

    /// Search text changed; navigates once typing settles
    Search { text: String },

    /// Status filter changed; navigates immediately
    SetStatus { status: StatusFilter },

    /// Clear search and status and go back to the first page
    ResetFilters,

    /// Follow a paginator link
    FollowLink { url: Option<String> },

    /// Go to the previous page, if any
    PreviousPage,

    /// Go to the next page, if any
    NextPage,

    /// Create a todo
    Create { todo: NewTodo },

    /// Edit a todo
    Update { id: TodoId, patch: TodoPatch },

    /// Flip the finished flag
    Toggle { id: TodoId },

    /// Delete a todo
    Delete { id: TodoId },

    /// Quit the application
    Quit,
}
