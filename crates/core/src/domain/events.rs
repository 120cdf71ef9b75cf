use super::{
    page::TodoPage,
    query::ListQuery,
    todo::{Todo, TodoId},
};
use crate::error::GatewayError;

/// Kind of mutation, used to label in-flight and failed operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    Toggle,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Toggle => "toggle",
        };
        f.write_str(name)
    }
}

/// Domain events produced by the controller and its background tasks
#[derive(Debug, Clone)]
pub enum Event {
    /// A listing request was sent
    NavigationStarted { query: ListQuery },

    /// A fresh page arrived from the server
    PageLoaded { query: ListQuery, page: TodoPage },

    /// A listing request failed; the current page stays in place
    NavigationFailed { query: ListQuery, error: GatewayError },

    /// A mutation request was sent
    MutationStarted { kind: MutationKind, id: Option<TodoId> },

    /// The server created a todo. `generation` is the page generation the
    /// create was sent against.
    TodoCreated {
        todo: Todo,
        message: String,
        generation: u64,
    },

    /// The server stored an edit
    TodoUpdated { todo: Todo, message: String },

    /// The server flipped the finished flag
    TodoToggled { todo: Todo, message: String },

    /// The server deleted a todo
    TodoDeleted { id: TodoId, message: String },

    /// The server accepted a create/update but sent no record back
    MutationAcknowledged { kind: MutationKind, id: Option<TodoId>, message: String },

    /// A mutation was rejected or never reached the server
    MutationFailed {
        kind: MutationKind,
        id: Option<TodoId>,
        error: GatewayError,
    },

    /// User requested to quit the application
    QuitRequested,
}
