use crate::domain::{ListQuery, NewTodo, Todo, TodoId, TodoPage, UpdateForm};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status the server answers with when the anti-forgery token expired
pub const STATUS_STALE_SESSION: u16 = 419;

/// A mutation sent to the todo resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(NewTodo),
    Update { id: TodoId, form: UpdateForm },
    Delete { id: TodoId },
    Toggle { id: TodoId },
}

impl Mutation {
    pub fn kind(&self) -> crate::domain::MutationKind {
        use crate::domain::MutationKind;
        match self {
            Self::Create(_) => MutationKind::Create,
            Self::Update { .. } => MutationKind::Update,
            Self::Delete { .. } => MutationKind::Delete,
            Self::Toggle { .. } => MutationKind::Toggle,
        }
    }

    /// Target id, `None` for creates
    pub fn target(&self) -> Option<TodoId> {
        match self {
            Self::Create(_) => None,
            Self::Update { id, .. } | Self::Delete { id } | Self::Toggle { id } => Some(*id),
        }
    }
}

/// JSON envelope returned by every mutation endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub todo: Option<Todo>,
    /// Per-field messages of a rejected form, keyed by field name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, Vec<String>>,
}

impl Envelope {
    /// First rejected field and its first message
    pub fn first_field_error(&self) -> Option<(&str, &str)> {
        self.errors
            .iter()
            .find_map(|(field, messages)| Some((field.as_str(), messages.first()?.as_str())))
    }
}

/// Raw answer to a mutation: the HTTP status and the envelope, when the
/// body could be decoded as one
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub envelope: Option<Envelope>,
}

impl TransportResponse {
    pub fn new(status: u16, envelope: Option<Envelope>) -> Self {
        Self { status, envelope }
    }

    pub fn is_success_status(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Port for talking to the todo resource.
///
/// `Err` means the request never produced an HTTP answer (connection
/// refused, timeout, undecodable listing). Any answer, including error
/// statuses, is returned as a [`TransportResponse`] for the gateway to
/// classify.
#[async_trait]
pub trait TodoTransport: Send + Sync {
    /// Fetch one listing page
    async fn list(&self, query: &ListQuery) -> Result<TodoPage>;

    /// Send a mutation with the current session token
    async fn send(&self, mutation: &Mutation) -> Result<TransportResponse>;

    /// Refresh the session and its anti-forgery token
    async fn prime_session(&self) -> Result<()>;
}
