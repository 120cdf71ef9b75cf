use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{ListQuery, MutationKind, NewTodo, Todo, TodoId, TodoPage, UpdateForm};
use crate::error::GatewayError;
use crate::ports::{Mutation, TodoTransport, TransportResponse, STATUS_STALE_SESSION};

/// Normalized result of a mutation. Callers branch on `success`; when it
/// is `false`, `error` says what kind of failure occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResult {
    pub kind: MutationKind,
    pub success: bool,
    pub message: String,
    pub todo: Option<Todo>,
    pub id: Option<TodoId>,
    pub error: Option<GatewayError>,
}

impl GatewayResult {
    fn succeeded(mutation: &Mutation, message: String, todo: Option<Todo>) -> Self {
        let id = todo.as_ref().map(|t| t.id).or(mutation.target());
        Self {
            kind: mutation.kind(),
            success: true,
            message,
            todo,
            id,
            error: None,
        }
    }

    fn failed(mutation: &Mutation, error: GatewayError) -> Self {
        Self {
            kind: mutation.kind(),
            success: false,
            message: error.to_string(),
            todo: None,
            id: mutation.target(),
            error: Some(error),
        }
    }
}

/// Retry allowance carried by a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u8,
}

impl RetryBudget {
    /// One silent retry after re-priming the session
    pub const fn single() -> Self {
        Self { remaining: 1 }
    }

    pub const fn none() -> Self {
        Self { remaining: 0 }
    }

    /// Consume one retry, if any is left
    pub fn take(&mut self) -> bool {
        match self.remaining.checked_sub(1) {
            Some(remaining) => {
                self.remaining = remaining;
                true
            }
            None => false,
        }
    }
}

/// Uniform front for the todo endpoints.
///
/// Every call resolves to a [`GatewayResult`]; no error escapes. A stale
/// session is retried once after re-priming the session; a second stale
/// answer, or a failed re-prime, is reported like any other failure.
pub struct FetchGateway {
    transport: Arc<dyn TodoTransport>,
}

impl FetchGateway {
    pub fn new(transport: Arc<dyn TodoTransport>) -> Self {
        Self { transport }
    }

    pub async fn create(&self, todo: NewTodo) -> GatewayResult {
        if let Err(err) = todo.validate() {
            return GatewayResult::failed(&Mutation::Create(todo), err.into());
        }
        self.execute(Mutation::Create(todo)).await
    }

    pub async fn update(&self, id: TodoId, form: UpdateForm) -> GatewayResult {
        self.execute(Mutation::Update { id, form }).await
    }

    pub async fn delete(&self, id: TodoId) -> GatewayResult {
        self.execute(Mutation::Delete { id }).await
    }

    pub async fn toggle(&self, id: TodoId) -> GatewayResult {
        self.execute(Mutation::Toggle { id }).await
    }

    /// Read one listing page
    pub async fn fetch_page(&self, query: &ListQuery) -> Result<TodoPage, GatewayError> {
        debug!("Fetching page {:?}", query);
        self.transport
            .list(query)
            .await
            .map_err(|err| GatewayError::Transport {
                message: format!("{err:#}"),
            })
    }

    /// Send a mutation with the default retry budget
    pub async fn execute(&self, mutation: Mutation) -> GatewayResult {
        self.execute_with(mutation, RetryBudget::single()).await
    }

    pub async fn execute_with(&self, mutation: Mutation, mut budget: RetryBudget) -> GatewayResult {
        loop {
            let outcome = match self.transport.send(&mutation).await {
                Ok(response) => classify(response),
                Err(err) => Err(GatewayError::Transport {
                    message: format!("{err:#}"),
                }),
            };

            match outcome {
                Err(GatewayError::StaleSession) if budget.take() => {
                    warn!("Session expired during {}, re-priming and retrying once", mutation.kind());
                    if let Err(err) = self.transport.prime_session().await {
                        warn!("Re-priming the session failed: {err:#}");
                        return GatewayResult::failed(&mutation, GatewayError::StaleSession);
                    }
                }
                Ok((message, todo)) => {
                    info!("{} succeeded: {}", mutation.kind(), message);
                    return GatewayResult::succeeded(&mutation, message, todo);
                }
                Err(error) => {
                    warn!("{} failed: {}", mutation.kind(), error);
                    return GatewayResult::failed(&mutation, error);
                }
            }
        }
    }
}

/// Map a raw answer onto success or a classified failure
fn classify(response: TransportResponse) -> Result<(String, Option<Todo>), GatewayError> {
    let status = response.status;
    let success = response.is_success_status();
    let envelope = response.envelope.unwrap_or_default();

    if status == 422 {
        let field_error = envelope.first_field_error();
        let message = match (envelope.message.is_empty(), field_error) {
            (true, Some((_, detail))) => detail.to_string(),
            _ => envelope.message.clone(),
        };
        return Err(GatewayError::Validation {
            field: field_error.map(|(field, _)| field.to_string()),
            message,
        });
    }

    let message = envelope.message;
    match status {
        _ if success && envelope.success => Ok((message, envelope.todo)),
        STATUS_STALE_SESSION => Err(GatewayError::StaleSession),
        401 | 403 => Err(GatewayError::Authorization { message }),
        _ => Err(GatewayError::Server {
            status,
            message: if message.is_empty() {
                format!("request failed with status {status}")
            } else {
                message
            },
        }),
    }
}
