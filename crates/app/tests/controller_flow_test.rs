//! Integration tests for the controller against an in-memory server

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use tasklist_app::services::TodoController;
use tasklist_app::ui::{UiMessage, UiUpdate};
use tasklist_core::app::Command;
use tasklist_core::domain::{
    FieldUpdate, ListQuery, NewTodo, PageLink, PageMeta, Stats, StatusFilter, Todo, TodoId, TodoPage,
    TodoPatch,
};
use tasklist_core::ports::{Envelope, FixedClock, Mutation, TodoTransport, TransportResponse, UiConfig};

#[derive(Default)]
struct ServerState {
    todos: Vec<Todo>,
    next_id: u64,
    per_page: usize,
    list_queries: Vec<ListQuery>,
    sends: usize,
    primes: usize,
    stale_once: bool,
    fail_next: Option<u16>,
    send_delay: Option<std::time::Duration>,
}

/// Behaves like the todo endpoints, backed by a Vec
#[derive(Clone)]
struct FakeServer {
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    fn with_todos(todos: Vec<Todo>, per_page: usize) -> Self {
        let next_id = todos.iter().map(|t| t.id.0).max().unwrap_or(0) + 1;
        Self {
            state: Arc::new(Mutex::new(ServerState {
                todos,
                next_id,
                per_page,
                ..ServerState::default()
            })),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    fn page_url(page: usize) -> String {
        format!("http://fake.test/todos?page={page}")
    }
}

fn ok(message: &str, todo: Option<Todo>) -> TransportResponse {
    TransportResponse::new(
        200,
        Some(Envelope {
            success: true,
            message: message.to_string(),
            todo,
            ..Envelope::default()
        }),
    )
}

#[async_trait]
impl TodoTransport for FakeServer {
    async fn list(&self, query: &ListQuery) -> Result<TodoPage> {
        let mut state = self.state();
        state.list_queries.push(query.clone());

        let mut matching: Vec<Todo> = state
            .todos
            .iter()
            .filter(|t| query.status.matches(t.is_finished))
            .filter(|t| t.title.contains(&query.search))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let per_page = state.per_page;
        let last_page = matching.len().div_ceil(per_page).max(1);
        let current = query.current_page() as usize;
        let items: Vec<Todo> = matching.iter().skip((current - 1) * per_page).take(per_page).cloned().collect();

        let links = (1..=last_page)
            .map(|page| PageLink {
                url: Some(Self::page_url(page)),
                label: page.to_string(),
                active: page == current,
            })
            .collect();

        let completed = state.todos.iter().filter(|t| t.is_finished).count() as u64;
        let total = state.todos.len() as u64;

        Ok(TodoPage {
            items,
            meta: PageMeta {
                current_page: current as u32,
                last_page: last_page as u32,
                per_page: per_page as u32,
                total: matching.len() as u64,
                prev_page_url: (current > 1).then(|| Self::page_url(current - 1)),
                next_page_url: (current < last_page).then(|| Self::page_url(current + 1)),
                links,
            },
            stats: Stats::new(total, completed, total - completed),
        })
    }

    async fn send(&self, mutation: &Mutation) -> Result<TransportResponse> {
        let delay = self.state().send_delay.take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        state.sends += 1;

        if state.stale_once {
            state.stale_once = false;
            return Ok(TransportResponse::new(419, None));
        }
        if let Some(status) = state.fail_next.take() {
            return Ok(TransportResponse::new(
                status,
                Some(Envelope {
                    success: false,
                    message: "Gagal menyimpan".into(),
                    todo: None,
                    ..Envelope::default()
                }),
            ));
        }

        match mutation {
            Mutation::Create(new) => {
                let todo = Todo {
                    id: TodoId(state.next_id),
                    title: new.title.clone(),
                    description: new.description.clone(),
                    is_finished: false,
                    cover: None,
                    created_at: now(),
                    updated_at: None,
                };
                state.next_id += 1;
                state.todos.push(todo.clone());
                Ok(ok("Todo berhasil ditambahkan!", Some(todo)))
            }
            Mutation::Update { id, form } => {
                let Some(todo) = state.todos.iter_mut().find(|t| t.id == *id) else {
                    return Ok(TransportResponse::new(404, None));
                };
                todo.title = form.title.clone();
                todo.description = form.description.clone();
                if let Some(finished) = form.is_finished {
                    todo.is_finished = finished;
                }
                let todo = todo.clone();
                Ok(ok("Todo berhasil diupdate!", Some(todo)))
            }
            Mutation::Toggle { id } => {
                let Some(todo) = state.todos.iter_mut().find(|t| t.id == *id) else {
                    return Ok(TransportResponse::new(404, None));
                };
                todo.is_finished = !todo.is_finished;
                let todo = todo.clone();
                Ok(ok("Status todo berhasil diubah!", Some(todo)))
            }
            Mutation::Delete { id } => {
                state.todos.retain(|t| t.id != *id);
                Ok(ok("Todo berhasil dihapus!", None))
            }
        }
    }

    async fn prime_session(&self) -> Result<()> {
        self.state().primes += 1;
        Ok(())
    }
}

/// Transport whose every call fails at the network level
struct Offline;

#[async_trait]
impl TodoTransport for Offline {
    async fn list(&self, _query: &ListQuery) -> Result<TodoPage> {
        bail!("connection refused")
    }

    async fn send(&self, _mutation: &Mutation) -> Result<TransportResponse> {
        bail!("connection refused")
    }

    async fn prime_session(&self) -> Result<()> {
        bail!("connection refused")
    }
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()
}

fn todo(id: u64, hours_ago: i64, finished: bool) -> Todo {
    Todo {
        id: TodoId(id),
        title: format!("todo {id}"),
        description: Some(format!("<p>details {id}</p>")),
        is_finished: finished,
        cover: None,
        created_at: now() - Duration::hours(hours_ago),
        updated_at: None,
    }
}

fn controller(transport: Arc<dyn TodoTransport>) -> TodoController {
    TodoController::new(transport, Arc::new(FixedClock::utc(now())), &UiConfig::default())
}

async fn loaded(server: &FakeServer) -> TodoController {
    let mut controller = controller(Arc::new(server.clone()));
    controller.handle_command(Command::Navigate {
        query: ListQuery::default(),
    });
    controller.settle().await;
    controller
}

#[tokio::test(start_paused = true)]
async fn test_debounced_search_navigates_once_with_last_value() {
    let server = FakeServer::with_todos(vec![todo(1, 1, false), todo(2, 2, false)], 20);
    let mut controller = loaded(&server).await;
    assert_eq!(server.state().list_queries.len(), 1);

    for text in ["t", "to", "tod", "todo", "todo 2"] {
        controller.handle_command(Command::Search { text: text.into() });
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    controller.settle().await;

    let queries = server.state().list_queries.clone();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[1].search, "todo 2");
    assert_eq!(queries[1].page, None);

    let model = controller.model();
    assert_eq!(model.projection.store.len(), 1);
    assert_eq!(model.projection.query.search, "todo 2");
}

#[tokio::test]
async fn test_status_change_navigates_immediately_and_keeps_search() {
    let server = FakeServer::with_todos(vec![todo(1, 1, false), todo(2, 2, true)], 20);
    let mut controller = loaded(&server).await;

    controller.model_mut().search_input = "todo".into();
    controller.handle_command(Command::SetStatus {
        status: StatusFilter::Completed,
    });
    controller.settle().await;

    let last = server.state().list_queries.last().cloned().unwrap();
    assert_eq!(last.search, "todo");
    assert_eq!(last.status, StatusFilter::Completed);
    assert_eq!(controller.model().projection.store.live()[0].id, TodoId(2));
}

#[tokio::test(start_paused = true)]
async fn test_search_during_status_change_keeps_requested_status() {
    let server = FakeServer::with_todos(vec![todo(1, 1, false), todo(2, 2, true)], 20);
    let mut controller = loaded(&server).await;

    // Typed before the completed page has arrived
    controller.handle_command(Command::SetStatus {
        status: StatusFilter::Completed,
    });
    controller.handle_command(Command::Search { text: "todo".into() });
    controller.settle().await;

    let last = server.state().list_queries.last().cloned().unwrap();
    assert_eq!(last, ListQuery::new("todo", StatusFilter::Completed));

    let model = controller.model();
    assert_eq!(model.projection.query.status, StatusFilter::Completed);
    assert_eq!(model.status_input, StatusFilter::Completed);
    assert_eq!(model.projection.store.live()[0].id, TodoId(2));
    assert_eq!(model.projection.store.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_create_answered_on_another_page_reloads_it() {
    let server = FakeServer::with_todos(vec![todo(1, 1, false), todo(2, 2, false), todo(3, 3, true)], 2);
    let mut controller = loaded(&server).await;

    server.state().send_delay = Some(std::time::Duration::from_millis(500));
    controller.handle_command(Command::Create {
        todo: NewTodo::new("Buy milk"),
    });
    controller.handle_command(Command::NextPage);
    controller.settle().await;

    // Initial load, page two, then the reload after the late create
    let queries = server.state().list_queries.clone();
    assert_eq!(queries.len(), 3);
    assert_eq!(queries[2].page, Some(2));

    let model = controller.model();
    let ids: Vec<TodoId> = model.projection.store.live().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![TodoId(2), TodoId(3)]);
    assert_eq!(model.projection.stats, Stats::new(4, 1, 3));
    assert_eq!(model.creating, 0);
    assert_eq!(model.messages, vec!["Todo berhasil ditambahkan!".to_string()]);
}

#[tokio::test]
async fn test_create_after_stale_session_applies_once() {
    let server = FakeServer::with_todos(vec![todo(1, 30, false), todo(2, 31, true)], 20);
    let mut controller = loaded(&server).await;
    assert_eq!(controller.model().projection.stats, Stats::new(2, 1, 1));
    assert!(controller.model().projection.store.todays().is_empty());

    server.state().stale_once = true;
    controller.handle_command(Command::Create {
        todo: NewTodo::new("Buy milk"),
    });
    controller.settle().await;

    let state = server.state();
    assert_eq!(state.sends, 2);
    assert_eq!(state.primes, 1);
    drop(state);

    let projection = &controller.model().projection;
    assert_eq!(projection.stats, Stats::new(3, 1, 2));
    assert_eq!(projection.store.live()[0].title, "Buy milk");
    assert_eq!(projection.store.len(), 3);
    assert_eq!(projection.store.todays().len(), 1);
    assert_eq!(controller.model().creating, 0);
}

#[tokio::test]
async fn test_invalid_create_never_reaches_server() {
    let server = FakeServer::with_todos(vec![todo(1, 1, false)], 20);
    let mut controller = loaded(&server).await;

    controller.handle_command(Command::Create {
        todo: NewTodo::new("   "),
    });
    controller.settle().await;

    assert_eq!(server.state().sends, 0);
    assert!(controller.model().field_errors.contains_key("title"));
    assert_eq!(controller.model().projection.stats, Stats::new(1, 0, 1));
}

#[tokio::test]
async fn test_failed_toggle_leaves_state_unchanged() {
    let server = FakeServer::with_todos(vec![todo(1, 1, false), todo(2, 2, true)], 20);
    let mut controller = loaded(&server).await;
    let before = controller.model().projection.store.live().to_vec();

    server.state().fail_next = Some(500);
    controller.handle_command(Command::Toggle { id: TodoId(1) });
    controller.settle().await;

    let model = controller.model();
    assert_eq!(model.projection.stats, Stats::new(2, 1, 1));
    assert_eq!(model.projection.store.live(), before.as_slice());
    assert!(!model.is_busy(TodoId(1)));
    assert!(model.errors.iter().any(|e| e.contains("Gagal menyimpan")));
}

#[tokio::test]
async fn test_concurrent_toggles_on_different_todos_commute() {
    let server = FakeServer::with_todos(
        vec![todo(1, 1, false), todo(2, 2, false), todo(3, 3, true)],
        20,
    );
    let mut controller = loaded(&server).await;
    assert_eq!(controller.model().projection.stats, Stats::new(3, 1, 2));

    controller.handle_command(Command::Toggle { id: TodoId(1) });
    controller.handle_command(Command::Toggle { id: TodoId(3) });
    controller.handle_command(Command::Toggle { id: TodoId(2) });
    assert!(controller.model().is_busy(TodoId(1)));
    controller.settle().await;

    let model = controller.model();
    assert_eq!(model.projection.stats, Stats::new(3, 2, 1));
    assert!(model.in_flight.is_empty());
    let finished: Vec<bool> = model.projection.store.live().iter().map(|t| t.is_finished).collect();
    assert_eq!(finished, vec![true, true, false]);
}

#[tokio::test]
async fn test_second_request_for_busy_todo_is_skipped() {
    let server = FakeServer::with_todos(vec![todo(1, 1, false)], 20);
    let mut controller = loaded(&server).await;

    controller.handle_command(Command::Toggle { id: TodoId(1) });
    controller.handle_command(Command::Delete { id: TodoId(1) });
    controller.settle().await;

    assert_eq!(server.state().sends, 1);
    assert_eq!(controller.model().projection.stats, Stats::new(1, 1, 0));
}

#[tokio::test]
async fn test_deleting_last_item_of_a_page_steps_back() {
    let server = FakeServer::with_todos(vec![todo(1, 1, false), todo(2, 2, false), todo(3, 3, true)], 2);
    let mut controller = loaded(&server).await;

    controller.handle_command(Command::NextPage);
    controller.settle().await;
    assert_eq!(controller.model().projection.query.page, Some(2));
    assert_eq!(controller.model().projection.store.len(), 1);

    controller.handle_command(Command::Delete { id: TodoId(3) });
    controller.settle().await;

    let queries = server.state().list_queries.clone();
    assert_eq!(queries.last().and_then(|q| q.page), Some(1));
    let projection = &controller.model().projection;
    assert_eq!(projection.query.current_page(), 1);
    assert_eq!(projection.store.len(), 2);
    assert_eq!(projection.stats, Stats::new(2, 0, 2));
}

#[tokio::test]
async fn test_edit_keeps_title_and_clears_description() {
    let server = FakeServer::with_todos(vec![todo(1, 1, false)], 20);
    let mut controller = loaded(&server).await;

    controller.handle_command(Command::Update {
        id: TodoId(1),
        patch: TodoPatch {
            description: FieldUpdate::Clear,
            is_finished: Some(true),
            ..TodoPatch::default()
        },
    });
    controller.settle().await;

    let model = controller.model();
    let edited = model.projection.find(TodoId(1)).cloned().unwrap();
    assert_eq!(edited.title, "todo 1");
    assert_eq!(edited.description, None);
    assert!(edited.is_finished);
    assert_eq!(model.projection.stats, Stats::new(1, 1, 0));
}

#[tokio::test]
async fn test_edit_of_unknown_todo_without_title_fails_locally() {
    let server = FakeServer::with_todos(vec![todo(1, 1, false)], 20);
    let mut controller = loaded(&server).await;

    controller.handle_command(Command::Update {
        id: TodoId(99),
        patch: TodoPatch::default(),
    });
    controller.settle().await;

    assert_eq!(server.state().sends, 0);
    assert!(controller.model().field_errors.contains_key("title"));
}

#[tokio::test]
async fn test_shell_lines_drive_the_controller() -> Result<()> {
    let server = FakeServer::with_todos(vec![todo(1, 1, false), todo(2, 2, true)], 20);
    let mut controller = loaded(&server).await;

    for line in ["toggle 1", "add Write tests | with mocks"] {
        match UiUpdate::handle_line(controller.model_mut(), line)? {
            UiMessage::Command(command) => controller.handle_command(command),
            UiMessage::None => panic!("{line:?} produced no command"),
        }
    }
    controller.settle().await;

    assert_eq!(controller.model().projection.stats, Stats::new(3, 2, 1));
    assert_eq!(controller.model().messages.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_offline_server_reports_errors() {
    let mut controller = controller(Arc::new(Offline));
    controller.handle_command(Command::Navigate {
        query: ListQuery::default(),
    });
    controller.handle_command(Command::Toggle { id: TodoId(1) });
    controller.settle().await;

    let model = controller.model();
    assert!(!model.projection.loading);
    assert!(model.projection.store.is_empty());
    assert_eq!(model.errors.len(), 2);
    assert!(model.errors.iter().all(|e| e.contains("connection refused")));
}
