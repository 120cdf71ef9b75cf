use std::sync::Arc;
use std::time::Duration;
use tasklist_core::app::{Command, FetchGateway, FollowUp, GatewayResult};
use tasklist_core::domain::{Event, ListQuery, MutationKind, TodoId};
use tasklist_core::error::GatewayError;
use tasklist_core::ports::{Clock, TodoTransport, UiConfig};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use super::debounce::SearchDebouncer;
use crate::ui::UiModel;

/// Orchestrates user actions against the server.
///
/// Commands come in through `handle_command` or, for debounced searches,
/// over a channel; every request runs as its own task and reports back as an [`Event`]. The
/// controller applies events one at a time, so the projection is only ever
/// touched from here.
pub struct TodoController {
    gateway: Arc<FetchGateway>,
    clock: Arc<dyn Clock>,

    // Event bus
    event_tx: mpsc::UnboundedSender<Event>,
    event_rx: mpsc::UnboundedReceiver<Event>,

    // Commands fired by the search debouncer
    command_rx: mpsc::UnboundedReceiver<Command>,

    model: UiModel,
    debouncer: SearchDebouncer,

    // Background requests
    tasks: JoinSet<()>,

    /// Listing responses for any other query are stale and dropped
    latest_navigation: Option<ListQuery>,
}

impl TodoController {
    pub fn new(transport: Arc<dyn TodoTransport>, clock: Arc<dyn Clock>, config: &UiConfig) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let debouncer = SearchDebouncer::new(
            Duration::from_millis(config.search_debounce_ms),
            command_tx,
        );

        Self {
            gateway: Arc::new(FetchGateway::new(transport)),
            clock,
            event_tx,
            event_rx,
            command_rx,
            model: UiModel::new(config.recent_limit),
            debouncer,
            tasks: JoinSet::new(),
            latest_navigation: None,
        }
    }

    pub fn model(&self) -> &UiModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut UiModel {
        &mut self.model
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Clock handle for callers that also hold the model mutably
    pub fn shared_clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Nothing in flight and no search waiting to fire
    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty() && !self.debouncer.is_pending()
    }

    /// Handle a command from the UI
    pub fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Navigate { query } => self.navigate(query),

            Command::Search { text } => {
                self.model.search_input = text.clone();
                let query = ListQuery::new(text, self.model.status_input);
                self.debouncer.schedule(query);
            }

            Command::SetStatus { status } => {
                self.debouncer.cancel();
                let query = ListQuery::new(self.model.search_input.clone(), status);
                self.navigate(query);
            }

            Command::ResetFilters => {
                self.debouncer.cancel();
                self.model.search_input.clear();
                self.navigate(ListQuery::default());
            }

            Command::FollowLink { url } => match self.model.projection.follow_link(url.as_deref()) {
                Some(query) => self.navigate(query),
                None => debug!("Paginator link {:?} leads nowhere", url),
            },

            Command::PreviousPage => match self.model.projection.previous_page() {
                Some(query) => self.navigate(query),
                None => self.model.add_message("Already on the first page"),
            },

            Command::NextPage => match self.model.projection.next_page() {
                Some(query) => self.navigate(query),
                None => self.model.add_message("Already on the last page"),
            },

            Command::Create { todo } => {
                self.process_event(Event::MutationStarted {
                    kind: MutationKind::Create,
                    id: None,
                });
                let gateway = self.gateway.clone();
                self.spawn_mutation(async move { gateway.create(todo).await });
            }

            Command::Update { id, patch } => {
                if self.skip_if_busy(id) {
                    return;
                }
                let form = match patch.resolve(self.model.projection.find(id)) {
                    Ok(form) => form,
                    Err(err) => {
                        self.process_event(Event::MutationFailed {
                            kind: MutationKind::Update,
                            id: Some(id),
                            error: GatewayError::Invalid(err),
                        });
                        return;
                    }
                };
                self.process_event(Event::MutationStarted {
                    kind: MutationKind::Update,
                    id: Some(id),
                });
                let gateway = self.gateway.clone();
                self.spawn_mutation(async move { gateway.update(id, form).await });
            }

            Command::Toggle { id } => {
                if self.skip_if_busy(id) {
                    return;
                }
                self.process_event(Event::MutationStarted {
                    kind: MutationKind::Toggle,
                    id: Some(id),
                });
                let gateway = self.gateway.clone();
                self.spawn_mutation(async move { gateway.toggle(id).await });
            }

            Command::Delete { id } => {
                if self.skip_if_busy(id) {
                    return;
                }
                self.process_event(Event::MutationStarted {
                    kind: MutationKind::Delete,
                    id: Some(id),
                });
                let gateway = self.gateway.clone();
                self.spawn_mutation(async move { gateway.delete(id).await });
            }

            Command::Quit => {
                info!("Quit command received");
                self.debouncer.cancel();
                self.process_event(Event::QuitRequested);
            }
        }
    }

    fn skip_if_busy(&mut self, id: TodoId) -> bool {
        match self.model.in_flight.get(&id) {
            Some(kind) => {
                let message = format!("#{id} is still waiting for its {kind} request");
                self.model.add_message(message);
                true
            }
            None => false,
        }
    }

    /// Replace the current page with the server's answer for `query`
    fn navigate(&mut self, query: ListQuery) {
        info!("Loading {:?}", query);
        self.model.status_input = query.status;
        self.latest_navigation = Some(query.clone());
        self.process_event(Event::NavigationStarted { query: query.clone() });

        let gateway = self.gateway.clone();
        let event_tx = self.event_tx.clone();
        self.tasks.spawn(async move {
            let event = match gateway.fetch_page(&query).await {
                Ok(page) => Event::PageLoaded { query, page },
                Err(error) => {
                    error!("Loading todos failed: {}", error);
                    Event::NavigationFailed { query, error }
                }
            };
            let _ = event_tx.send(event);
        });
    }

    fn spawn_mutation<F>(&mut self, request: F)
    where
        F: std::future::Future<Output = GatewayResult> + Send + 'static,
    {
        let event_tx = self.event_tx.clone();
        let generation = self.model.projection.generation;
        self.tasks.spawn(async move {
            let result = request.await;
            if event_tx.send(outcome_event(result, generation)).is_err() {
                error!("Event receiver dropped before a mutation finished");
            }
        });
    }

    /// Apply a single event to the model
    pub fn process_event(&mut self, event: Event) {
        if let Event::PageLoaded { query, .. } | Event::NavigationFailed { query, .. } = &event {
            if self.latest_navigation.as_ref() != Some(query) {
                debug!("Dropping answer for superseded query {:?}", query);
                return;
            }
        }

        match self.model.apply_event(&event, self.clock.as_ref()) {
            FollowUp::None => {}
            FollowUp::Reload(query) => self.navigate(query),
        }
    }

    /// Handle whatever comes next: a command, an event or a finished task
    pub async fn next_change(&mut self) {
        tokio::select! {
            Some(cmd) = self.command_rx.recv() => {
                self.handle_command(cmd);
            }

            Some(event) = self.event_rx.recv() => {
                self.process_event(event);
            }

            Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                if let Err(e) = joined {
                    error!("Background task failed: {}", e);
                }
            }
        }
    }

    /// Handle queued input without waiting; true if anything was handled
    fn drain(&mut self) -> bool {
        let mut handled = false;
        loop {
            if let Ok(cmd) = self.command_rx.try_recv() {
                self.handle_command(cmd);
            } else if let Ok(event) = self.event_rx.try_recv() {
                self.process_event(event);
            } else {
                return handled;
            }
            handled = true;
        }
    }

    /// Run until every request, reload and pending search has been applied
    pub async fn settle(&mut self) {
        loop {
            self.drain();
            if self.is_idle() {
                // A timer that just fired may have queued its navigation
                if !self.drain() && self.is_idle() {
                    return;
                }
                continue;
            }
            self.next_change().await;
        }
    }

}

impl Drop for TodoController {
    fn drop(&mut self) {
        self.tasks.abort_all();
    }
}

/// Turn a gateway result into the event the projection understands.
/// `generation` is the page the request was sent against.
fn outcome_event(result: GatewayResult, generation: u64) -> Event {
    let GatewayResult {
        kind,
        success,
        message,
        todo,
        id,
        error,
    } = result;

    if !success {
        let error = error.unwrap_or(GatewayError::Transport { message });
        return Event::MutationFailed { kind, id, error };
    }

    match (kind, todo, id) {
        (MutationKind::Create, Some(todo), _) => Event::TodoCreated {
            todo,
            message,
            generation,
        },
        (MutationKind::Update, Some(todo), _) => Event::TodoUpdated { todo, message },
        (MutationKind::Toggle, Some(todo), _) => Event::TodoToggled { todo, message },
        (MutationKind::Delete, _, Some(id)) => Event::TodoDeleted { id, message },
        (kind, _, id) => Event::MutationAcknowledged { kind, id, message },
    }
}
