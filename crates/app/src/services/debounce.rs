use std::time::Duration;
use tasklist_core::app::Command;
use tasklist_core::domain::ListQuery;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::debug;

/// Delays search navigation until typing settles.
///
/// Each `schedule` aborts the timer of the previous one, so only the last
/// query within the window reaches the controller.
pub struct SearchDebouncer {
    delay: Duration,
    command_tx: mpsc::UnboundedSender<Command>,
    pending: Option<AbortHandle>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration, command_tx: mpsc::UnboundedSender<Command>) -> Self {
        Self {
            delay,
            command_tx,
            pending: None,
        }
    }

    pub fn schedule(&mut self, query: ListQuery) {
        self.cancel();

        let delay = self.delay;
        let command_tx = self.command_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!("Search settled on {:?}", query.search);
            let _ = command_tx.send(Command::Navigate { query });
        });
        self.pending = Some(handle.abort_handle());
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether a timer is still waiting to fire
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
