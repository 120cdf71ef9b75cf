use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tasklist_app::adapters::http::HttpTransport;
use tasklist_app::services::TodoController;
use tasklist_app::ui::{UiMessage, UiReport, UiUpdate, UiView};
use tasklist_core::app::Command;
use tasklist_core::domain::{CoverUpload, FieldUpdate, ListQuery, NewTodo, TodoId, TodoPatch};
use tasklist_core::ports::{AppConfig, SystemClock};
use tracing::{error, info, warn};

/// How long one loop turn waits for a key or a finished request
const TICK: Duration = Duration::from_millis(16);

use crate::cli::CliCommand;

/// Composition root: the HTTP adapter and system clock wired into the
/// controller, driven either by one command or by the interactive shell.
pub struct TasklistApp {
    controller: TodoController,
}

impl TasklistApp {
    pub fn new(config: &AppConfig) -> Result<Self> {
        info!("Connecting to {}", config.server.base_url);
        let transport = Arc::new(HttpTransport::new(&config.server)?);
        let controller = TodoController::new(transport, Arc::new(SystemClock), &config.ui);
        Ok(Self { controller })
    }

    pub async fn run(mut self, command: CliCommand) -> Result<()> {
        match command {
            CliCommand::List { search, status, page } => {
                self.load(ListQuery::new(search, status).with_page(page)).await?;
            }

            CliCommand::Add {
                title,
                description,
                cover,
            } => {
                let mut todo = NewTodo::new(title);
                if let Some(description) = description {
                    todo = todo.with_description(description);
                }
                if let Some(path) = cover {
                    todo = todo.with_cover(read_cover(&path)?);
                }
                self.load(ListQuery::default()).await?;
                self.apply(Command::Create { todo }).await;
            }

            CliCommand::Edit {
                id,
                title,
                description,
                clear_description,
                finished,
                cover,
            } => {
                let description = match (description, clear_description) {
                    (Some(text), _) => FieldUpdate::Set(text),
                    (None, true) => FieldUpdate::Clear,
                    (None, false) => FieldUpdate::Keep,
                };
                let cover = cover.as_deref().map(read_cover).transpose()?;
                let patch = TodoPatch {
                    title,
                    description,
                    is_finished: finished,
                    cover,
                };
                self.locate(id).await?;
                self.apply(Command::Update { id, patch }).await;
            }

            CliCommand::Toggle { id } => {
                self.locate(id).await?;
                self.apply(Command::Toggle { id }).await;
            }

            CliCommand::Delete { id } => {
                self.locate(id).await?;
                self.apply(Command::Delete { id }).await;
            }

            CliCommand::Stats => {
                self.load(ListQuery::default()).await?;
                let model = self.controller.model();
                println!("{}", UiReport::render_insights(model, self.controller.clock()));
                return Ok(());
            }

            CliCommand::Shell => return self.shell().await,
        }

        self.finish()
    }

    /// Load a page and wait for it
    async fn load(&mut self, query: ListQuery) -> Result<()> {
        self.apply(Command::Navigate { query }).await;
        let errors = &self.controller.model().errors;
        if !errors.is_empty() {
            bail!("{}", errors.join("; "));
        }
        Ok(())
    }

    /// Walk the pages until the todo is in view, so its counters reconcile
    async fn locate(&mut self, id: TodoId) -> Result<()> {
        self.load(ListQuery::default()).await?;
        while self.controller.model().projection.find(id).is_none() {
            let Some(next) = self.controller.model().projection.next_page() else {
                warn!("#{id} is not on any page; counters will not be adjusted");
                return Ok(());
            };
            self.load(next).await?;
        }
        Ok(())
    }

    async fn apply(&mut self, command: Command) {
        self.controller.handle_command(command);
        self.controller.settle().await;
    }

    /// Print the screen; fail if any request did
    fn finish(self) -> Result<()> {
        let model = self.controller.model();
        print!("{}", UiReport::render(model, self.controller.clock()));
        if !model.errors.is_empty() {
            bail!("{} request(s) failed", model.errors.len());
        }
        Ok(())
    }

    /// Full-screen interactive mode
    async fn shell(mut self) -> Result<()> {
        info!("Starting interactive shell");

        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.event_loop(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        if let Err(err) = &res {
            error!("Shell error: {:#}", err);
        }
        info!("Shell closed");
        res
    }

    async fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.controller.handle_command(Command::Navigate {
            query: ListQuery::default(),
        });
        let mut dirty = true;

        while !self.controller.model().should_quit {
            if dirty {
                let controller = &self.controller;
                terminal.draw(|frame| UiView::render(controller.model(), controller.clock(), frame))?;
                dirty = false;
            }

            if event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
                dirty = true;
                continue;
            }

            tokio::select! {
                _ = self.controller.next_change(), if !self.controller.is_idle() => {
                    dirty = true;
                }
                _ = tokio::time::sleep(TICK) => {}
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, code: event::KeyCode, modifiers: event::KeyModifiers) {
        let clock = self.controller.shared_clock();
        match UiUpdate::handle_key(self.controller.model_mut(), code, modifiers, clock.as_ref()) {
            Ok(UiMessage::Command(command)) => self.controller.handle_command(command),
            Ok(UiMessage::None) => {}
            Err(err) => self.controller.model_mut().add_error(format!("{err:#}")),
        }
    }
}

fn read_cover(path: &Path) -> Result<CoverUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read cover image: {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(CoverUpload::new(file_name, bytes))
}
