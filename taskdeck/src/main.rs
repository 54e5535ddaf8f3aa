//! `Taskdeck`: terminal client for a remote to-do API.
//!
//! Signs in against the API (or restores a saved session), then shows the
//! user's task list. Configuration via CLI flags, environment variables,
//! or config file (`~/.config/taskdeck/config.toml`).
//!
//! ```bash
//! # Against a local API
//! cargo run --bin taskdeck -- --api-url http://localhost:8001
//!
//! # Offline demo with seeded tasks
//! cargo run --bin taskdeck -- --offline
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;

use taskdeck::api::TaskApi;
use taskdeck::api::http::HttpTaskApi;
use taskdeck::api::memory::InMemoryTaskApi;
use taskdeck::app::{App, AppAction};
use taskdeck::auth::{
    AuthApi, AuthError, AuthProvider, CredentialStore, HttpAuthApi, OfflineAuthApi, SessionHandle,
};
use taskdeck::config::{CliArgs, ClientConfig};
use taskdeck::tasks::{Notification, TaskListManager};
use taskdeck::ui;
use taskdeck::worker::{self, TaskCommand, WorkerEvent};
use taskdeck_proto::auth::{User, UserId};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

const DEMO_TASKS: &[&str] = &[
    "Try the keyboard shortcuts (press ?)",
    "Select a few tasks with Space",
    "Mark them complete with c",
    "Reorder with J and K",
];

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > env > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config: {e}");
            ClientConfig {
                offline: cli.offline,
                ..ClientConfig::default()
            }
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(api_url = %config.api_url, offline = config.offline, "taskdeck starting");

    let session = SessionHandle::new();

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = if config.offline {
        run_offline(&mut terminal, &config, session).await
    } else {
        run_online(&mut terminal, &config, session).await
    };

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("taskdeck exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the terminal).
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskdeck.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

async fn run_online(
    terminal: &mut Term,
    config: &ClientConfig,
    session: SessionHandle,
) -> io::Result<()> {
    let settings = config.http_settings();
    let auth_api = HttpAuthApi::new(config.api_url.clone(), settings).map_err(io::Error::other)?;
    let task_api = HttpTaskApi::new(config.api_url.clone(), settings, session.clone())
        .map_err(io::Error::other)?;
    let store = CredentialStore::new(config.credentials_path.clone());
    let auth = AuthProvider::new(auth_api, store, session);
    run_app(terminal, config, auth, task_api).await
}

async fn run_offline(
    terminal: &mut Term,
    config: &ClientConfig,
    session: SessionHandle,
) -> io::Result<()> {
    let demo = User {
        id: UserId::new("demo"),
        email: "demo@localhost".to_string(),
        name: "Demo".to_string(),
    };
    let task_api = InMemoryTaskApi::new();
    task_api.seed(&demo.id, DEMO_TASKS);

    let store = CredentialStore::new(std::env::temp_dir().join("taskdeck-offline-session.json"));
    let auth = AuthProvider::new(OfflineAuthApi::new(demo.clone()), store, session);
    auth.session().establish(demo, "offline".to_string());
    run_app(terminal, config, auth, task_api).await
}

/// Channels and token of the task worker for the signed-in user.
struct ActiveSession {
    cmd_tx: mpsc::Sender<TaskCommand>,
    evt_rx: mpsc::Receiver<WorkerEvent>,
    cancel: CancellationToken,
}

impl ActiveSession {
    fn start<T: TaskApi + Clone + 'static>(
        api: &T,
        session: &SessionHandle,
        config: &ClientConfig,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (manager, notifications) = TaskListManager::new(
            api.clone(),
            session.clone(),
            cancel.clone(),
            config.notification_buffer,
        );
        let (cmd_tx, evt_rx) = worker::spawn_worker(manager, notifications, config.channel_capacity);
        if cmd_tx.try_send(TaskCommand::Load).is_err() {
            tracing::warn!("could not queue initial load");
        }
        Self {
            cmd_tx,
            evt_rx,
            cancel,
        }
    }

    fn stop(&self) {
        self.cancel.cancel();
        let _ = self.cmd_tx.try_send(TaskCommand::Shutdown);
    }
}

/// Main application loop.
async fn run_app<A, T>(
    terminal: &mut Term,
    config: &ClientConfig,
    auth: AuthProvider<A>,
    task_api: T,
) -> io::Result<()>
where
    A: AuthApi + 'static,
    T: TaskApi + Clone + 'static,
{
    let auth = Arc::new(auth);
    let session = auth.session().clone();
    let mut app = App::new(config.toast_duration, config.max_toasts);
    let (auth_tx, mut auth_rx) = mpsc::channel::<Result<User, AuthError>>(4);

    let mut active = None;
    let restored = session.current_user().or_else(|| auth.hydrate());
    if let Some(user) = restored {
        app.enter_dashboard(user);
        active = Some(ActiveSession::start(&task_api, &session, config));
    }

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Apply finished sign-in / sign-up attempts.
        while let Ok(outcome) = auth_rx.try_recv() {
            match outcome {
                Ok(user) => {
                    app.enter_dashboard(user);
                    active = Some(ActiveSession::start(&task_api, &session, config));
                }
                Err(e) => app.auth_failed(e.user_message()),
            }
        }

        // Step 3: Drain worker events (non-blocking).
        if let Some(current) = active.as_mut() {
            while let Ok(event) = current.evt_rx.try_recv() {
                app.apply_event(event);
            }
        }

        // Step 4: Expire toasts.
        app.tick(Instant::now());

        // Step 5: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match app.handle_key_event(key) {
                Some(AppAction::Task(cmd)) => {
                    if let Some(current) = active.as_ref() {
                        match current.cmd_tx.try_send(cmd) {
                            Ok(()) => {}
                            Err(mpsc::error::TrySendError::Full(_)) => {
                                app.push_toast(Notification::error("Busy, try again"));
                            }
                            Err(mpsc::error::TrySendError::Closed(_)) => {
                                app.push_toast(Notification::error("Task worker stopped"));
                            }
                        }
                    }
                }
                Some(AppAction::SignIn { email, password }) => {
                    let auth = Arc::clone(&auth);
                    let tx = auth_tx.clone();
                    tokio::spawn(async move {
                        if tx.send(auth.sign_in(&email, password).await).await.is_err() {
                            tracing::debug!("auth result dropped: app loop gone");
                        }
                    });
                }
                Some(AppAction::SignUp {
                    name,
                    email,
                    password,
                }) => {
                    let auth = Arc::clone(&auth);
                    let tx = auth_tx.clone();
                    tokio::spawn(async move {
                        if tx.send(auth.sign_up(&name, &email, password).await).await.is_err() {
                            tracing::debug!("auth result dropped: app loop gone");
                        }
                    });
                }
                Some(AppAction::SignOut) => {
                    if let Some(current) = active.take() {
                        current.stop();
                    }
                    auth.sign_out();
                    app.enter_auth();
                }
                None => {}
            }
        }

        if app.should_quit {
            if let Some(current) = active.take() {
                current.stop();
            }
            return Ok(());
        }
    }
}
