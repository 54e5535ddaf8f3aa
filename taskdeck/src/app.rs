//! Application state and event handling.
//!
//! [`App`] is pure state: key presses become [`AppAction`]s for the main
//! loop to dispatch, and [`WorkerEvent`]s are folded back in with
//! [`App::apply_event`]. Nothing here touches the network or the terminal.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use zeroize::Zeroize;

use taskdeck_proto::auth::User;
use taskdeck_proto::task::{Task, TaskCreate, TaskId, TaskUpdate};

use crate::tasks::{Notification, TaskSnapshot, count_label, reconcile};
use crate::worker::{OpKind, TaskCommand, WorkerEvent};

/// Which top-level screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Sign-in / sign-up form.
    Auth,
    /// Task list.
    Dashboard,
}

/// Whether the auth form signs in or creates an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Existing account.
    SignIn,
    /// New account.
    SignUp,
}

/// Focused input on the auth form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    /// Display name (sign-up only).
    Name,
    /// Email address.
    Email,
    /// Password (masked).
    Password,
}

/// State of the auth screen.
pub struct AuthForm {
    /// Sign-in or sign-up.
    pub mode: AuthMode,
    /// Display name input.
    pub name: String,
    /// Email input.
    pub email: String,
    /// Password input; wiped when submitted or dropped.
    pub password: String,
    /// Focused input.
    pub field: AuthField,
    /// Last failure, shown under the form.
    pub error: Option<String>,
    /// True while a request is in flight.
    pub submitting: bool,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            mode: AuthMode::SignIn,
            name: String::new(),
            email: String::new(),
            password: String::new(),
            field: AuthField::Email,
            error: None,
            submitting: false,
        }
    }
}

impl std::fmt::Debug for AuthForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthForm")
            .field("mode", &self.mode)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("field", &self.field)
            .field("error", &self.error)
            .field("submitting", &self.submitting)
            .finish()
    }
}

impl Drop for AuthForm {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl AuthForm {
    fn fields(&self) -> &'static [AuthField] {
        match self.mode {
            AuthMode::SignIn => &[AuthField::Email, AuthField::Password],
            AuthMode::SignUp => &[AuthField::Name, AuthField::Email, AuthField::Password],
        }
    }

    fn next_field(&mut self) {
        let fields = self.fields();
        let at = fields.iter().position(|f| *f == self.field).unwrap_or(0);
        self.field = fields[(at + 1) % fields.len()];
    }

    fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        };
        self.field = self.fields()[0];
        self.error = None;
    }

    fn input(&mut self) -> &mut String {
        match self.field {
            AuthField::Name => &mut self.name,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    fn submit(&mut self) -> Option<AppAction> {
        if self.submitting {
            return None;
        }
        let email = self.email.trim().to_string();
        if email.is_empty() || self.password.is_empty() {
            self.error = Some("Email and password are required".to_string());
            return None;
        }
        if self.mode == AuthMode::SignUp && self.name.trim().is_empty() {
            self.error = Some("Name is required".to_string());
            return None;
        }

        self.error = None;
        self.submitting = true;
        let password = std::mem::take(&mut self.password);
        Some(match self.mode {
            AuthMode::SignIn => AppAction::SignIn { email, password },
            AuthMode::SignUp => AppAction::SignUp {
                name: self.name.trim().to_string(),
                email,
                password,
            },
        })
    }
}

/// Focused input on the task form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    /// Title input.
    Title,
    /// Description input.
    Description,
}

/// New-task or edit-task form.
#[derive(Debug, Clone)]
pub struct TaskForm {
    /// Task being edited, `None` when creating.
    pub editing: Option<TaskId>,
    /// Title input.
    pub title: String,
    /// Description input.
    pub description: String,
    /// Focused input.
    pub field: FormField,
    /// Validation or API failure, shown in the form.
    pub error: Option<String>,
    /// True while the request is in flight.
    pub submitting: bool,
}

impl TaskForm {
    fn create() -> Self {
        Self {
            editing: None,
            title: String::new(),
            description: String::new(),
            field: FormField::Title,
            error: None,
            submitting: false,
        }
    }

    fn edit(task: &Task) -> Self {
        Self {
            editing: Some(task.id),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            ..Self::create()
        }
    }

    fn input(&mut self) -> &mut String {
        match self.field {
            FormField::Title => &mut self.title,
            FormField::Description => &mut self.description,
        }
    }

    /// Builds the command for this form, or records why it can't.
    fn submit(&mut self) -> Option<TaskCommand> {
        if self.submitting {
            return None;
        }
        let title = self.title.trim().to_string();
        let description = self.description.trim().to_string();

        let (command, checked) = match self.editing {
            None => {
                let mut draft = TaskCreate::new(title);
                if !description.is_empty() {
                    draft = draft.with_description(description);
                }
                let checked = draft.validate();
                (TaskCommand::Create(draft), checked)
            }
            Some(id) => {
                let patch = TaskUpdate {
                    title: Some(title),
                    description: Some(description),
                    is_completed: None,
                };
                let checked = patch.validate();
                (TaskCommand::Update { id, patch }, checked)
            }
        };

        match checked {
            Ok(()) => {
                self.error = None;
                self.submitting = true;
                Some(command)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }
}

/// Modal drawn over the dashboard.
#[derive(Debug, Clone)]
pub enum Overlay {
    /// Create or edit form.
    Form(TaskForm),
    /// "Delete {n} selected task(s)?" prompt.
    ConfirmBulkDelete,
    /// Keyboard shortcut reference.
    Help,
}

/// A notification on screen.
#[derive(Debug, Clone)]
pub struct Toast {
    /// What happened.
    pub notification: Notification,
    /// When it was shown.
    pub shown_at: Instant,
}

/// What the main loop should do in response to a key.
#[derive(Debug)]
pub enum AppAction {
    /// Forward to the task worker.
    Task(TaskCommand),
    /// Sign in with these credentials.
    SignIn {
        /// Email.
        email: String,
        /// Password.
        password: String,
    },
    /// Create an account.
    SignUp {
        /// Display name.
        name: String,
        /// Email.
        email: String,
        /// Password.
        password: String,
    },
    /// End the session.
    SignOut,
}

/// Main application state.
#[derive(Debug)]
pub struct App {
    /// Current screen.
    pub screen: Screen,
    /// Auth screen state.
    pub auth: AuthForm,
    /// Latest task state from the worker.
    pub snapshot: TaskSnapshot,
    /// Index of the highlighted task.
    pub cursor: usize,
    /// Open modal, if any.
    pub overlay: Option<Overlay>,
    /// Visible notifications, oldest first.
    pub toasts: VecDeque<Toast>,
    /// Signed-in user.
    pub user: Option<User>,
    /// Whether the app should quit.
    pub should_quit: bool,
    toast_duration: Duration,
    max_toasts: usize,
}

impl App {
    /// Creates an app on the auth screen.
    #[must_use]
    pub fn new(toast_duration: Duration, max_toasts: usize) -> Self {
        Self {
            screen: Screen::Auth,
            auth: AuthForm::default(),
            snapshot: TaskSnapshot::default(),
            cursor: 0,
            overlay: None,
            toasts: VecDeque::new(),
            user: None,
            should_quit: false,
            toast_duration,
            max_toasts: max_toasts.max(1),
        }
    }

    /// Switches to the dashboard for `user`.
    pub fn enter_dashboard(&mut self, user: User) {
        self.user = Some(user);
        self.screen = Screen::Dashboard;
        self.auth = AuthForm::default();
        self.snapshot = TaskSnapshot::default();
        self.cursor = 0;
        self.overlay = None;
    }

    /// Returns to the auth screen, forgetting the task state.
    pub fn enter_auth(&mut self) {
        self.user = None;
        self.screen = Screen::Auth;
        self.snapshot = TaskSnapshot::default();
        self.cursor = 0;
        self.overlay = None;
    }

    /// Records a failed sign-in or sign-up.
    pub fn auth_failed(&mut self, message: impl Into<String>) {
        self.auth.submitting = false;
        self.auth.error = Some(message.into());
    }

    /// The highlighted task.
    #[must_use]
    pub fn current_task(&self) -> Option<&Task> {
        self.snapshot.tasks.get(self.cursor)
    }

    /// Shows a notification, evicting the oldest beyond the limit.
    pub fn push_toast(&mut self, notification: Notification) {
        self.toasts.push_back(Toast {
            notification,
            shown_at: Instant::now(),
        });
        while self.toasts.len() > self.max_toasts {
            self.toasts.pop_front();
        }
    }

    /// Drops toasts older than the configured lifetime.
    pub fn tick(&mut self, now: Instant) {
        let ttl = self.toast_duration;
        self.toasts
            .retain(|t| now.saturating_duration_since(t.shown_at) < ttl);
    }

    /// Folds a worker event into the view state.
    pub fn apply_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Loading => self.snapshot.loading = true,
            WorkerEvent::Snapshot(snapshot) => {
                self.snapshot = snapshot;
                self.cursor = self
                    .cursor
                    .min(self.snapshot.tasks.len().saturating_sub(1));
            }
            WorkerEvent::Notification(note) => self.push_toast(note),
            WorkerEvent::Completed { op } => {
                if matches!(op, OpKind::Create | OpKind::Update)
                    && matches!(self.overlay, Some(Overlay::Form(_)))
                {
                    self.overlay = None;
                }
                if op == OpKind::Create {
                    self.cursor = 0;
                }
            }
            WorkerEvent::Failed { op, error } => {
                if let Some(Overlay::Form(form)) = self.overlay.as_mut()
                    && matches!(op, OpKind::Create | OpKind::Update)
                {
                    form.submitting = false;
                    form.error = Some(error.to_string());
                } else {
                    tracing::debug!(?op, error = %error, "command failed");
                }
            }
        }
    }

    /// Handles a key, returning the action the main loop should dispatch.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }
        match self.screen {
            Screen::Auth => self.handle_auth_key(key),
            Screen::Dashboard => match self.overlay.take() {
                Some(overlay) => self.handle_overlay_key(overlay, key),
                None => self.handle_dashboard_key(key),
            },
        }
    }

    fn handle_auth_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        let form = &mut self.auth;
        match key.code {
            KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                form.toggle_mode();
            }
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::Enter => return form.submit(),
            KeyCode::Backspace => {
                form.input().pop();
            }
            KeyCode::Char(c) => form.input().push(c),
            _ => {}
        }
        None
    }

    /// Handles a key while `overlay` is open. The overlay is put back
    /// unless the key closed it.
    fn handle_overlay_key(&mut self, overlay: Overlay, key: KeyEvent) -> Option<AppAction> {
        match overlay {
            Overlay::Help => {
                if !matches!(key.code, KeyCode::Esc | KeyCode::Char('?' | 'q')) {
                    self.overlay = Some(Overlay::Help);
                }
                None
            }
            Overlay::ConfirmBulkDelete => match key.code {
                KeyCode::Char('y' | 'Y') => Some(AppAction::Task(TaskCommand::BulkDelete)),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => None,
                _ => {
                    self.overlay = Some(Overlay::ConfirmBulkDelete);
                    None
                }
            },
            Overlay::Form(mut form) => {
                let action = match key.code {
                    KeyCode::Esc => return None,
                    KeyCode::Tab | KeyCode::BackTab => {
                        form.field = match form.field {
                            FormField::Title => FormField::Description,
                            FormField::Description => FormField::Title,
                        };
                        None
                    }
                    KeyCode::Enter => form.submit().map(AppAction::Task),
                    KeyCode::Backspace => {
                        form.input().pop();
                        None
                    }
                    KeyCode::Char(c) => {
                        form.input().push(c);
                        None
                    }
                    _ => None,
                };
                self.overlay = Some(Overlay::Form(form));
                action
            }
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        let current = self.current_task().map(|t| (t.id, t.is_completed));
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < self.snapshot.tasks.len() {
                    self.cursor += 1;
                }
                None
            }
            KeyCode::Char('J') => self.move_current(1),
            KeyCode::Char('K') => self.move_current(-1),
            KeyCode::Char('n') => {
                self.overlay = Some(Overlay::Form(TaskForm::create()));
                None
            }
            KeyCode::Char('e') => {
                if let Some(task) = self.current_task() {
                    self.overlay = Some(Overlay::Form(TaskForm::edit(task)));
                }
                None
            }
            KeyCode::Enter | KeyCode::Char('x') => current.map(|(id, done)| {
                AppAction::Task(TaskCommand::ToggleComplete {
                    id,
                    completed: !done,
                })
            }),
            KeyCode::Char('d') => current.map(|(id, _)| AppAction::Task(TaskCommand::Delete(id))),
            KeyCode::Char(' ') => {
                current.map(|(id, _)| AppAction::Task(TaskCommand::ToggleSelection(id)))
            }
            KeyCode::Char('a') => {
                if self.snapshot.tasks.is_empty() {
                    return None;
                }
                let cmd = if self.snapshot.all_selected() {
                    TaskCommand::DeselectAll
                } else {
                    TaskCommand::SelectAll
                };
                Some(AppAction::Task(cmd))
            }
            KeyCode::Char('c') => self.bulk_toggle(true),
            KeyCode::Char('u') => self.bulk_toggle(false),
            KeyCode::Char('D') => {
                if self.require_selection() {
                    self.overlay = Some(Overlay::ConfirmBulkDelete);
                }
                None
            }
            KeyCode::Char('r') => Some(AppAction::Task(TaskCommand::Load)),
            KeyCode::Char('?') => {
                self.overlay = Some(Overlay::Help);
                None
            }
            KeyCode::Char('L') => Some(AppAction::SignOut),
            _ => None,
        }
    }

    fn bulk_toggle(&mut self, completed: bool) -> Option<AppAction> {
        self.require_selection()
            .then_some(AppAction::Task(TaskCommand::BulkToggleComplete { completed }))
    }

    fn require_selection(&mut self) -> bool {
        if self.snapshot.selected.is_empty() {
            self.push_toast(Notification::error("No tasks selected"));
            return false;
        }
        true
    }

    /// Moves the task under the cursor. The local list is updated right
    /// away so repeated presses keep tracking the task; the worker applies
    /// the same move to its own list and its next snapshot wins.
    fn move_current(&mut self, delta: isize) -> Option<AppAction> {
        let id = self.current_task()?.id;
        let order = reconcile::move_by(&self.snapshot.tasks, id, delta)?;
        self.cursor = order.iter().position(|t| t.id == id).unwrap_or(self.cursor);
        self.snapshot.tasks = order;
        Some(AppAction::Task(TaskCommand::Move { id, delta }))
    }

    /// Prompt text for the bulk delete confirmation.
    #[must_use]
    pub fn confirm_prompt(&self) -> String {
        format!(
            "Delete {} selected?",
            count_label(self.snapshot.selected.len())
        )
    }
}
