//! Application core — event loop, router, action dispatch.
//!
//! The router is where the core earns its keep: every navigation runs
//! through [`SessionGate::decide_path`], redirects are followed to a fixed
//! point, and a `Block` decision shows the neutral loading view until the
//! pending identity check settles (the session bridge re-triggers routing
//! on every snapshot change).

use std::sync::{Arc, RwLock};
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use storegate_api::StorefrontClient;
use storegate_core::{
    AuthFailureKind, Credentials, Decision, DependentState, RegisterForm as RegisterRequest,
    SessionEvent, SessionGate, SessionSnapshot,
};

use crate::action::Action;
use crate::event::{Event, EventReader};
use crate::screens::forms::{LoginForm, RegisterForm};
use crate::screens::{Screen, ViewContext, render_body};
use crate::session_bridge::run_session_bridge;
use crate::tui::Tui;

/// How many redirect hops the router will follow before giving up.
/// The decision table has no cycles; this is a backstop.
const REDIRECT_LIMIT: usize = 8;

/// Ticks a status-line message stays visible (at 4 Hz).
const STATUS_TICKS: u8 = 20;

// ── Cart stub ───────────────────────────────────────────────────────

/// Minimal session-dependent client state. The product's real cart slice
/// is out of scope; this exists so logout's dependent-state clearing has
/// something real to clear.
#[derive(Default)]
struct CartState {
    items: RwLock<Vec<String>>,
}

impl CartState {
    fn add_sample(&self) {
        let mut items = self.items.write().expect("cart lock poisoned");
        let n = items.len() + 1;
        items.push(format!("Sample item #{n}"));
    }

    fn snapshot(&self) -> Vec<String> {
        self.items.read().expect("cart lock poisoned").clone()
    }
}

impl DependentState for CartState {
    fn clear(&self) {
        self.items.write().expect("cart lock poisoned").clear();
    }
}

// ── App ─────────────────────────────────────────────────────────────

/// Top-level application state and event loop.
pub struct App {
    gate: SessionGate<StorefrontClient>,
    /// Current logical location (path, possibly with a query string).
    location: String,
    /// Latest session snapshot, for chrome rendering.
    snapshot: SessionSnapshot,
    cart: Arc<CartState>,
    login_form: LoginForm,
    register_form: RegisterForm,
    status: Option<String>,
    status_ttl: u8,
    /// A gate call is in flight; forms are read-only meanwhile.
    busy: bool,
    running: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    cancel: CancellationToken,
}

impl App {
    pub fn new(gate: SessionGate<StorefrontClient>, start_path: String) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let cart = Arc::new(CartState::default());
        gate.register_dependent(Arc::clone(&cart) as Arc<dyn DependentState>);

        let snapshot = gate.snapshot();
        Self {
            gate,
            location: start_path,
            snapshot,
            cart,
            login_form: LoginForm::default(),
            register_form: RegisterForm::default(),
            status: None,
            status_ttl: 0,
            busy: false,
            running: true,
            action_tx,
            action_rx,
            cancel: CancellationToken::new(),
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let mut events = EventReader::new(Duration::from_millis(250));

        tokio::spawn(run_session_bridge(
            self.gate.clone(),
            self.action_tx.clone(),
            self.cancel.clone(),
        ));

        // Route the start path under the initial (pending) snapshot.
        self.navigate(self.location.clone());

        while self.running {
            tui.draw(|f| self.render(f))?;

            tokio::select! {
                Some(event) = events.next() => self.handle_event(event),
                Some(action) = self.action_rx.recv() => self.handle_action(action),
                else => break,
            }
        }

        self.cancel.cancel();
        tui.exit()?;
        Ok(())
    }

    // ── Routing ──────────────────────────────────────────────────────

    /// Move to `path`, following guard redirects to a fixed point.
    ///
    /// A `Block` decision parks the location on the requested path -- the
    /// loading view shows until a snapshot change re-triggers routing.
    fn navigate(&mut self, path: String) {
        let mut path = path;
        for _ in 0..REDIRECT_LIMIT {
            // Admin-landing convenience: admins don't browse the customer
            // landing page (a shell UX rule, not an authorization rule).
            let paths = self.gate.routes().paths();
            if path == paths.customer_landing && self.gate.snapshot().is_admin() {
                path = paths.admin_landing.clone();
            }

            match self.gate.decide_path(&path) {
                Decision::Render | Decision::Block => {
                    if self.location != path {
                        debug!(to = %path, "navigated");
                    }
                    self.location = path;
                    return;
                }
                Decision::Redirect(target) => {
                    let next = self.gate.routes().resolve(&target);
                    debug!(from = %path, to = %next, "guard redirect");
                    path = next;
                }
            }
        }
        warn!(path = %path, "redirect limit reached; staying put");
    }

    /// The screen currently on display, derived from the location and the
    /// live guard decision -- protected content can never outrun the guard.
    fn current_screen(&self) -> Screen {
        match self.gate.decide_path(&self.location) {
            Decision::Render => Screen::for_path(&self.location),
            // Redirect only shows up transiently between a snapshot change
            // and the bridge action that re-routes; show neutral loading.
            Decision::Block | Decision::Redirect(_) => Screen::Loading,
        }
    }

    // ── Event handling ───────────────────────────────────────────────

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Resize(_, _) => {}
            Event::Tick => {
                if self.status_ttl > 0 {
                    self.status_ttl -= 1;
                    if self.status_ttl == 0 {
                        self.status = None;
                    }
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.dispatch(Action::Quit);
            return;
        }

        // Forms own the keyboard on their screens.
        match self.current_screen() {
            Screen::Login => {
                if key.code == KeyCode::Esc {
                    let home = self.gate.routes().paths().customer_landing.clone();
                    self.dispatch(Action::Navigate(home));
                } else if !self.busy {
                    if let Some(submit) = self.login_form.handle_key(key) {
                        self.submit_login(submit.email, submit.password);
                    }
                }
                return;
            }
            Screen::Register => {
                if key.code == KeyCode::Esc {
                    let home = self.gate.routes().paths().customer_landing.clone();
                    self.dispatch(Action::Navigate(home));
                } else if !self.busy {
                    if let Some(submit) = self.register_form.handle_key(key) {
                        self.submit_register(submit.user_name, submit.email, submit.password);
                    }
                }
                return;
            }
            _ => {}
        }

        match key.code {
            KeyCode::Char('q') => self.dispatch(Action::Quit),
            KeyCode::Char('1') => self.dispatch(Action::Navigate("/shop/home".into())),
            KeyCode::Char('2') => self.dispatch(Action::Navigate("/shop/listing".into())),
            KeyCode::Char('3') => self.dispatch(Action::Navigate("/shop/search".into())),
            KeyCode::Char('4') => self.dispatch(Action::Navigate("/shop/checkout".into())),
            KeyCode::Char('5') => self.dispatch(Action::Navigate("/shop/account".into())),
            KeyCode::Char('6') => self.dispatch(Action::Navigate("/admin/dashboard".into())),
            KeyCode::Char('7') => self.dispatch(Action::Navigate("/admin/orders".into())),
            KeyCode::Char('l') => {
                let login = self.gate.routes().paths().login.clone();
                self.dispatch(Action::Navigate(login));
            }
            KeyCode::Char('r') => {
                let register = self.gate.routes().paths().register.clone();
                self.dispatch(Action::Navigate(register));
            }
            KeyCode::Char('o') => self.submit_logout(),
            KeyCode::Char('a') if self.current_screen() == Screen::Checkout => {
                self.cart.add_sample();
            }
            _ => {}
        }
    }

    /// Queue an action for the main loop.
    fn dispatch(&self, action: Action) {
        let _ = self.action_tx.send(action);
    }

    // ── Action handling ──────────────────────────────────────────────

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Navigate(path) => self.navigate(path),

            Action::SessionChanged(snapshot) => {
                self.snapshot = snapshot;
                // Re-route the current location under the new facts.
                self.navigate(self.location.clone());
            }

            Action::Session(event) => self.handle_session_event(event),

            Action::LoginFinished(result) => {
                self.busy = false;
                if let Err(message) = result {
                    self.notify(message);
                }
                // Success navigation rides on the LoginSucceeded event.
            }

            Action::RegisterFinished(result) => {
                self.busy = false;
                match result {
                    Ok(message) => {
                        self.notify(message);
                        let login = self.gate.routes().paths().login.clone();
                        self.navigate(login);
                    }
                    Err(message) => self.notify(message),
                }
            }

            Action::Notify(message) => self.notify(message),

            Action::Quit => self.running = false,
        }
    }

    fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::LoginSucceeded(user) => {
                info!(user = %user.user_name, "login succeeded");
                self.notify(format!("Welcome back, {}!", user.user_name));
                // Return where the user was headed before the guard sent
                // them to the login form; otherwise let the guard's
                // auth-entry bounce pick the landing page.
                let target = query_param(&self.location, "from")
                    .unwrap_or_else(|| self.location.clone());
                self.navigate(target);
            }
            SessionEvent::LoggedOut => {
                self.notify("Logged out".to_owned());
                let home = self.gate.routes().paths().customer_landing.clone();
                self.navigate(home);
            }
            SessionEvent::AuthorizationFailure { kind } => match kind {
                AuthFailureKind::Unauthenticated => {
                    self.notify("Your session expired -- please sign in again".to_owned());
                    let login = self.gate.routes().paths().login.clone();
                    self.navigate(login);
                }
                AuthFailureKind::Forbidden => {
                    self.notify("You are not allowed to do that".to_owned());
                }
            },
        }
    }

    // ── Gate calls (spawned; results come back as actions) ───────────

    fn submit_login(&mut self, email: String, password: String) {
        self.busy = true;
        let gate = self.gate.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = gate
                .login(&Credentials::new(email, password))
                .await
                .map(|_| ())
                .map_err(|e| e.to_string());
            let _ = tx.send(Action::LoginFinished(result));
        });
    }

    fn submit_register(&mut self, user_name: String, email: String, password: String) {
        self.busy = true;
        let gate = self.gate.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = gate
                .register(&RegisterRequest::new(user_name, email, password))
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(Action::RegisterFinished(result));
        });
    }

    fn submit_logout(&mut self) {
        let gate = self.gate.clone();
        tokio::spawn(async move {
            // LoggedOut event drives navigation and the status line.
            gate.logout().await;
        });
    }

    fn notify(&mut self, message: String) {
        self.status = Some(message);
        self.status_ttl = STATUS_TICKS;
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&mut self, frame: &mut Frame) {
        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

        self.render_header(frame, rows[0]);

        let screen = self.current_screen();
        match screen {
            Screen::Login => self.login_form.render(frame, rows[1], self.busy),
            Screen::Register => self.register_form.render(frame, rows[1], self.busy),
            other => {
                let cart = self.cart.snapshot();
                let ctx = ViewContext {
                    snapshot: &self.snapshot,
                    cart: &cart,
                };
                render_body(frame, rows[1], other, &ctx);
            }
        }

        self.render_footer(frame, rows[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let identity = if self.snapshot.auth.is_pending() {
            Span::styled("checking…", Style::default().add_modifier(Modifier::DIM))
        } else if let Some(user) = self.snapshot.user() {
            let label = if self.snapshot.is_admin() {
                format!("{} [admin]", user.user_name)
            } else {
                user.user_name.clone()
            };
            Span::styled(label, Style::default().fg(Color::Green))
        } else {
            Span::styled("anonymous", Style::default().add_modifier(Modifier::DIM))
        };

        let line = Line::from(vec![
            Span::styled(" storegate ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("│ "),
            Span::raw(self.location.clone()),
            Span::raw(" │ "),
            identity,
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_footer(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let line = match &self.status {
            Some(status) => Line::from(Span::styled(
                format!(" {status}"),
                Style::default().fg(Color::Yellow),
            )),
            None => Line::from(Span::styled(
                " 1-5 shop · 6-7 admin · l sign in · r register · o sign out · q quit",
                Style::default().add_modifier(Modifier::DIM),
            )),
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Extract a query parameter from a location string.
fn query_param(location: &str, key: &str) -> Option<String> {
    let (_, query) = location.split_once('?')?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
