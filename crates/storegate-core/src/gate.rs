// ── Session gate ──
//
// Owns the SessionStore and the backend collaborator; the only writer of
// session state. Orchestrates the two identity checks in strict dependency
// order and implements the login/logout/authorization-failure transitions.

use std::sync::{Arc, RwLock};

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::backend::{AuthCheck, DependentState, IdentityBackend, LoginOutcome, RegisterOutcome};
use crate::error::{AuthFailureKind, CoreError};
use crate::guard::{Decision, decide};
use crate::model::{Credentials, RegisterForm, UserRecord};
use crate::routes::RouteTable;
use crate::store::{AdminOutcome, AuthOutcome, CheckTicket, SessionSnapshot, SessionStore};

const EVENT_CHANNEL_SIZE: usize = 16;

// ── Events ───────────────────────────────────────────────────────────

/// Session transitions broadcast to the shell.
///
/// The gate never navigates; it emits, and the shell's router decides how
/// to move. This keeps the decision logic independent of any particular
/// navigation mechanism.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    LoginSucceeded(Arc<UserRecord>),
    LoggedOut,
    /// A protected request failed authorization somewhere in the app.
    /// For `Unauthenticated` the session has already been forgotten and
    /// the router should move to the login page.
    AuthorizationFailure { kind: AuthFailureKind },
}

// ── Gate ─────────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. Exactly one gate exists per client
/// session; view code only ever receives read-only snapshots and event
/// receivers from it.
pub struct SessionGate<B> {
    inner: Arc<GateInner<B>>,
}

impl<B> Clone for SessionGate<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct GateInner<B> {
    store: SessionStore,
    backend: B,
    routes: RouteTable,
    event_tx: broadcast::Sender<SessionEvent>,
    dependents: RwLock<Vec<Arc<dyn DependentState>>>,
}

impl<B: IdentityBackend> SessionGate<B> {
    /// Create a gate over a backend and a route table. Does NOT check
    /// anything yet -- call [`bootstrap()`](Self::bootstrap) to resolve
    /// the identity facts.
    pub fn new(backend: B, routes: RouteTable) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            inner: Arc::new(GateInner {
                store: SessionStore::new(),
                backend,
                routes,
                event_tx,
                dependents: RwLock::new(Vec::new()),
            }),
        }
    }

    /// The route table this gate classifies against.
    pub fn routes(&self) -> &RouteTable {
        &self.inner.routes
    }

    /// Current session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.store.snapshot()
    }

    /// Subscribe to session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.store.subscribe()
    }

    /// Subscribe to session transition events.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Register client-local state to be cleared whenever the identity is
    /// forgotten (logout, observed session expiry).
    pub fn register_dependent(&self, dep: Arc<dyn DependentState>) {
        self.inner
            .dependents
            .write()
            .expect("dependent list lock poisoned")
            .push(dep);
    }

    /// Classify `path` and run the route guard against the current
    /// snapshot.
    pub fn decide_path(&self, path: &str) -> Decision {
        let class = self.inner.routes.classify(path);
        decide(class, path, &self.snapshot())
    }

    // ── Bootstrap ────────────────────────────────────────────────────

    /// Resolve both identity facts, in strict dependency order.
    ///
    /// 1. Authentication check. 2. Admin check, if and only if step 1
    /// resolved to a user -- an anonymous visitor cannot be an admin, so
    /// the collaborator is never asked. Runs once per application load
    /// and is safe to run again (an explicit retry after a network
    /// failure); stale results from an abandoned run are discarded by
    /// generation.
    pub async fn bootstrap(&self) -> Result<(), CoreError> {
        debug!("bootstrapping session state");
        let ticket = self.inner.store.begin_auth_check();

        match self.inner.backend.check_authentication().await {
            Ok(AuthCheck { user: Some(user) }) => {
                let applied = self
                    .inner
                    .store
                    .apply_auth_result(&ticket, AuthOutcome::Authenticated(user));
                // Only chase the admin fact for the identity we just
                // confirmed; if a newer transition superseded us, its own
                // checks are in charge.
                if applied {
                    let admin_ticket = self.inner.store.begin_admin_check();
                    self.run_admin_check(admin_ticket).await;
                }
                info!("session bootstrap complete (authenticated)");
                Ok(())
            }
            Ok(AuthCheck { user: None }) => {
                let _ = self
                    .inner
                    .store
                    .apply_auth_result(&ticket, AuthOutcome::Anonymous);
                info!("session bootstrap complete (anonymous)");
                Ok(())
            }
            Err(e) => {
                // Fail-closed: an unanswerable check renders as
                // unauthenticated. No automatic retry.
                warn!(error = %e, "authentication check failed");
                let _ = self
                    .inner
                    .store
                    .apply_auth_result(&ticket, AuthOutcome::Failed);
                Err(e.into())
            }
        }
    }

    /// Run the admin privilege check and settle the admin fact.
    async fn run_admin_check(&self, ticket: CheckTicket) {
        let outcome = match self.inner.backend.check_admin_privilege().await {
            Ok(()) => AdminOutcome::Granted,
            // 403 is the expected "not an admin" answer, not a fault.
            Err(e) if e.is_forbidden() => AdminOutcome::Denied,
            // A 401 here means the session died between the two checks;
            // the admin fact settles to "no" and the transport layer's
            // failure signal handles the rest.
            Err(e) if e.is_unauthenticated() => AdminOutcome::Denied,
            Err(e) => {
                warn!(error = %e, "admin check failed");
                AdminOutcome::Failed
            }
        };
        let _ = self.inner.store.apply_admin_result(&ticket, outcome);
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Authenticate with the backend and install the new session.
    ///
    /// On success the admin check runs immediately (no reload, no full
    /// bootstrap) under the new session generation, which also cancels
    /// any in-flight checks for the previous identity.
    pub async fn login(&self, credentials: &Credentials) -> Result<Arc<UserRecord>, CoreError> {
        let outcome = match self.inner.backend.login(credentials).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.confirm_anonymous();
                return Err(e.into());
            }
        };

        match outcome {
            LoginOutcome::Accepted(user) => {
                let record = Arc::new(user.clone());
                let admin_ticket = self.inner.store.install_session(user);
                info!(user = %record.user_name, "login succeeded");
                self.run_admin_check(admin_ticket).await;
                let _ = self
                    .inner
                    .event_tx
                    .send(SessionEvent::LoginSucceeded(Arc::clone(&record)));
                Ok(record)
            }
            LoginOutcome::Rejected { message } => {
                debug!("login rejected");
                self.confirm_anonymous();
                Err(CoreError::LoginRejected { message })
            }
        }
    }

    /// Create an account. Registration never authenticates -- the user
    /// logs in afterwards.
    pub async fn register(&self, form: &RegisterForm) -> Result<String, CoreError> {
        match self.inner.backend.register(form).await? {
            RegisterOutcome::Accepted { message } => {
                self.confirm_anonymous();
                Ok(message)
            }
            RegisterOutcome::Rejected { message } => {
                Err(CoreError::RegistrationRejected { message })
            }
        }
    }

    /// End the session. Fail-open on the client: the local identity is
    /// forgotten even if the server call fails -- and never re-checked
    /// against the server, which could resurrect a session the user asked
    /// to leave.
    pub async fn logout(&self) {
        if let Err(e) = self.inner.backend.logout().await {
            warn!(error = %e, "server logout failed (non-fatal)");
        }
        self.forget_session();
        let _ = self.inner.event_tx.send(SessionEvent::LoggedOut);
        info!("logged out");
    }

    /// Cross-cutting signal from the transport layer: a protected request
    /// failed authorization.
    ///
    /// `Unauthenticated` is treated as a logout (the server no longer
    /// recognizes the session) -- unless the user is already inside the
    /// auth entry area or on the unauthorized page, where a redirect
    /// would loop. `Forbidden` changes no session state; it is forwarded
    /// for the requesting view to surface.
    pub fn observe_authorization_failure(&self, kind: AuthFailureKind, current_path: &str) {
        match kind {
            AuthFailureKind::Unauthenticated => {
                if !self.inner.routes.is_loop_safe(current_path) {
                    debug!(path = current_path, "ignoring 401 signal on auth route");
                    return;
                }
                warn!(path = current_path, "session expired -- forgetting identity");
                self.forget_session();
                let _ = self
                    .inner
                    .event_tx
                    .send(SessionEvent::AuthorizationFailure { kind });
            }
            AuthFailureKind::Forbidden => {
                let _ = self
                    .inner
                    .event_tx
                    .send(SessionEvent::AuthorizationFailure { kind });
            }
        }
    }

    // ── Internal transitions ─────────────────────────────────────────

    /// Forget the local identity: reset (cancelling in-flight checks),
    /// settle as confirmed-anonymous, and clear dependent client state.
    fn forget_session(&self) {
        self.inner.store.reset();
        self.confirm_anonymous();

        let dependents = self
            .inner
            .dependents
            .read()
            .expect("dependent list lock poisoned");
        for dep in dependents.iter() {
            dep.clear();
        }
    }

    /// Settle the auth fact as confirmed-anonymous without a server
    /// round-trip (the answer is locally known).
    fn confirm_anonymous(&self) {
        let ticket = self.inner.store.begin_auth_check();
        let _ = self
            .inner
            .store
            .apply_auth_result(&ticket, AuthOutcome::Anonymous);
    }
}
