// ── Reactive session store ──
//
// Single-writer storage for the two identity facts. Mutations are
// broadcast to subscribers via a `watch` channel; readers always observe
// a complete, consistent snapshot -- auth, admin, user, and generation
// change together, never partially.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::fact::Fact;
use crate::model::UserRecord;

// ── Check outcomes ──────────────────────────────────────────────────

/// Outcome of an authentication check, as applied to the store.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// The backend confirmed a live session for this user.
    Authenticated(UserRecord),
    /// The backend confirmed there is no session.
    Anonymous,
    /// The check could not complete (network failure, 5xx). Fail-closed:
    /// treated like `Anonymous` by every consumer.
    Failed,
}

/// Outcome of an admin privilege check, as applied to the store.
#[derive(Debug, Clone, Copy)]
pub enum AdminOutcome {
    /// The access check passed.
    Granted,
    /// The access check answered 403. An expected outcome, not a fault.
    Denied,
    /// The check could not complete. Recorded as `Resolved(false)` --
    /// a failed admin check is never left pending and never grants.
    Failed,
}

// ── Snapshot ────────────────────────────────────────────────────────

/// Immutable view of the session state at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// `Resolved(None)` is confirmed-anonymous; `Resolved(Some(user))` is
    /// confirmed-authenticated; `Failed` is treated as anonymous.
    pub auth: Fact<Option<Arc<UserRecord>>>,

    /// Only meaningful while `auth` is `Resolved(Some(_))`; forced to
    /// `Resolved(false)` whenever authentication is lost.
    pub admin: Fact<bool>,

    /// Denormalized convenience copy of the authenticated user. Agrees
    /// with `auth` whenever `auth` is settled; while a re-check is
    /// pending it retains the last settled identity (so chrome like a
    /// header doesn't flicker during a background re-check).
    pub user: Option<Arc<UserRecord>>,

    /// Check-invocation counter. Bumped by every `begin_*`, by
    /// `install_session`, and by a non-trivial `reset`.
    pub generation: u64,
}

impl SessionSnapshot {
    fn pristine() -> Self {
        Self {
            auth: Fact::Pending,
            admin: Fact::Pending,
            user: None,
            generation: 0,
        }
    }

    fn is_pristine(&self) -> bool {
        self.auth.is_pending() && self.admin.is_pending() && self.user.is_none()
    }

    /// Confirmed-authenticated.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, Fact::Resolved(Some(_)))
    }

    /// Settled on "not authenticated": confirmed-anonymous, or a failed
    /// check treated fail-closed.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self.auth, Fact::Resolved(None) | Fact::Failed)
    }

    /// The only sanctioned admin read: composes both facts, so admin
    /// privilege can never be observed without an authenticated identity.
    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && matches!(self.admin, Fact::Resolved(true))
    }

    /// The authenticated user, if any.
    pub fn user(&self) -> Option<&Arc<UserRecord>> {
        self.user.as_ref()
    }
}

// ── Check ticket ────────────────────────────────────────────────────

/// Proof that a check was begun against a particular store generation.
///
/// `apply_*` validates the ticket and silently drops results whose
/// generation is no longer current -- the discard rule that replaces
/// explicit cancellation of in-flight checks.
#[derive(Debug)]
#[must_use = "a ticket is the only way to apply the check's result"]
pub struct CheckTicket {
    generation: u64,
}

impl CheckTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ── Store ───────────────────────────────────────────────────────────

/// Central reactive store for the session's identity facts.
///
/// Exactly one instance exists per client session, owned by
/// [`SessionGate`](crate::gate::SessionGate) -- the single writer. View
/// code reads via [`snapshot`](Self::snapshot) or subscribes via
/// [`subscribe`](Self::subscribe).
pub struct SessionStore {
    state: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionSnapshot::pristine());
        Self { state }
    }

    /// Current state (cheap clone of the snapshot).
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    // ── Check lifecycle ──────────────────────────────────────────────

    /// Start an authentication check: bump the generation and put the
    /// auth fact back into `Pending`. Any result still in flight for an
    /// older generation will be dropped on arrival.
    pub fn begin_auth_check(&self) -> CheckTicket {
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            s.auth = Fact::Pending;
            generation = s.generation;
        });
        CheckTicket { generation }
    }

    /// Apply an authentication outcome. Returns `false` if the ticket is
    /// stale and the result was discarded.
    ///
    /// `Anonymous` and `Failed` cascade: the admin fact is forced to
    /// `Resolved(false)` and the user record is cleared. The cascade is
    /// what prevents stale admin privilege from surviving a logout or a
    /// session expiry.
    pub fn apply_auth_result(&self, ticket: &CheckTicket, outcome: AuthOutcome) -> bool {
        let mut applied = false;
        self.state.send_modify(|s| {
            if s.generation != ticket.generation {
                return;
            }
            applied = true;
            match outcome {
                AuthOutcome::Authenticated(user) => {
                    let user = Arc::new(user);
                    s.auth = Fact::Resolved(Some(Arc::clone(&user)));
                    s.user = Some(user);
                }
                AuthOutcome::Anonymous => {
                    s.auth = Fact::Resolved(None);
                    s.user = None;
                    s.admin = Fact::Resolved(false);
                }
                AuthOutcome::Failed => {
                    s.auth = Fact::Failed;
                    s.user = None;
                    s.admin = Fact::Resolved(false);
                }
            }
        });
        if !applied {
            debug!(
                ticket = ticket.generation,
                current = self.state.borrow().generation,
                "discarding stale auth result"
            );
        }
        applied
    }

    /// Start an admin privilege check. Only issued after the auth fact
    /// has resolved to a user for the current session -- the gate owns
    /// that ordering.
    pub fn begin_admin_check(&self) -> CheckTicket {
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            s.admin = Fact::Pending;
            generation = s.generation;
        });
        CheckTicket { generation }
    }

    /// Apply an admin outcome. Returns `false` if the ticket is stale and
    /// the result was discarded.
    pub fn apply_admin_result(&self, ticket: &CheckTicket, outcome: AdminOutcome) -> bool {
        let mut applied = false;
        self.state.send_modify(|s| {
            if s.generation != ticket.generation {
                return;
            }
            applied = true;
            s.admin = match outcome {
                // A grant only sticks under a settled authenticated
                // identity (invariant: never Resolved(true) otherwise).
                AdminOutcome::Granted => {
                    Fact::Resolved(matches!(s.auth, Fact::Resolved(Some(_))))
                }
                AdminOutcome::Denied | AdminOutcome::Failed => Fact::Resolved(false),
            };
        });
        if !applied {
            debug!(
                ticket = ticket.generation,
                current = self.state.borrow().generation,
                "discarding stale admin result"
            );
        }
        applied
    }

    /// The login transition: install the freshly authenticated user as a
    /// new session generation, cancelling every in-flight check from the
    /// prior identity, and leave the admin fact `Pending` for the
    /// follow-up check whose ticket is returned.
    pub fn install_session(&self, user: UserRecord) -> CheckTicket {
        let mut generation = 0;
        let user = Arc::new(user);
        self.state.send_modify(|s| {
            s.generation += 1;
            s.auth = Fact::Resolved(Some(Arc::clone(&user)));
            s.user = Some(Arc::clone(&user));
            s.admin = Fact::Pending;
            generation = s.generation;
        });
        debug!(user = %user.user_name, "session installed");
        CheckTicket { generation }
    }

    /// Return both facts to `Pending` and clear the user record.
    ///
    /// Bumps the generation so in-flight checks from the prior identity
    /// are discarded on arrival. Idempotent: resetting an already-pristine
    /// store changes nothing (no bump, no notification).
    pub fn reset(&self) {
        self.state.send_if_modified(|s| {
            if s.is_pristine() {
                return false;
            }
            s.generation += 1;
            s.auth = Fact::Pending;
            s.admin = Fact::Pending;
            s.user = None;
            true
        });
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn user(name: &str) -> UserRecord {
        UserRecord {
            id: Some(format!("id-{name}")),
            user_name: name.to_owned(),
            email: format!("{name}@example.com"),
            role: None,
        }
    }

    #[test]
    fn fresh_store_is_pending_on_both_facts() {
        let store = SessionStore::new();
        let snap = store.snapshot();
        assert!(snap.auth.is_pending());
        assert!(snap.admin.is_pending());
        assert!(snap.user.is_none());
        assert!(!snap.is_authenticated());
        assert!(!snap.is_admin());
    }

    #[test]
    fn authenticated_result_sets_user() {
        let store = SessionStore::new();
        let ticket = store.begin_auth_check();
        assert!(store.apply_auth_result(&ticket, AuthOutcome::Authenticated(user("maria"))));

        let snap = store.snapshot();
        assert!(snap.is_authenticated());
        assert_eq!(snap.user().unwrap().user_name, "maria");
        // Admin is still unknown until its own check settles.
        assert!(snap.admin.is_pending());
        assert!(!snap.is_admin());
    }

    #[test]
    fn anonymous_result_cascades_admin_to_false() {
        let store = SessionStore::new();

        // Establish an admin session first.
        let t = store.install_session(user("root"));
        assert!(store.apply_admin_result(&t, AdminOutcome::Granted));
        assert!(store.snapshot().is_admin());

        // A re-check that comes back anonymous must clear everything.
        let t = store.begin_auth_check();
        assert!(store.apply_auth_result(&t, AuthOutcome::Anonymous));

        let snap = store.snapshot();
        assert_eq!(snap.auth, Fact::Resolved(None));
        assert_eq!(snap.admin, Fact::Resolved(false));
        assert!(snap.user.is_none());
        assert!(!snap.is_admin());
    }

    #[test]
    fn failed_auth_check_cascades_like_anonymous() {
        let store = SessionStore::new();
        let t = store.install_session(user("root"));
        assert!(store.apply_admin_result(&t, AdminOutcome::Granted));

        let t = store.begin_auth_check();
        assert!(store.apply_auth_result(&t, AuthOutcome::Failed));

        let snap = store.snapshot();
        assert!(snap.auth.is_failed());
        assert!(snap.is_unauthenticated());
        assert_eq!(snap.admin, Fact::Resolved(false));
        assert!(snap.user.is_none());
    }

    #[test]
    fn failed_admin_check_is_recorded_as_denied() {
        let store = SessionStore::new();
        let t = store.install_session(user("maria"));
        assert!(store.apply_admin_result(&t, AdminOutcome::Failed));

        let snap = store.snapshot();
        assert_eq!(snap.admin, Fact::Resolved(false));
        assert!(!snap.is_admin());
        // The identity itself is untouched.
        assert!(snap.is_authenticated());
    }

    #[test]
    fn stale_auth_result_is_discarded() {
        let store = SessionStore::new();
        let stale = store.begin_auth_check();

        // A newer check supersedes the one above.
        let fresh = store.begin_auth_check();
        assert!(store.apply_auth_result(&fresh, AuthOutcome::Anonymous));

        // The old response arrives late and must not apply.
        assert!(!store.apply_auth_result(&stale, AuthOutcome::Authenticated(user("ghost"))));
        assert_eq!(store.snapshot().auth, Fact::Resolved(None));
    }

    #[test]
    fn reset_discards_in_flight_admin_check() {
        let store = SessionStore::new();
        let t = store.install_session(user("root"));

        // Logout happens while the admin check is still in flight.
        store.reset();

        // Late delivery must not resurrect admin privilege.
        assert!(!store.apply_admin_result(&t, AdminOutcome::Granted));
        let snap = store.snapshot();
        assert!(snap.admin.is_pending());
        assert!(!snap.is_admin());
    }

    #[test]
    fn install_session_cancels_prior_identity_checks() {
        let store = SessionStore::new();
        let old_admin = store.install_session(user("alice"));

        // Alice's admin check is still in flight when Bob logs in.
        let _bob_admin = store.install_session(user("bob"));

        // Alice's grant arrives late: dropped, Bob keeps a pending fact.
        assert!(!store.apply_admin_result(&old_admin, AdminOutcome::Granted));
        let snap = store.snapshot();
        assert_eq!(snap.user().unwrap().user_name, "bob");
        assert!(snap.admin.is_pending());
    }

    #[test]
    fn reset_is_idempotent_including_generation() {
        let store = SessionStore::new();
        let t = store.install_session(user("maria"));
        let _ = store.apply_admin_result(&t, AdminOutcome::Denied);

        store.reset();
        let once = store.snapshot();
        store.reset();
        let twice = store.snapshot();

        assert_eq!(once, twice);
        assert!(once.auth.is_pending());
        assert!(once.admin.is_pending());
        assert!(once.user.is_none());
    }

    #[test]
    fn reset_on_pristine_store_does_not_notify() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        let _ = rx.borrow_and_update();

        store.reset();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn granted_without_identity_never_records_true() {
        // The gate never begins an admin check while anonymous, but the
        // store still refuses to record a grant without an identity.
        let store = SessionStore::new();
        let t = store.begin_admin_check();
        assert!(store.apply_admin_result(&t, AdminOutcome::Granted));
        assert_eq!(store.snapshot().admin, Fact::Resolved(false));
    }

    // Invariant: admin is never observed Resolved(true) while auth is not
    // Resolved(Some(_)), across arbitrary interleavings of store ops.
    #[test]
    fn admin_grant_never_outlives_identity_under_random_transitions() {
        let store = SessionStore::new();
        let mut pending: Vec<(CheckTicket, u8)> = Vec::new();

        // Small deterministic LCG so the sequence is reproducible.
        let mut seed: u64 = 0x5eed_cafe;
        let mut next = move || {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            (seed >> 33) as u32
        };

        for step in 0..2_000 {
            match next() % 7 {
                0 => pending.push((store.begin_auth_check(), 0)),
                1 => pending.push((store.begin_admin_check(), 1)),
                2 => {
                    let t = store.install_session(user(&format!("u{step}")));
                    pending.push((t, 1));
                }
                3 => store.reset(),
                _ => {
                    if pending.is_empty() {
                        continue;
                    }
                    let idx = (next() % u32::try_from(pending.len()).unwrap()) as usize;
                    let (ticket, kind) = pending.swap_remove(idx);
                    if kind == 0 {
                        let outcome = match next() % 3 {
                            0 => AuthOutcome::Authenticated(user(&format!("u{step}"))),
                            1 => AuthOutcome::Anonymous,
                            _ => AuthOutcome::Failed,
                        };
                        let _ = store.apply_auth_result(&ticket, outcome);
                    } else {
                        let outcome = match next() % 3 {
                            0 => AdminOutcome::Granted,
                            1 => AdminOutcome::Denied,
                            _ => AdminOutcome::Failed,
                        };
                        let _ = store.apply_admin_result(&ticket, outcome);
                    }
                }
            }

            let snap = store.snapshot();
            // The sanctioned read never grants without identity.
            if snap.is_admin() {
                assert!(snap.is_authenticated());
            }
            // Once the auth fact settles, a lingering grant is impossible
            // (the cascade clears it) and the user copy agrees with it.
            // While a re-check is pending the last settled values linger,
            // which the guard composes safely.
            if snap.auth.is_settled() {
                if matches!(snap.admin, Fact::Resolved(true)) {
                    assert!(
                        snap.is_authenticated(),
                        "admin grant survived a settled non-authenticated auth fact at step {step}"
                    );
                }
                assert_eq!(snap.user.is_some(), snap.is_authenticated());
            }
        }
    }
}
