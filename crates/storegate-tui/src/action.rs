//! Actions — the single mutation pathway into the app.
//!
//! Everything that changes app state arrives here: key-driven navigation,
//! session snapshot changes forwarded by the bridge, and results of
//! spawned gate calls.

use storegate_core::{SessionEvent, SessionSnapshot};

/// One unit of app-state mutation.
#[derive(Debug)]
pub enum Action {
    /// Move to a path (subject to the route guard).
    Navigate(String),

    /// The session store published a new snapshot.
    SessionChanged(SessionSnapshot),

    /// The gate emitted a transition event.
    Session(SessionEvent),

    /// A spawned login call finished. `Err` carries the user-facing message.
    LoginFinished(Result<(), String>),

    /// A spawned registration call finished.
    RegisterFinished(Result<String, String>),

    /// Transient status line content.
    Notify(String),

    /// Shut the app down.
    Quit,
}
