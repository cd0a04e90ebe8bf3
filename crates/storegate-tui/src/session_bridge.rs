//! Session bridge — connects the gate's reactive surface to TUI actions.
//!
//! Runs as a background task: bootstraps the session, then forwards every
//! snapshot change and session event as an [`Action`] through the TUI's
//! action channel.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use storegate_api::StorefrontClient;
use storegate_core::SessionGate;

use crate::action::Action;

/// Bootstrap the session, then loop forwarding snapshot changes and
/// session events until cancelled.
pub async fn run_session_bridge(
    gate: SessionGate<StorefrontClient>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut snapshots = gate.subscribe();
    let mut events = gate.events();

    // Resolve the identity facts. Failure is already recorded fail-closed
    // in the store; just tell the user.
    if let Err(e) = gate.bootstrap().await {
        warn!(error = %e, "session bootstrap failed");
        let _ = action_tx.send(Action::Notify(format!("Backend unreachable: {e}")));
    }

    // Push the settled state so the first routing decision is current.
    let _ = action_tx.send(Action::SessionChanged(snapshots.borrow_and_update().clone()));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            changed = snapshots.changed() => {
                if changed.is_err() {
                    break; // gate dropped
                }
                let snap = snapshots.borrow_and_update().clone();
                let _ = action_tx.send(Action::SessionChanged(snap));
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let _ = action_tx.send(Action::Session(event));
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "session event stream lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    debug!("session bridge shut down");
}
