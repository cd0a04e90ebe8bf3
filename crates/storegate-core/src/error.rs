// ── Core error types ──
//
// User-facing errors from storegate-core. These are NOT wire-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<storegate_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Which kind of authorization failure a collaborator observed on a
/// protected request. Raised by the transport layer, consumed by
/// [`SessionGate::observe_authorization_failure`](crate::gate::SessionGate::observe_authorization_failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureKind {
    /// 401-equivalent: the session is gone. Treated as a logout.
    Unauthenticated,
    /// 403-equivalent: this session may not do that one thing. A
    /// per-request concern; never resets the session.
    Forbidden,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Expected user-flow outcomes ──────────────────────────────────
    #[error("Login rejected: {message}")]
    LoginRejected { message: String },

    #[error("Registration rejected: {message}")]
    RegistrationRejected { message: String },

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Not authorized")]
    Forbidden,

    // ── Infrastructure failures ──────────────────────────────────────
    #[error("Cannot reach the storefront backend: {message}")]
    Network { message: String },

    #[error("Backend error: {message}")]
    Backend {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<storegate_api::Error> for CoreError {
    fn from(err: storegate_api::Error) -> Self {
        match err {
            storegate_api::Error::Unauthenticated => CoreError::Unauthenticated,
            storegate_api::Error::Forbidden => CoreError::Forbidden,
            storegate_api::Error::Transport(e) => CoreError::Network {
                message: e.to_string(),
            },
            storegate_api::Error::InvalidUrl(e) => CoreError::Backend {
                message: format!("invalid URL: {e}"),
                status: None,
            },
            storegate_api::Error::Api { status, message } => CoreError::Backend {
                message,
                status: Some(status),
            },
            storegate_api::Error::Deserialization { message, body: _ } => CoreError::Backend {
                message: format!("malformed response: {message}"),
                status: None,
            },
        }
    }
}
