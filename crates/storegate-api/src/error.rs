use thiserror::Error;

/// Top-level error type for the `storegate-api` crate.
///
/// Covers every failure mode of the identity endpoints: authorization
/// outcomes the caller must branch on (401/403), transport failures, and
/// malformed payloads. `storegate-core` maps these into its own taxonomy --
/// consumers of the core never see HTTP detail.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authorization outcomes ──────────────────────────────────────
    /// The backend rejected the request as unauthenticated (401).
    /// For protected endpoints this means the session cookie is missing,
    /// expired, or revoked.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The backend rejected the request as forbidden (403). For the
    /// admin access check this is the expected "not an admin" answer,
    /// not a fault.
    #[error("Forbidden")]
    Forbidden,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Backend responses ───────────────────────────────────────────
    /// Non-success HTTP status that isn't 401/403.
    #[error("Backend error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error means the session is not (or no
    /// longer) authenticated.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// Returns `true` if this is a definitive 403 -- an authorization
    /// answer, not a transport fault.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden)
    }

    /// Returns `true` if this is a transient transport error worth
    /// retrying from a fresh bootstrap.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
