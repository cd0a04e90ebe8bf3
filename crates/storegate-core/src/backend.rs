//! Collaborator seams consumed by the gate.
//!
//! [`IdentityBackend`] is the backend's identity surface; the real
//! implementation wraps [`StorefrontClient`](storegate_api::StorefrontClient),
//! and tests substitute scripted in-memory fakes. Futures are `Send` so
//! gate calls can be driven from spawned tasks.

use std::future::Future;

use storegate_api::Error as ApiError;
use storegate_api::client::user_from_check;

use crate::model::{Credentials, RegisterForm, UserRecord};

/// Result of an authentication check: who the backend says we are.
#[derive(Debug, Clone)]
pub struct AuthCheck {
    /// `None` means confirmed-anonymous.
    pub user: Option<UserRecord>,
}

/// Result of a login attempt that reached the backend.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// The session cookie is set; this is who we are now.
    Accepted(UserRecord),
    /// The backend declined the credentials.
    Rejected { message: String },
}

/// Result of a registration attempt that reached the backend.
#[derive(Debug, Clone)]
pub enum RegisterOutcome {
    Accepted { message: String },
    Rejected { message: String },
}

/// The storefront backend's identity surface, as the gate consumes it.
pub trait IdentityBackend: Send + Sync + 'static {
    /// Who does the backend think we are? `Ok` with `user: None` is the
    /// confirmed-anonymous answer; an `Unauthenticated` error is folded
    /// into the same answer by the gate.
    fn check_authentication(&self) -> impl Future<Output = Result<AuthCheck, ApiError>> + Send;

    /// Is the current session an admin? `Ok(())` means yes; a `Forbidden`
    /// error is the expected "no".
    fn check_admin_privilege(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<LoginOutcome, ApiError>> + Send;

    fn register(
        &self,
        form: &RegisterForm,
    ) -> impl Future<Output = Result<RegisterOutcome, ApiError>> + Send;

    /// Best-effort server-side session teardown.
    fn logout(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Client-local state that depends on the session (e.g. a cart) and must
/// be dropped when the identity is forgotten.
pub trait DependentState: Send + Sync {
    fn clear(&self);
}

// ── Real backend ────────────────────────────────────────────────────

impl IdentityBackend for storegate_api::StorefrontClient {
    async fn check_authentication(&self) -> Result<AuthCheck, ApiError> {
        match self.check_auth().await {
            Ok(resp) => Ok(AuthCheck {
                user: user_from_check(resp).map(UserRecord::from),
            }),
            // The check endpoint answers 401 for "nobody": a valid answer,
            // not a failure.
            Err(e) if e.is_unauthenticated() => Ok(AuthCheck { user: None }),
            Err(e) => Err(e),
        }
    }

    async fn check_admin_privilege(&self) -> Result<(), ApiError> {
        self.check_admin_access().await
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, ApiError> {
        let resp = storegate_api::StorefrontClient::login(
            self,
            &credentials.email,
            &credentials.password,
        )
        .await?;

        if resp.success {
            match resp.user {
                Some(user) => Ok(LoginOutcome::Accepted(UserRecord::from(user))),
                None => Err(ApiError::Deserialization {
                    message: "login succeeded without a user payload".into(),
                    body: String::new(),
                }),
            }
        } else {
            Ok(LoginOutcome::Rejected {
                message: resp
                    .message
                    .unwrap_or_else(|| "login rejected".into()),
            })
        }
    }

    async fn register(&self, form: &RegisterForm) -> Result<RegisterOutcome, ApiError> {
        let resp = storegate_api::StorefrontClient::register(
            self,
            &form.user_name,
            &form.email,
            &form.password,
        )
        .await?;

        let message = resp.message.unwrap_or_default();
        if resp.success {
            Ok(RegisterOutcome::Accepted { message })
        } else {
            Ok(RegisterOutcome::Rejected { message })
        }
    }

    async fn logout(&self) -> Result<(), ApiError> {
        storegate_api::StorefrontClient::logout(self).await
    }
}
