// Storefront identity API HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, status-to-error mapping,
// and the cookie-session transport. The session cookie set by a successful
// login lives in the shared jar and rides along on every later request.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::CACHE_CONTROL;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{
    AuthCheckResponse, LoginRequest, LoginResponse, LogoutResponse, RegisterRequest,
    RegisterResponse, UserPayload,
};

/// Raw HTTP client for the storefront backend's identity endpoints.
///
/// Session state is a cookie in the shared jar; there is no token to manage
/// client-side. All methods return unwrapped payloads -- HTTP status codes
/// are folded into [`Error`] before the caller sees anything.
pub struct StorefrontClient {
    http: reqwest::Client,
    base_url: Url,
    #[allow(dead_code)]
    cookie_jar: Option<Arc<Jar>>,
}

impl StorefrontClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// If the config doesn't already include a cookie jar, one is created
    /// automatically (session auth requires cookies). `base_url` is the
    /// backend origin, e.g. `https://shop.example.com`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config.cookie_jar.clone();
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            cookie_jar,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Use this when you already have a client with a session cookie in its
    /// jar, or in tests against a mock server.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            cookie_jar: None,
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/auth/check-auth` -- who does the backend think we are?
    ///
    /// Sent with `Cache-Control: no-store` so an intermediary can never
    /// replay a stale identity. A 401 here is returned as
    /// [`Error::Unauthenticated`]; callers that want "anonymous is a valid
    /// answer" semantics should branch on [`Error::is_unauthenticated`].
    pub async fn check_auth(&self) -> Result<AuthCheckResponse, Error> {
        let url = self.api_url("auth/check-auth")?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header(
                CACHE_CONTROL,
                "no-store, no-cache, must-revalidate, proxy-revalidate",
            )
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_json(resp).await
    }

    /// `GET /api/admin/access-check` -- is the current session an admin?
    ///
    /// `Ok(())` means yes. A 403 is the expected "no" and comes back as
    /// [`Error::Forbidden`]; a 401 means the session itself is gone.
    pub async fn check_admin_access(&self) -> Result<(), Error> {
        let url = self.api_url("admin/access-check")?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();

        match status.as_u16() {
            401 => Err(Error::Unauthenticated),
            403 => Err(Error::Forbidden),
            _ if status.is_success() => Ok(()),
            s => {
                let message = resp.text().await.unwrap_or_default();
                Err(Error::Api { status: s, message })
            }
        }
    }

    /// `POST /api/auth/login` -- authenticate with email + password.
    ///
    /// On success the backend sets the session cookie in our jar. A 200
    /// with `success: false` (wrong credentials) is returned as a normal
    /// [`LoginResponse`], not an error -- the caller decides how to surface
    /// the rejection message.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<LoginResponse, Error> {
        let url = self.api_url("auth/login")?;
        debug!("logging in at {}", url);

        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let parsed: LoginResponse = parse_json(resp).await?;
        if parsed.success {
            debug!("login successful");
        } else {
            debug!("login rejected by backend");
        }
        Ok(parsed)
    }

    /// `POST /api/auth/register` -- create an account.
    ///
    /// Registration does not set a session cookie; the user logs in
    /// afterwards.
    pub async fn register(
        &self,
        user_name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<RegisterResponse, Error> {
        let url = self.api_url("auth/register")?;
        debug!("registering at {}", url);

        let body = RegisterRequest {
            user_name,
            email,
            password: password.expose_secret(),
        };

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_json(resp).await
    }

    /// `POST /api/auth/logout` -- end the current session.
    ///
    /// Best-effort from the caller's perspective: the client-side session
    /// is forgotten regardless of what this returns.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.api_url("auth/logout")?;
        debug!("logging out at {}", url);

        let resp = self
            .http
            .post(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        let _body: LogoutResponse = parse_json(resp).await?;
        debug!("logout complete");
        Ok(())
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api/{path}`.
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/api/{path}")).map_err(Error::InvalidUrl)
    }
}

/// Extract the user payload from a check-auth response, treating
/// `success: false` as anonymous.
pub fn user_from_check(resp: AuthCheckResponse) -> Option<UserPayload> {
    if resp.success { resp.user } else { None }
}

// ── Response parsing ─────────────────────────────────────────────────

/// Map the HTTP status, then deserialize the body.
///
/// 401 and 403 are first-class outcomes the core branches on; everything
/// else non-success is a generic API error with the raw body attached.
async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();

    match status.as_u16() {
        401 => return Err(Error::Unauthenticated),
        403 => return Err(Error::Forbidden),
        s if !status.is_success() => {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Api { status: s, message });
        }
        _ => {}
    }

    let body = resp.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}
