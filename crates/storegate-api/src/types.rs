//! Wire types for the storefront identity endpoints.
//!
//! Field names mirror the backend's camelCase JSON. These types stay at the
//! API boundary -- `storegate-core` converts them into its own model.

use serde::{Deserialize, Serialize};

/// The user object as the backend serializes it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(default)]
    pub id: Option<String>,
    pub user_name: String,
    pub email: String,
    /// Role string as stored server-side (e.g. "user", "admin"). Informational
    /// only -- admin privilege is established by the access-check endpoint.
    #[serde(default)]
    pub role: Option<String>,
}

/// Response of `GET /api/auth/check-auth`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCheckResponse {
    pub success: bool,
    #[serde(default)]
    pub user: Option<UserPayload>,
}

/// Response of `POST /api/auth/login`.
///
/// A 200 with `success: false` is a rejected login (bad credentials),
/// carried in `message` -- not a transport error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<UserPayload>,
}

/// Response of `POST /api/auth/register`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /api/auth/logout`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub success: bool,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /api/auth/register`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest<'a> {
    pub user_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}
