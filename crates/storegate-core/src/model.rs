//! Domain model types for the session gate.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// The authenticated user's identity payload, as provided by the backend.
///
/// The gate treats this as opaque except for presence/absence -- admin
/// privilege comes from the access-check endpoint, never from `role`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Option<String>,
    pub user_name: String,
    pub email: String,
    pub role: Option<String>,
}

impl From<storegate_api::UserPayload> for UserRecord {
    fn from(p: storegate_api::UserPayload) -> Self {
        Self {
            id: p.id,
            user_name: p.user_name,
            email: p.email,
            role: p.role,
        }
    }
}

/// Login credentials. The password never appears in `Debug` output.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Account registration form.
#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub user_name: String,
    pub email: String,
    pub password: SecretString,
}

impl RegisterForm {
    pub fn new(
        user_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}
