//! Shared configuration for the storegate client shells.
//!
//! TOML file + environment overlay, translation to the core's
//! [`RouteTable`]. The backend origin is the one setting without a
//! sensible default -- everything else works out of the box.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storegate_core::{RouteClass, RoutePaths, RouteRule, RouteTable};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no backend URL configured (set [backend] url or STOREGATE_BACKEND_URL)")]
    NoBackendUrl,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub routes: RouteSettings,
}

/// `[backend]` -- where the storefront API lives.
#[derive(Debug, Deserialize, Serialize)]
pub struct BackendSettings {
    /// Backend origin, e.g. "https://shop.example.com".
    pub url: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: None,
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// `[routes]` -- path layout of the application.
///
/// Defaults mirror the storefront's shipped routes; deployments that mount
/// the app elsewhere override the individual paths.
#[derive(Debug, Deserialize, Serialize)]
pub struct RouteSettings {
    #[serde(default = "default_login")]
    pub login: String,

    #[serde(default = "default_register")]
    pub register: String,

    #[serde(default = "default_unauthorized")]
    pub unauthorized: String,

    #[serde(default = "default_customer_landing")]
    pub customer_landing: String,

    #[serde(default = "default_admin_landing")]
    pub admin_landing: String,

    /// Prefix under which the auth entry pages live.
    #[serde(default = "default_auth_area")]
    pub auth_area: String,

    /// Prefix under which every route is admin-protected.
    #[serde(default = "default_admin_area")]
    pub admin_area: String,

    /// Exact paths that require a customer session.
    #[serde(default = "default_customer_protected")]
    pub customer_protected: Vec<String>,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            login: default_login(),
            register: default_register(),
            unauthorized: default_unauthorized(),
            customer_landing: default_customer_landing(),
            admin_landing: default_admin_landing(),
            auth_area: default_auth_area(),
            admin_area: default_admin_area(),
            customer_protected: default_customer_protected(),
        }
    }
}

fn default_login() -> String {
    "/auth/login".into()
}
fn default_register() -> String {
    "/auth/register".into()
}
fn default_unauthorized() -> String {
    "/unauth-page".into()
}
fn default_customer_landing() -> String {
    "/shop/home".into()
}
fn default_admin_landing() -> String {
    "/admin/dashboard".into()
}
fn default_auth_area() -> String {
    "/auth".into()
}
fn default_admin_area() -> String {
    "/admin".into()
}
fn default_customer_protected() -> Vec<String> {
    vec!["/shop/checkout".into(), "/shop/account".into()]
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "storegate", "storegate").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("storegate");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
///
/// Environment variables use the `STOREGATE_` prefix with `_` section
/// separators, e.g. `STOREGATE_BACKEND_URL`.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from an explicit path (plus env overlay).
pub fn load_config_from(path: &std::path::Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("STOREGATE_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning the defaults if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Translation to core types ───────────────────────────────────────

impl Config {
    /// The backend origin as a parsed URL.
    pub fn backend_url(&self) -> Result<url::Url, ConfigError> {
        let raw = self.backend.url.as_deref().ok_or(ConfigError::NoBackendUrl)?;
        raw.parse().map_err(|_| ConfigError::Validation {
            field: "backend.url".into(),
            reason: format!("invalid URL: {raw}"),
        })
    }

    /// Request timeout as a `Duration`.
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout)
    }

    /// Build the core's route table from the configured layout.
    pub fn route_table(&self) -> RouteTable {
        let paths = RoutePaths {
            login: self.routes.login.clone(),
            register: self.routes.register.clone(),
            unauthorized: self.routes.unauthorized.clone(),
            customer_landing: self.routes.customer_landing.clone(),
            admin_landing: self.routes.admin_landing.clone(),
        };

        let mut rules = vec![
            RouteRule::prefix(self.routes.auth_area.clone(), RouteClass::AuthEntry),
            RouteRule::prefix(self.routes.admin_area.clone(), RouteClass::AdminOnly),
        ];
        for path in &self.routes.customer_protected {
            rules.push(RouteRule::exact(path.clone(), RouteClass::AuthOnly));
        }

        RouteTable::with_rules(paths, rules)
    }
}
