//! Route classification and redirect destinations.
//!
//! Protection classes are attached to paths statically, at configuration
//! time; the table itself is immutable at runtime. Matching is
//! segment-aware: `/auth` covers `/auth/login` but not `/authx`.

use url::form_urlencoded;

use crate::guard::{RedirectTarget, RouteClass};

/// Well-known destination paths the guard redirects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePaths {
    pub login: String,
    pub register: String,
    pub unauthorized: String,
    pub customer_landing: String,
    pub admin_landing: String,
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            login: "/auth/login".into(),
            register: "/auth/register".into(),
            unauthorized: "/unauth-page".into(),
            customer_landing: "/shop/home".into(),
            admin_landing: "/admin/dashboard".into(),
        }
    }
}

/// How a rule matches a requested path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// The path itself, exactly.
    Exact(String),
    /// The path itself, or any path nested under it.
    Prefix(String),
}

impl PathPattern {
    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => path == p,
            Self::Prefix(p) => {
                path == p || (path.starts_with(p) && path[p.len()..].starts_with('/'))
            }
        }
    }
}

/// One classification rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub pattern: PathPattern,
    pub class: RouteClass,
}

impl RouteRule {
    pub fn exact(path: impl Into<String>, class: RouteClass) -> Self {
        Self {
            pattern: PathPattern::Exact(path.into()),
            class,
        }
    }

    pub fn prefix(path: impl Into<String>, class: RouteClass) -> Self {
        Self {
            pattern: PathPattern::Prefix(path.into()),
            class,
        }
    }
}

/// The application's route map: classification rules plus the well-known
/// redirect destinations.
#[derive(Debug, Clone)]
pub struct RouteTable {
    paths: RoutePaths,
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// The storefront's default table: `/auth/*` is the entry area,
    /// `/admin/*` is admin-protected, checkout and account are
    /// customer-protected, everything else is public.
    pub fn new(paths: RoutePaths) -> Self {
        let rules = vec![
            RouteRule::prefix("/auth", RouteClass::AuthEntry),
            RouteRule::prefix("/admin", RouteClass::AdminOnly),
            RouteRule::exact("/shop/checkout", RouteClass::AuthOnly),
            RouteRule::exact("/shop/account", RouteClass::AuthOnly),
        ];
        Self { paths, rules }
    }

    /// A table with custom rules. First matching rule wins; unmatched
    /// paths are public.
    pub fn with_rules(paths: RoutePaths, rules: Vec<RouteRule>) -> Self {
        Self { paths, rules }
    }

    pub fn paths(&self) -> &RoutePaths {
        &self.paths
    }

    /// Protection class for a requested path.
    pub fn classify(&self, path: &str) -> RouteClass {
        self.rules
            .iter()
            .find(|r| r.pattern.matches(path))
            .map_or(RouteClass::Public, |r| r.class)
    }

    /// Resolve a semantic redirect target to a concrete path.
    ///
    /// The login target carries the originally-requested path as a
    /// percent-encoded `from` query parameter, so the shell can return
    /// the user there after a successful login.
    pub fn resolve(&self, target: &RedirectTarget) -> String {
        match target {
            RedirectTarget::Login { return_to } => {
                let encoded: String =
                    form_urlencoded::byte_serialize(return_to.as_bytes()).collect();
                format!("{}?from={encoded}", self.paths.login)
            }
            RedirectTarget::Unauthorized => self.paths.unauthorized.clone(),
            RedirectTarget::CustomerLanding => self.paths.customer_landing.clone(),
            RedirectTarget::AdminLanding => self.paths.admin_landing.clone(),
        }
    }

    /// Whether a logout-style redirect away from `path` is safe --
    /// i.e. `path` is not itself part of the auth entry area or the
    /// unauthorized page, where another redirect would loop.
    pub fn is_loop_safe(&self, path: &str) -> bool {
        self.classify(path) != RouteClass::AuthEntry && path != self.paths.unauthorized
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(RoutePaths::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_table_classification() {
        let table = RouteTable::default();

        assert_eq!(table.classify("/auth/login"), RouteClass::AuthEntry);
        assert_eq!(table.classify("/auth/register"), RouteClass::AuthEntry);
        assert_eq!(table.classify("/admin/dashboard"), RouteClass::AdminOnly);
        assert_eq!(table.classify("/admin/orders"), RouteClass::AdminOnly);
        assert_eq!(table.classify("/shop/checkout"), RouteClass::AuthOnly);
        assert_eq!(table.classify("/shop/account"), RouteClass::AuthOnly);

        assert_eq!(table.classify("/shop/home"), RouteClass::Public);
        assert_eq!(table.classify("/shop/listing"), RouteClass::Public);
        assert_eq!(table.classify("/unauth-page"), RouteClass::Public);
        assert_eq!(table.classify("/nowhere"), RouteClass::Public);
    }

    #[test]
    fn prefix_matching_is_segment_aware() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/admin"), RouteClass::AdminOnly);
        assert_eq!(table.classify("/administrivia"), RouteClass::Public);
        assert_eq!(table.classify("/authx"), RouteClass::Public);
    }

    #[test]
    fn exact_rules_do_not_cover_children() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/shop/checkout/extra"), RouteClass::Public);
    }

    #[test]
    fn login_redirect_carries_encoded_return_target() {
        let table = RouteTable::default();
        let path = table.resolve(&RedirectTarget::Login {
            return_to: "/shop/checkout".into(),
        });
        assert_eq!(path, "/auth/login?from=%2Fshop%2Fcheckout");
    }

    #[test]
    fn semantic_targets_resolve_to_configured_paths() {
        let mut paths = RoutePaths::default();
        paths.admin_landing = "/backoffice/home".into();
        let table = RouteTable::new(paths);

        assert_eq!(table.resolve(&RedirectTarget::Unauthorized), "/unauth-page");
        assert_eq!(table.resolve(&RedirectTarget::CustomerLanding), "/shop/home");
        assert_eq!(table.resolve(&RedirectTarget::AdminLanding), "/backoffice/home");
    }

    #[test]
    fn loop_safety_excludes_auth_area_and_unauthorized_page() {
        let table = RouteTable::default();
        assert!(!table.is_loop_safe("/auth/login"));
        assert!(!table.is_loop_safe("/auth/register"));
        assert!(!table.is_loop_safe("/unauth-page"));
        assert!(table.is_loop_safe("/shop/home"));
        assert!(table.is_loop_safe("/shop/checkout"));
    }
}
