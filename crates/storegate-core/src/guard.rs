//! Route guard -- the pure access decision.
//!
//! [`decide`] maps the current [`SessionSnapshot`] and a route's
//! protection class to exactly one [`Decision`]. It never suspends and
//! never touches state; the shell re-evaluates it whenever the store's
//! watch channel reports a change, so the decision tracks the two
//! identity checks as they settle in any order.

use crate::fact::Fact;
use crate::store::SessionSnapshot;

/// Static protection class of a route, attached at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Anyone may view, always.
    Public,
    /// Login/register pages: public, but an authenticated user is bounced
    /// to their landing page instead of seeing the form again.
    AuthEntry,
    /// Requires an authenticated session.
    AuthOnly,
    /// Requires an authenticated session with admin privilege.
    AdminOnly,
}

/// Where a redirect should go, semantically. The
/// [`RouteTable`](crate::routes::RouteTable) resolves targets to paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// To the login page, remembering where the user wanted to go.
    Login { return_to: String },
    /// To the "you are not allowed here" page.
    Unauthorized,
    /// To the default landing page for a signed-in customer.
    CustomerLanding,
    /// To the default landing page for an administrator.
    AdminLanding,
}

/// The guard's verdict for one requested route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Show the requested view.
    Render,
    /// Show nothing but a neutral loading view -- an identity check the
    /// route depends on is still pending. Never the protected content,
    /// never a flash of the redirect target.
    Block,
    /// Navigate elsewhere instead.
    Redirect(RedirectTarget),
}

/// Decide whether the route at `path` with protection `class` may render
/// under `snapshot`.
///
/// Total over all combinations of auth state, admin state, and class;
/// rules are evaluated top to bottom, first match wins:
///
/// 1. `Public` always renders.
/// 2. While the auth fact is pending, everything else blocks.
/// 3. `AuthEntry` renders for the unauthenticated and bounces the
///    authenticated to their landing (admin landing once the admin fact
///    has resolved true).
/// 4. Unauthenticated (confirmed or failed-closed) redirects to login,
///    carrying `path` as the return target.
/// 5. `AuthOnly` renders for any authenticated user.
/// 6. `AdminOnly` blocks while the admin fact is pending, renders on a
///    resolved grant, and redirects to the unauthorized page otherwise.
pub fn decide(class: RouteClass, path: &str, snapshot: &SessionSnapshot) -> Decision {
    match class {
        RouteClass::Public => Decision::Render,

        _ if snapshot.auth.is_pending() => Decision::Block,

        RouteClass::AuthEntry if snapshot.is_authenticated() => {
            if snapshot.is_admin() {
                Decision::Redirect(RedirectTarget::AdminLanding)
            } else {
                Decision::Redirect(RedirectTarget::CustomerLanding)
            }
        }
        RouteClass::AuthEntry => Decision::Render,

        _ if !snapshot.is_authenticated() => Decision::Redirect(RedirectTarget::Login {
            return_to: path.to_owned(),
        }),

        RouteClass::AuthOnly => Decision::Render,

        RouteClass::AdminOnly => match snapshot.admin {
            Fact::Pending => Decision::Block,
            Fact::Resolved(true) => Decision::Render,
            Fact::Resolved(false) | Fact::Failed => {
                Decision::Redirect(RedirectTarget::Unauthorized)
            }
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::UserRecord;

    fn user() -> Arc<UserRecord> {
        Arc::new(UserRecord {
            id: Some("u-1".into()),
            user_name: "maria".into(),
            email: "maria@example.com".into(),
            role: Some("user".into()),
        })
    }

    fn snap(auth: Fact<Option<Arc<UserRecord>>>, admin: Fact<bool>) -> SessionSnapshot {
        let user = match &auth {
            Fact::Resolved(Some(u)) => Some(Arc::clone(u)),
            _ => None,
        };
        SessionSnapshot {
            auth,
            admin,
            user,
            generation: 1,
        }
    }

    fn auth_states() -> Vec<Fact<Option<Arc<UserRecord>>>> {
        vec![
            Fact::Pending,
            Fact::Resolved(None),
            Fact::Resolved(Some(user())),
            Fact::Failed,
        ]
    }

    const ADMIN_STATES: [Fact<bool>; 4] = [
        Fact::Pending,
        Fact::Resolved(false),
        Fact::Resolved(true),
        Fact::Failed,
    ];

    const CLASSES: [RouteClass; 4] = [
        RouteClass::Public,
        RouteClass::AuthEntry,
        RouteClass::AuthOnly,
        RouteClass::AdminOnly,
    ];

    /// The expected decision, written as an independent oracle of the
    /// rule table.
    fn expected(
        class: RouteClass,
        auth: &Fact<Option<Arc<UserRecord>>>,
        admin: Fact<bool>,
    ) -> Decision {
        let authenticated = matches!(auth, Fact::Resolved(Some(_)));
        match class {
            RouteClass::Public => Decision::Render,
            _ if auth.is_pending() => Decision::Block,
            RouteClass::AuthEntry if !authenticated => Decision::Render,
            RouteClass::AuthEntry => {
                if admin == Fact::Resolved(true) {
                    Decision::Redirect(RedirectTarget::AdminLanding)
                } else {
                    Decision::Redirect(RedirectTarget::CustomerLanding)
                }
            }
            _ if !authenticated => Decision::Redirect(RedirectTarget::Login {
                return_to: "/p".into(),
            }),
            RouteClass::AuthOnly => Decision::Render,
            RouteClass::AdminOnly => match admin {
                Fact::Pending => Decision::Block,
                Fact::Resolved(true) => Decision::Render,
                Fact::Resolved(false) | Fact::Failed => {
                    Decision::Redirect(RedirectTarget::Unauthorized)
                }
            },
        }
    }

    #[test]
    fn decision_table_is_total_and_deterministic() {
        for auth in auth_states() {
            for admin in ADMIN_STATES {
                for class in CLASSES {
                    let s = snap(auth.clone(), admin);
                    let first = decide(class, "/p", &s);
                    let second = decide(class, "/p", &s);
                    assert_eq!(first, second, "non-deterministic for {class:?}/{auth:?}/{admin:?}");
                    assert_eq!(
                        first,
                        expected(class, &auth, admin),
                        "wrong decision for {class:?}/{auth:?}/{admin:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn fresh_load_blocks_admin_route() {
        // Scenario: both checks pending on a cold start.
        let s = snap(Fact::Pending, Fact::Pending);
        assert_eq!(decide(RouteClass::AdminOnly, "/admin/dashboard", &s), Decision::Block);
        assert_eq!(decide(RouteClass::AuthOnly, "/shop/account", &s), Decision::Block);
        assert_eq!(decide(RouteClass::Public, "/shop/home", &s), Decision::Render);
    }

    #[test]
    fn customer_is_kept_out_of_admin_routes() {
        // Scenario: authenticated customer, admin check answered no.
        let s = snap(Fact::Resolved(Some(user())), Fact::Resolved(false));
        assert_eq!(
            decide(RouteClass::AdminOnly, "/admin/orders", &s),
            Decision::Redirect(RedirectTarget::Unauthorized)
        );
        assert_eq!(decide(RouteClass::AuthOnly, "/shop/checkout", &s), Decision::Render);
    }

    #[test]
    fn anonymous_visitor_is_sent_to_login_with_return_target() {
        let s = snap(Fact::Resolved(None), Fact::Resolved(false));
        assert_eq!(
            decide(RouteClass::AuthOnly, "/shop/checkout", &s),
            Decision::Redirect(RedirectTarget::Login {
                return_to: "/shop/checkout".into()
            })
        );
        // The login page itself renders for the anonymous visitor.
        assert_eq!(decide(RouteClass::AuthEntry, "/auth/login", &s), Decision::Render);
    }

    #[test]
    fn authenticated_admin_is_bounced_from_login_to_admin_landing() {
        let s = snap(Fact::Resolved(Some(user())), Fact::Resolved(true));
        assert_eq!(
            decide(RouteClass::AuthEntry, "/auth/login", &s),
            Decision::Redirect(RedirectTarget::AdminLanding)
        );
    }

    #[test]
    fn authenticated_customer_is_bounced_from_login_to_customer_landing() {
        let s = snap(Fact::Resolved(Some(user())), Fact::Resolved(false));
        assert_eq!(
            decide(RouteClass::AuthEntry, "/auth/register", &s),
            Decision::Redirect(RedirectTarget::CustomerLanding)
        );
    }

    #[test]
    fn admin_pending_blocks_only_admin_routes() {
        let s = snap(Fact::Resolved(Some(user())), Fact::Pending);
        assert_eq!(decide(RouteClass::AdminOnly, "/admin/dashboard", &s), Decision::Block);
        // Customer-protected content must not wait on the admin check.
        assert_eq!(decide(RouteClass::AuthOnly, "/shop/account", &s), Decision::Render);
        // Nor should the auth-entry bounce: with the admin fact unsettled,
        // the customer landing is the safe destination.
        assert_eq!(
            decide(RouteClass::AuthEntry, "/auth/login", &s),
            Decision::Redirect(RedirectTarget::CustomerLanding)
        );
    }

    #[test]
    fn failed_auth_check_behaves_like_anonymous() {
        let s = snap(Fact::Failed, Fact::Resolved(false));
        assert_eq!(
            decide(RouteClass::AuthOnly, "/shop/account", &s),
            Decision::Redirect(RedirectTarget::Login {
                return_to: "/shop/account".into()
            })
        );
        assert_eq!(decide(RouteClass::AuthEntry, "/auth/login", &s), Decision::Render);
        assert_eq!(decide(RouteClass::Public, "/shop/home", &s), Decision::Render);
    }

    #[test]
    fn pending_auth_blocks_auth_entry_too() {
        // No flash of the login form for a user who is about to be
        // confirmed authenticated and bounced away.
        let s = snap(Fact::Pending, Fact::Pending);
        assert_eq!(decide(RouteClass::AuthEntry, "/auth/login", &s), Decision::Block);
    }
}
