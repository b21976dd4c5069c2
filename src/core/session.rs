//! Session context and route authorization
//!
//! The session is an explicit value handed to views instead of ambient
//! global state. Route access is decided by the pure [`authorize`]
//! predicate:
//! - no session: redirect to the login page
//! - wrong role: redirect to the session role's home dashboard

use crate::core::entity::EntityId;
use crate::core::error::{ConsoleError, ConsoleResult};
use crate::core::service::AuthService;
use crate::core::validation::filters::trim;
use crate::core::validation::validators::required;
use crate::core::validation::{FieldRules, Form, FormRules};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

pub const LOGIN_ROUTE: &str = "/login";
pub const ADMIN_HOME: &str = "/admin/dashboard";
pub const CUSTOMER_HOME: &str = "/customer/dashboard";

/// Role of a signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    /// Dashboard a user of this role lands on
    pub fn home_route(self) -> &'static str {
        match self {
            Role::Admin => ADMIN_HOME,
            Role::Customer => CUSTOMER_HOME,
        }
    }
}

/// The signed-in user as returned by login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: EntityId,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Shared handle to the current session.
///
/// Clones share the same underlying state, so a `logout()` through any
/// clone invalidates the session for every view holding it.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<SessionUser>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that starts signed in
    pub fn signed_in(user: SessionUser) -> Self {
        let context = Self::new();
        context.login(user);
        context
    }

    pub fn login(&self, user: SessionUser) {
        tracing::info!(user = %user.username, role = ?user.role, "session started");
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(user);
    }

    pub fn logout(&self) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if let Some(user) = guard.take() {
            tracing::info!(user = %user.username, "session ended");
        }
    }

    /// Replace the signed-in user's details, e.g. after a profile edit.
    ///
    /// Ignored when nobody is signed in or `user` belongs to someone else;
    /// returns whether the session changed.
    pub fn update_user(&self, user: SessionUser) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        match guard.as_mut() {
            Some(current) if current.id == user.id => {
                tracing::debug!(user = %user.username, "session user refreshed");
                *current = user;
                true
            }
            _ => false,
        }
    }

    /// Snapshot of the current user
    pub fn user(&self) -> Option<SessionUser> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user().map(|user| user.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn is_customer(&self) -> bool {
        self.role() == Some(Role::Customer)
    }

    /// Where the current session should land; the login page without one
    pub fn home_route(&self) -> &'static str {
        self.role().map_or(LOGIN_ROUTE, Role::home_route)
    }
}

/// Login form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Form for LoginRequest {
    fn rules(_today: NaiveDate) -> FormRules {
        FormRules::new()
            .field(FieldRules::new("username").filter(trim()).validate(required()))
            .field(FieldRules::new("password").validate(required()))
    }
}

/// Validate credentials, log in and start the session.
///
/// Returns the route the user should land on.
pub async fn sign_in(
    auth: &dyn AuthService,
    session: &SessionContext,
    request: &LoginRequest,
) -> ConsoleResult<&'static str> {
    let request = request.validated()?;
    match auth.login(&request).await {
        Ok(user) => {
            let home = user.role.home_route();
            session.login(user);
            Ok(home)
        }
        Err(e) => {
            tracing::warn!(user = %request.username, error = %e, "login rejected");
            Err(ConsoleError::LoginFailed(e))
        }
    }
}

/// Access requirement of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// No session needed
    Public,

    /// Any signed-in user
    Authenticated,

    /// A signed-in user with this role
    Role(Role),
}

/// Outcome of an authorization check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny { redirect: &'static str },
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }
}

/// Decide access for a session snapshot
pub fn authorize(session: Option<&SessionUser>, policy: AccessPolicy) -> Access {
    match (policy, session) {
        (AccessPolicy::Public, _) => Access::Allow,
        (_, None) => Access::Deny {
            redirect: LOGIN_ROUTE,
        },
        (AccessPolicy::Authenticated, Some(_)) => Access::Allow,
        (AccessPolicy::Role(required), Some(user)) if user.role == required => Access::Allow,
        (AccessPolicy::Role(_), Some(user)) => Access::Deny {
            redirect: user.role.home_route(),
        },
    }
}

/// Access policy of a portal route, `None` for unknown paths
pub fn route_policy(path: &str) -> Option<AccessPolicy> {
    let path = path.trim_end_matches('/');
    let under = |prefix: &str| path == prefix || path.starts_with(&format!("{prefix}/"));

    if path == LOGIN_ROUTE {
        Some(AccessPolicy::Public)
    } else if under("/admin") {
        Some(AccessPolicy::Role(Role::Admin))
    } else if under("/customer") {
        Some(AccessPolicy::Role(Role::Customer))
    } else if under("/payment") || under("/profile") {
        Some(AccessPolicy::Authenticated)
    } else {
        None
    }
}

/// Authorize navigation to a path; unknown paths fall back to the login page
pub fn authorize_route(session: &SessionContext, path: &str) -> Access {
    match route_policy(path) {
        Some(policy) => authorize(session.user().as_ref(), policy),
        None => Access::Deny {
            redirect: LOGIN_ROUTE,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> SessionUser {
        SessionUser {
            id: 1,
            username: "jdoe".to_string(),
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_no_session_redirects_to_login() {
        let access = authorize(None, AccessPolicy::Role(Role::Admin));
        assert_eq!(access, Access::Deny { redirect: "/login" });
        assert!(!authorize(None, AccessPolicy::Authenticated).is_allowed());
        assert!(authorize(None, AccessPolicy::Public).is_allowed());
    }

    #[test]
    fn test_wrong_role_redirects_home() {
        let customer = user(Role::Customer);
        assert_eq!(
            authorize(Some(&customer), AccessPolicy::Role(Role::Admin)),
            Access::Deny {
                redirect: "/customer/dashboard"
            }
        );

        let admin = user(Role::Admin);
        assert_eq!(
            authorize(Some(&admin), AccessPolicy::Role(Role::Customer)),
            Access::Deny {
                redirect: "/admin/dashboard"
            }
        );
        assert!(authorize(Some(&admin), AccessPolicy::Role(Role::Admin)).is_allowed());
    }

    #[test]
    fn test_logout_invalidates_all_clones() {
        let session = SessionContext::signed_in(user(Role::Admin));
        let view_handle = session.clone();
        assert!(view_handle.is_admin());
        assert_eq!(view_handle.home_route(), "/admin/dashboard");

        session.logout();
        assert!(!view_handle.is_authenticated());
        assert_eq!(view_handle.home_route(), "/login");
    }

    #[test]
    fn test_update_user_refreshes_matching_session() {
        let session = SessionContext::new();
        assert!(!session.update_user(user(Role::Customer)));
        assert!(!session.is_authenticated());

        session.login(user(Role::Customer));
        let view_handle = session.clone();
        let renamed = SessionUser {
            name: "Jane Smith".to_string(),
            ..user(Role::Customer)
        };
        assert!(session.update_user(renamed));
        assert_eq!(view_handle.user().unwrap().name, "Jane Smith");

        let stranger = SessionUser {
            id: 2,
            ..user(Role::Admin)
        };
        assert!(!session.update_user(stranger));
        assert!(view_handle.is_customer());
    }

    #[test]
    fn test_route_policies() {
        assert_eq!(route_policy("/login"), Some(AccessPolicy::Public));
        assert_eq!(
            route_policy("/admin/drivers"),
            Some(AccessPolicy::Role(Role::Admin))
        );
        assert_eq!(
            route_policy("/customer/book-ride/"),
            Some(AccessPolicy::Role(Role::Customer))
        );
        assert_eq!(route_policy("/payment"), Some(AccessPolicy::Authenticated));
        assert_eq!(route_policy("/administrator"), None);

        let session = SessionContext::signed_in(user(Role::Customer));
        assert!(authorize_route(&session, "/customer/rides").is_allowed());
        assert_eq!(
            authorize_route(&session, "/admin/users"),
            Access::Deny {
                redirect: "/customer/dashboard"
            }
        );
        assert_eq!(
            authorize_route(&session, "/nowhere"),
            Access::Deny { redirect: "/login" }
        );
    }
}
