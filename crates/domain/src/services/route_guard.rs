//! Role-gated portal routes.
//!
//! Each portal path belongs to the route group with the longest matching
//! prefix. A group carries an allow-list of base roles; the public group has
//! none. The guard decides whether a caller may open a path or where to send
//! them instead.

use serde::Serialize;
use shared::roles::{BaseRole, UserRole};
use url::form_urlencoded;

pub const STAFF_LOGIN: &str = "/staff/login";
pub const CUSTOMER_LOGIN: &str = "/customer/login";
pub const STAFF_HOME: &str = "/staff/dashboard";
pub const CUSTOMER_HOME: &str = "/customer/dashboard";
pub const ACCOUNT_INACTIVE: &str = "/account-inactive";

/// A gated route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteGroup {
    pub prefix: &'static str,
    pub allowed: &'static [BaseRole],
    pub login_path: &'static str,
}

/// Gated groups, longest prefix first.
pub const ROUTE_GROUPS: &[RouteGroup] = &[
    RouteGroup {
        prefix: "/staff/admin",
        allowed: &[BaseRole::Admin],
        login_path: STAFF_LOGIN,
    },
    RouteGroup {
        prefix: "/staff",
        allowed: &[BaseRole::Admin, BaseRole::Staff],
        login_path: STAFF_LOGIN,
    },
    RouteGroup {
        prefix: "/customer",
        allowed: &[BaseRole::Customer],
        login_path: CUSTOMER_LOGIN,
    },
];

const PUBLIC_PATHS: &[&str] = &[STAFF_LOGIN, CUSTOMER_LOGIN];

/// Outcome of a route check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(String),
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }

    pub fn redirect_to(&self) -> Option<&str> {
        match self {
            Access::Allow => None,
            Access::Redirect(to) => Some(to),
        }
    }
}

/// Response body of the route access endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RouteAccessResponse {
    pub path: String,
    pub allowed: bool,
    pub redirect_to: Option<String>,
}

impl RouteAccessResponse {
    pub fn new(path: impl Into<String>, access: &Access) -> Self {
        Self {
            path: path.into(),
            allowed: access.is_allowed(),
            redirect_to: access.redirect_to().map(str::to_string),
        }
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
}

/// Group owning `path`, or `None` for public paths.
pub fn group_for(path: &str) -> Option<&'static RouteGroup> {
    let bare = path.split(['?', '#']).next().unwrap_or(path);
    if PUBLIC_PATHS.contains(&bare) {
        return None;
    }
    ROUTE_GROUPS
        .iter()
        .find(|group| matches_prefix(bare, group.prefix))
}

/// Landing page for a role.
pub fn home_for(role: &UserRole) -> &'static str {
    if role.base.is_staff_side() {
        STAFF_HOME
    } else {
        CUSTOMER_HOME
    }
}

fn login_redirect(login_path: &str, original: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect", original)
        .finish();
    format!("{}?{}", login_path, query)
}

/// Decides whether a caller with `role` (if signed in) may open `path`.
pub fn decide(path: &str, role: Option<&UserRole>) -> Access {
    let Some(group) = group_for(path) else {
        return Access::Allow;
    };

    let Some(role) = role else {
        return Access::Redirect(login_redirect(group.login_path, path));
    };

    if !role.active {
        return Access::Redirect(ACCOUNT_INACTIVE.to_string());
    }

    if role.is_allowed(group.allowed) {
        Access::Allow
    } else {
        Access::Redirect(home_for(role).to_string())
    }
}
