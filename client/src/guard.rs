//! Role-based route guard
//!
//! Routes split into a public section and one dashboard per role. The guard
//! only looks at the cached user; it never calls the server.

use crate::session;
use crate::types::{Role, User};
use marketplace_core::environment::SessionStorage;

/// A group of routes sharing one access rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Home, sign-in, sign-up, password recovery, catalogue
    Public,
    /// `/buyer-dashboard/*`
    BuyerDashboard,
    /// `/seller-dashboard/*`
    SellerDashboard,
}

impl Section {
    /// Section a route path belongs to
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let first = path.trim_start_matches('/').split('/').next().unwrap_or_default();
        match first {
            "buyer-dashboard" => Self::BuyerDashboard,
            "seller-dashboard" => Self::SellerDashboard,
            _ => Self::Public,
        }
    }

    /// Role a section requires, `None` for public routes
    #[must_use]
    pub const fn required_role(self) -> Option<Role> {
        match self {
            Self::Public => None,
            Self::BuyerDashboard => Some(Role::Buyer),
            Self::SellerDashboard => Some(Role::Seller),
        }
    }
}

/// Guard decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Render the route
    Allowed,
    /// Nobody is signed in; redirect to sign-in
    SignInRequired,
    /// Signed in with the wrong role (or none)
    Forbidden,
}

/// Decide access to `section` for `user`
#[must_use]
pub fn guard(section: Section, user: Option<&User>) -> Access {
    let Some(required) = section.required_role() else {
        return Access::Allowed;
    };
    match user {
        None => Access::SignInRequired,
        Some(user) if user.role() == Some(required) => Access::Allowed,
        Some(_) => Access::Forbidden,
    }
}

/// Decide access to `section` for the user cached in `storage`
#[must_use]
pub fn guard_session(section: Section, storage: &dyn SessionStorage) -> Access {
    let user = session::cached_user(storage);
    let access = guard(section, user.as_ref());
    if access != Access::Allowed {
        tracing::debug!(?section, ?access, "Route guarded");
    }
    access
}
