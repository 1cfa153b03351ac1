//! Route table and navigation guard
//!
//! Every protected screen is gated by the same synchronous check against the
//! local session: a token must be stored and the decoded role must be admin.
//! No request is made. A stale or forged role only gets past this gate until
//! the next API call, which the backend rejects.

use crate::session::Session;

/// Notice shown when a signed-in account lacks the admin role
pub const ACCESS_DENIED_NOTICE: &str = "Bạn không có quyền truy cập trang admin!";

/// Console screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Products,
    Categories,
    Orders,
    Users,
    Announcements,
}

impl Route {
    /// Protected screens in navigation-bar order
    pub const PROTECTED: [Route; 6] = [
        Route::Dashboard,
        Route::Products,
        Route::Categories,
        Route::Orders,
        Route::Users,
        Route::Announcements,
    ];

    /// Screen opened after a successful login and for the empty path
    pub const DEFAULT: Route = Route::Dashboard;

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::Products => "/products",
            Route::Categories => "/categories",
            Route::Orders => "/orders",
            Route::Users => "/users",
            Route::Announcements => "/announcements",
        }
    }

    /// Resolve a path; the empty path maps to [`Route::DEFAULT`]
    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Some(Route::DEFAULT);
        }
        std::iter::once(Route::Login)
            .chain(Route::PROTECTED)
            .find(|route| route.path() == trimmed)
    }

    pub fn is_protected(self) -> bool {
        self != Route::Login
    }

    /// Label shown in the navigation bar
    pub fn title(self) -> &'static str {
        match self {
            Route::Login => "Đăng nhập",
            Route::Dashboard => "Dashboard",
            Route::Products => "Sản phẩm",
            Route::Categories => "Danh mục",
            Route::Orders => "Đơn hàng",
            Route::Users => "Người dùng",
            Route::Announcements => "Thông báo",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Result of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect {
        to: Route,
        /// Blocking message to show before redirecting
        notice: Option<&'static str>,
    },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// Synchronous access check for protected screens
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    pub fn check<A>(&self, session: &Session<A>, route: Route) -> GuardDecision {
        if !route.is_protected() {
            return GuardDecision::Allow;
        }

        if !session.has_token() {
            tracing::debug!("No token, redirecting {} to login", route);
            return GuardDecision::Redirect {
                to: Route::Login,
                notice: None,
            };
        }

        if !session.is_admin() {
            tracing::info!(
                "Role {:?} may not open {}, redirecting to login",
                session.role().get(),
                route
            );
            return GuardDecision::Redirect {
                to: Route::Login,
                notice: Some(ACCESS_DENIED_NOTICE),
            };
        }

        GuardDecision::Allow
    }
}

/// Current screen plus the guard applied to every move
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Route,
    guard: RouteGuard,
    notice: Option<&'static str>,
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            current: Route::Login,
            guard: RouteGuard,
            notice: None,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// Try to move to `target`, applying the guard.
    ///
    /// Returns the screen actually shown afterwards.
    pub fn navigate<A>(&mut self, session: &Session<A>, target: Route) -> Route {
        match self.guard.check(session, target) {
            GuardDecision::Allow => self.current = target,
            GuardDecision::Redirect { to, notice } => {
                self.current = to;
                if notice.is_some() {
                    self.notice = notice;
                }
            }
        }
        self.current
    }

    /// Resolve `path` and navigate to it. Unknown paths leave the screen as is.
    pub fn navigate_path<A>(&mut self, session: &Session<A>, path: &str) -> Option<Route> {
        let route = Route::from_path(path)?;
        Some(self.navigate(session, route))
    }

    /// Blocking notice awaiting acknowledgement
    pub fn notice(&self) -> Option<&'static str> {
        self.notice
    }

    /// Acknowledge the pending notice
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}
