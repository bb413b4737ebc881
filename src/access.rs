//! Static route tables and path classification.

/// Routes reachable without a session.
pub const PUBLIC_ROUTES: &[&str] = &[
    "/",
    "/about",
    "/contact",
    "/pricing",
    "/login",
    "/signup",
    "/forgot-password",
    "/reset-password",
    "/verify-email",
];

/// Routes that require a session.
pub const PROTECTED_ROUTES: &[&str] = &["/dashboard", "/profile", "/settings", "/admin"];

/// Routes that additionally require the admin role. Subset of `PROTECTED_ROUTES`.
pub const ADMIN_ROUTES: &[&str] = &["/admin"];

/// Public pages that an authenticated user is bounced away from.
pub const AUTH_ENTRY_PAGES: &[&str] = &["/login", "/signup"];

/// Path prefixes that never reach classification.
pub const BYPASS_PREFIXES: &[&str] = &["/_next/", "/api/"];

pub const FAVICON_PATH: &str = "/favicon.ico";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteCategory {
    Public,
    Protected,
    AdminOnly,
    Unclassified,
}

/// True for build output, API calls, the favicon, and anything that looks
/// like a file (contains a `.`).
pub fn is_bypassed(path: &str) -> bool {
    BYPASS_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
        || path.contains('.')
        || path == FAVICON_PATH
}

/// Exact match, or `route` followed by a `/` segment boundary.
pub fn matches_route(path: &str, route: &str) -> bool {
    path == route
        || path
            .strip_prefix(route)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// RouteTable
///
/// Ordered (pattern, category) pairs evaluated first-match-wins. The default
/// table lists public routes first, then admin-only, then protected, so a
/// path in both the admin and protected sets classifies as admin-only.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<(String, RouteCategory)>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let public = PUBLIC_ROUTES.iter().map(|r| (*r, RouteCategory::Public));
        let admin = ADMIN_ROUTES.iter().map(|r| (*r, RouteCategory::AdminOnly));
        let protected = PROTECTED_ROUTES
            .iter()
            .map(|r| (*r, RouteCategory::Protected));

        Self::new(public.chain(admin).chain(protected))
    }
}

impl RouteTable {
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, RouteCategory)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(pattern, category)| (pattern.to_string(), category))
                .collect(),
        }
    }

    pub fn classify(&self, path: &str) -> RouteCategory {
        self.entries
            .iter()
            .find(|(pattern, _)| matches_route(path, pattern))
            .map(|(_, category)| *category)
            .unwrap_or(RouteCategory::Unclassified)
    }
}

/// Login and signup: authenticated users are sent to the dashboard instead.
pub fn is_auth_entry_page(path: &str) -> bool {
    AUTH_ENTRY_PAGES.contains(&path)
}
