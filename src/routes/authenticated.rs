use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Dashboard sections of the admin front end. They sit outside the route
/// tables, so the gate's unclassified posture decides who reaches them.
pub const DASHBOARD_SECTIONS: &[&str] = &[
    "/overview",
    "/users",
    "/users/{id}",
    "/projects",
    "/projects/{id}",
    "/donations",
    "/upload",
    "/upload/{id}",
    "/upload/book",
    "/upload/content",
    "/leader-request",
    "/leader-request/{id}",
    "/privacy-policy",
];

/// Authenticated Router Module
///
/// `/dashboard`, `/profile` and `/settings` require a session; the gate has
/// already redirected anonymous browsers, and `AuthUser` rejects anything
/// that slipped past it.
pub fn authenticated_routes() -> Router<AppState> {
    let router = Router::<AppState>::new()
        .route("/dashboard", get(handlers::render_account_page))
        .route("/profile", get(handlers::render_account_page))
        .route("/settings", get(handlers::render_account_page));

    DASHBOARD_SECTIONS.iter().fold(router, |router, path| {
        router.route(path, get(handlers::render_page))
    })
}
