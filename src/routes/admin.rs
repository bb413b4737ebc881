use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// The gate only lets admins through to `/admin`; the handler repeats the
/// role check and answers 403 for anything else.
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin", get(handlers::render_admin_page))
}
