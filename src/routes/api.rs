use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Session API Router
///
/// Lives under `/api/`, which the gate bypasses, so every handler here works
/// for anonymous callers.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // POST /api/auth/login
        // Validates credentials and sets the accessToken / userRole cookies.
        .route("/api/auth/login", post(handlers::login))
        // POST /api/auth/logout
        // Expires the session cookies.
        .route("/api/auth/logout", post(handlers::logout))
        // GET /api/auth/session
        // Reports what the gate would derive from the caller's cookies.
        .route("/api/auth/session", get(handlers::get_session))
}
