use crate::{AppState, access::PUBLIC_ROUTES, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// One page route per entry of the public table. The gate still runs for
/// these paths: it bounces signed-in users away from `/login` and `/signup`.
pub fn public_routes() -> Router<AppState> {
    PUBLIC_ROUTES
        .iter()
        .fold(Router::new(), |router, path| {
            router.route(path, get(handlers::render_page))
        })
        // GET /health
        // Liveness probe for load balancers. Unclassified, so never redirected.
        .route("/health", get(|| async { "ok" }))
}
