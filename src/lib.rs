use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Request gate: route tables, token handling, and the middleware itself.
pub mod access;
pub mod auth;
pub mod gate;

// Session API and page handlers with their supporting types.
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

// Page routers grouped by access tier.
pub mod routes;
use routes::{admin, api, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use gate::{GatePolicy, GateState};
pub use repository::{AccountState, InMemoryAccountRepository};

/// ApiDoc
///
/// OpenAPI document for the session API, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::login, handlers::logout, handlers::get_session),
    components(
        schemas(
            models::LoginRequest, models::FieldError, models::SessionView,
            models::SessionUser, models::PageView,
        )
    ),
    tags(
        (name = "walking-witness-gate", description = "Walking Witness dashboard session API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single container for everything handlers and the gate need. Cloned per
/// request; all members are cheap `Arc`s or plain config.
#[derive(Clone)]
pub struct AppState {
    /// Account lookups for the login endpoint.
    pub accounts: AccountState,
    /// Immutable gate policy: route table, token keys, bypass flags.
    pub gate: GateState,
    /// The loaded configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state from a loaded configuration, seeding the account store.
    pub fn from_config(config: AppConfig) -> Self {
        Self {
            accounts: Arc::new(InMemoryAccountRepository::seeded(&config)),
            gate: Arc::new(GatePolicy::from_config(&config)),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// Lets the session handler take only the gate policy.
impl FromRef<AppState> for GateState {
    fn from_ref(app_state: &AppState) -> GateState {
        app_state.gate.clone()
    }
}

/// create_router
///
/// Assembles the page and API routers and wraps all of them, fallback
/// included, in the request gate. Observability layers sit outside the gate
/// so redirects are traced too.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .merge(admin::admin_routes())
        .merge(api::api_routes())
        .fallback(handlers::not_found)
        // The gate must see every request, so it is layered after the fallback.
        .layer(middleware::from_fn_with_state(
            state.gate.clone(),
            gate::gate_middleware,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer` carrying method, URI and the `x-request-id`, so
/// every gate log line for one request is correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
