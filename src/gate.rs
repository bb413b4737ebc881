use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::{
    access::{self, RouteCategory, RouteTable},
    auth::{Session, SessionCookies, TokenKeys},
    config::{AppConfig, UnclassifiedPolicy},
};

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Headers attached to every response the gate lets through.
pub const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
];

/// GatePolicy
///
/// Everything the gate decides with. Immutable after startup and shared
/// through `GateState`, so concurrent requests never contend.
#[derive(Clone)]
pub struct GatePolicy {
    pub routes: RouteTable,
    pub keys: TokenKeys,
    pub dev_bypass: bool,
    pub unclassified: UnclassifiedPolicy,
}

pub type GateState = Arc<GatePolicy>;

impl GatePolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            routes: RouteTable::default(),
            keys: TokenKeys::from_secret(&config.jwt_secret),
            dev_bypass: config.dev_bypass_enabled(),
            unclassified: config.unclassified,
        }
    }
}

/// Why a request was redirected. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    AlreadySignedIn,
    Unauthenticated,
    Forbidden,
}

/// GateDecision
///
/// Outcome of `evaluate` for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Asset-like path: forwarded untouched, no session, no headers.
    Bypass,
    /// Forwarded with the derived session and the security headers.
    Allow(Session),
    /// Answered by the gate with a temporary redirect.
    Redirect {
        location: String,
        reason: RedirectReason,
    },
}

impl GateDecision {
    fn redirect(location: impl Into<String>, reason: RedirectReason) -> Self {
        GateDecision::Redirect {
            location: location.into(),
            reason,
        }
    }
}

/// `/login?redirect=<path>` with the path form-urlencoded.
pub fn login_redirect(path: &str) -> String {
    let query = serde_urlencoded::to_string([("redirect", path)])
        .unwrap_or_else(|_| String::from("redirect=%2F"));
    format!("{LOGIN_PATH}?{query}")
}

/// evaluate
///
/// The gate's decision as a pure function of (path, cookies, policy).
pub fn evaluate(path: &str, cookies: &SessionCookies, policy: &GatePolicy) -> GateDecision {
    if access::is_bypassed(path) {
        return GateDecision::Bypass;
    }

    let session = Session::resolve(cookies, &policy.keys, policy.dev_bypass);

    tracing::debug!(
        path,
        authenticated = session.is_authenticated(),
        role = session.role.as_deref().unwrap_or("none"),
        admin = session.is_admin(),
        "Resolved session"
    );

    let category = match policy.routes.classify(path) {
        RouteCategory::Unclassified if policy.unclassified == UnclassifiedPolicy::Deny => {
            RouteCategory::Protected
        }
        category => category,
    };

    match category {
        RouteCategory::Public => {
            if session.is_authenticated() && access::is_auth_entry_page(path) {
                GateDecision::redirect(DASHBOARD_PATH, RedirectReason::AlreadySignedIn)
            } else {
                GateDecision::Allow(session)
            }
        }
        RouteCategory::Protected | RouteCategory::AdminOnly if !session.is_authenticated() => {
            GateDecision::redirect(login_redirect(path), RedirectReason::Unauthenticated)
        }
        RouteCategory::AdminOnly if !session.is_admin() => {
            GateDecision::redirect(DASHBOARD_PATH, RedirectReason::Forbidden)
        }
        RouteCategory::Protected | RouteCategory::AdminOnly | RouteCategory::Unclassified => {
            GateDecision::Allow(session)
        }
    }
}

pub fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in SECURITY_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
}

/// gate_middleware
///
/// Runs `evaluate` before routing. Allowed requests carry their `Session`
/// in the extensions so handlers can read it through the extractors.
pub async fn gate_middleware(
    State(policy): State<GateState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let cookies = SessionCookies::from_headers(request.headers());

    match evaluate(&path, &cookies, &policy) {
        GateDecision::Bypass => next.run(request).await,
        GateDecision::Redirect { location, reason } => {
            tracing::info!(path = %path, location = %location, ?reason, "Gate redirect");
            Redirect::temporary(&location).into_response()
        }
        GateDecision::Allow(session) => {
            request.extensions_mut().insert(session);
            let mut response = next.run(request).await;
            apply_security_headers(response.headers_mut());
            response
        }
    }
}
