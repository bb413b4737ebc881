use crate::{
    AppState,
    auth::{
        ACCESS_TOKEN_COOKIE, AuthUser, Claims, REFRESH_TOKEN_COOKIE, Session, SessionCookies,
        USER_ROLE_COOKIE,
    },
    config::Env,
    error::ApiError,
    gate::GateState,
    models::{LoginRequest, PageView, SessionView},
};
use axum::{
    Json,
    extract::{MatchedPath, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use chrono::{Duration, Utc};

// --- Pages ---

fn page_view(matched: &MatchedPath, session: &Session) -> PageView {
    PageView {
        page: matched.as_str().to_string(),
        viewer: SessionView::from(session),
    }
}

/// render_page
///
/// [Public / Dashboard Route] Answers with the matched page and the viewer the
/// gate derived. No auth requirement of its own.
pub async fn render_page(matched: MatchedPath, session: Session) -> Json<PageView> {
    Json(page_view(&matched, &session))
}

/// render_account_page
///
/// [Authenticated Route] Same as `render_page` but refuses requests without an
/// authenticated identity, in case a route is mounted outside the protected table.
pub async fn render_account_page(
    _user: AuthUser,
    matched: MatchedPath,
    session: Session,
) -> Json<PageView> {
    Json(page_view(&matched, &session))
}

/// render_admin_page
///
/// [Admin Route] Explicitly checks the admin role after the gate already did.
pub async fn render_admin_page(
    matched: MatchedPath,
    session: Session,
) -> Result<Json<PageView>, StatusCode> {
    if !session.is_authenticated() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if !session.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(page_view(&matched, &session)))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "not found" })),
    )
}

// --- Session API ---

fn cookie(name: &str, value: &str, max_age: Option<i64>, http_only: bool, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; SameSite=Lax");
    if let Some(seconds) = max_age {
        cookie.push_str(&format!("; Max-Age={seconds}"));
    }
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// login
///
/// [Session API] Verifies the credentials against the account repository and
/// sets the `accessToken` (signed JWT) and `userRole` cookies the gate reads.
///
/// With `rememberMe` the cookies persist for the session TTL; otherwise they
/// are browser-session cookies. The token expires after the TTL either way.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionView),
        (status = 401, description = "Invalid email or password"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(ApiError::Validation)?;

    let account = state
        .accounts
        .find_by_email(&payload.email)
        .await
        .filter(|account| {
            bcrypt::verify(payload.password.trim(), &account.password_hash).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Stored password hash could not be checked");
                false
            })
        })
        .ok_or(ApiError::InvalidCredentials)?;

    let ttl = Duration::hours(state.config.session_ttl_hours);
    let now = Utc::now();
    let claims = Claims {
        sub: Some(account.id.to_string()),
        email: Some(account.email.clone()),
        role: Some(account.role.clone()),
        user_role: None,
        iat: Some(now.timestamp() as usize),
        exp: Some((now + ttl).timestamp() as usize),
    };
    let token = state.gate.keys.issue(&claims)?;

    tracing::info!(account = %account.id, role = %account.role, "Session issued");

    let secure = state.config.env == Env::Production;
    let max_age = payload.remember_me.then(|| ttl.num_seconds());

    let session = Session {
        user: Some(AuthUser {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }),
        role: Some(account.role.clone()),
    };

    Ok((
        AppendHeaders([
            (
                SET_COOKIE,
                cookie(ACCESS_TOKEN_COOKIE, &token, max_age, true, secure),
            ),
            (
                SET_COOKIE,
                cookie(USER_ROLE_COOKIE, &account.role, max_age, false, secure),
            ),
        ]),
        Json(SessionView::from(&session)),
    ))
}

/// logout
///
/// [Session API] Expires every session cookie. Always succeeds.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 204, description = "Session cookies cleared"))
)]
pub async fn logout() -> impl IntoResponse {
    tracing::info!("Session cookies cleared");
    (
        StatusCode::NO_CONTENT,
        AppendHeaders(
            [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, USER_ROLE_COOKIE]
                .map(|name| (SET_COOKIE, cookie(name, "", Some(0), false, false))),
        ),
    )
}

/// get_session
///
/// [Session API] Resolves the caller's cookies with the gate's own rules.
/// `/api/` is never gated, so this handler does the resolution itself.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses((status = 200, description = "Current session", body = SessionView))
)]
pub async fn get_session(
    State(policy): State<GateState>,
    headers: HeaderMap,
) -> Json<SessionView> {
    let cookies = SessionCookies::from_headers(&headers);
    let session = Session::resolve(&cookies, &policy.keys, policy.dev_bypass);
    Json(SessionView::from(&session))
}
