use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::json;
use walking_witness_gate::{
    access::RouteTable,
    auth::{Claims, DEV_SENTINEL_TOKEN, SessionCookies, TokenKeys},
    config::{AppConfig, Env, UnclassifiedPolicy},
    gate::{GateDecision, GatePolicy, RedirectReason, evaluate, login_redirect},
};

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn create_token(secret: &str, role: Option<&str>, exp_offset: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: Some("user-1".to_string()),
        email: Some("leader@walkingwitness.org".to_string()),
        role: role.map(str::to_string),
        user_role: None,
        iat: Some(now as usize),
        exp: Some((now + exp_offset) as usize),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn sign_payload(algorithm: Algorithm, payload: &serde_json::Value) -> String {
    encode(
        &Header::new(algorithm),
        payload,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

fn policy() -> GatePolicy {
    GatePolicy {
        routes: RouteTable::default(),
        keys: TokenKeys::from_secret(TEST_JWT_SECRET),
        dev_bypass: false,
        unclassified: UnclassifiedPolicy::Allow,
    }
}

fn policy_for(env: Env, insecure_dev_auth: bool) -> GatePolicy {
    let config = AppConfig {
        env,
        insecure_dev_auth,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };
    GatePolicy::from_config(&config)
}

fn cookies(token: Option<String>, role: Option<&str>) -> SessionCookies {
    SessionCookies {
        access_token: token,
        user_role: role.map(str::to_string),
    }
}

fn anonymous() -> SessionCookies {
    SessionCookies::default()
}

fn member() -> SessionCookies {
    cookies(Some(create_token(TEST_JWT_SECRET, Some("leader"), 3600)), None)
}

fn admin() -> SessionCookies {
    cookies(Some(create_token(TEST_JWT_SECRET, Some("admin"), 3600)), None)
}

fn assert_redirect(decision: GateDecision, expected: &str, expected_reason: RedirectReason) {
    match decision {
        GateDecision::Redirect { location, reason } => {
            assert_eq!(location, expected);
            assert_eq!(reason, expected_reason);
        }
        other => panic!("expected redirect to {expected}, got {other:?}"),
    }
}

fn assert_allowed(decision: &GateDecision) {
    assert!(
        matches!(decision, GateDecision::Allow(_)),
        "expected allow, got {decision:?}"
    );
}

// --- Tests ---

#[test]
fn test_decisions_are_repeatable() {
    let policy = policy();
    for (path, jar) in [
        ("/dashboard", anonymous()),
        ("/dashboard", member()),
        ("/admin", member()),
        ("/login", admin()),
        ("/overview", anonymous()),
    ] {
        assert_eq!(evaluate(path, &jar, &policy), evaluate(path, &jar, &policy));
    }
}

#[test]
fn test_assets_bypass_even_for_protected_prefixes() {
    let policy = policy();
    for path in [
        "/_next/static/app.js",
        "/favicon.ico",
        "/admin/logo.png",
        "/dashboard/export.csv",
        "/api/auth/session",
    ] {
        assert_eq!(evaluate(path, &anonymous(), &policy), GateDecision::Bypass, "{path}");
    }
}

#[test]
fn test_signed_in_user_is_sent_from_login_to_dashboard() {
    let policy = policy();
    assert_redirect(
        evaluate("/login", &member(), &policy),
        "/dashboard",
        RedirectReason::AlreadySignedIn,
    );
    assert_redirect(
        evaluate("/signup", &member(), &policy),
        "/dashboard",
        RedirectReason::AlreadySignedIn,
    );
}

#[test]
fn test_public_pages_allow_everyone() {
    let policy = policy();
    assert_allowed(&evaluate("/login", &anonymous(), &policy));
    assert_allowed(&evaluate("/about", &member(), &policy));
    assert_allowed(&evaluate("/", &admin(), &policy));
}

#[test]
fn test_protected_page_without_token_redirects_to_login() {
    assert_redirect(
        evaluate("/dashboard", &anonymous(), &policy()),
        "/login?redirect=%2Fdashboard",
        RedirectReason::Unauthenticated,
    );
}

#[test]
fn test_login_redirect_keeps_nested_path() {
    assert_eq!(
        login_redirect("/settings/security"),
        "/login?redirect=%2Fsettings%2Fsecurity"
    );
}

#[test]
fn test_protected_page_with_token_is_allowed() {
    let decision = evaluate("/profile", &member(), &policy());
    match decision {
        GateDecision::Allow(session) => {
            assert!(session.is_authenticated());
            assert_eq!(session.role.as_deref(), Some("leader"));
            assert!(!session.is_admin());
        }
        other => panic!("expected allow, got {other:?}"),
    }
}

#[test]
fn test_admin_page_rejects_non_admin() {
    assert_redirect(
        evaluate("/admin", &member(), &policy()),
        "/dashboard",
        RedirectReason::Forbidden,
    );
}

#[test]
fn test_admin_page_allows_admin() {
    match evaluate("/admin", &admin(), &policy()) {
        GateDecision::Allow(session) => assert!(session.is_admin()),
        other => panic!("expected allow, got {other:?}"),
    }
}

#[test]
fn test_admin_role_from_user_role_claim() {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: Some("user-2".to_string()),
        email: None,
        role: None,
        user_role: Some("admin".to_string()),
        iat: Some(now as usize),
        exp: Some((now + 3600) as usize),
    };
    let token = TokenKeys::from_secret(TEST_JWT_SECRET).issue(&claims).unwrap();

    assert_allowed(&evaluate("/admin", &cookies(Some(token), None), &policy()));
}

#[test]
fn test_admin_allowed_with_minimal_externally_issued_tokens() {
    let now = Utc::now().timestamp();
    let tokens = [
        // role and exp only: no subject, no issued-at
        sign_payload(Algorithm::HS256, &json!({ "role": "admin", "exp": now + 3600 })),
        sign_payload(
            Algorithm::HS256,
            &json!({ "sub": "user-3", "role": "admin", "exp": now + 3600 }),
        ),
        // no expiry at all
        sign_payload(Algorithm::HS256, &json!({ "sub": "user-3", "role": "admin" })),
        sign_payload(
            Algorithm::HS512,
            &json!({
                "sub": "user-3",
                "email": "leader@walkingwitness.org",
                "role": "admin",
                "iat": now,
                "exp": now + 3600,
            }),
        ),
        sign_payload(Algorithm::HS384, &json!({ "userRole": "admin", "exp": now + 3600 })),
    ];

    for token in tokens {
        match evaluate("/admin", &cookies(Some(token.clone()), None), &policy()) {
            GateDecision::Allow(session) => assert!(session.is_admin(), "{token}"),
            other => panic!("expected allow for {token}, got {other:?}"),
        }
    }
}

#[test]
fn test_minimal_token_still_rejected_when_expired() {
    let now = Utc::now().timestamp();
    let token = sign_payload(Algorithm::HS256, &json!({ "role": "admin", "exp": now - 3600 }));

    assert_redirect(
        evaluate("/admin", &cookies(Some(token), None), &policy()),
        "/login?redirect=%2Fadmin",
        RedirectReason::Unauthenticated,
    );
}

#[test]
fn test_role_cookie_takes_precedence_over_claim() {
    let token = create_token(TEST_JWT_SECRET, Some("leader"), 3600);
    let jar = cookies(Some(token), Some("admin"));

    match evaluate("/admin/requests", &jar, &policy()) {
        GateDecision::Allow(session) => assert_eq!(session.role.as_deref(), Some("admin")),
        other => panic!("expected allow, got {other:?}"),
    }
}

#[test]
fn test_role_cookie_alone_does_not_authenticate() {
    assert_redirect(
        evaluate("/admin", &cookies(None, Some("admin")), &policy()),
        "/login?redirect=%2Fadmin",
        RedirectReason::Unauthenticated,
    );
}

#[test]
fn test_unclassified_paths_allowed_by_default() {
    assert_allowed(&evaluate("/overview", &anonymous(), &policy()));
    assert_allowed(&evaluate("/administrator", &anonymous(), &policy()));
}

#[test]
fn test_unclassified_paths_protected_under_deny_posture() {
    let policy = GatePolicy {
        unclassified: UnclassifiedPolicy::Deny,
        ..policy()
    };
    assert_redirect(
        evaluate("/users/7", &anonymous(), &policy),
        "/login?redirect=%2Fusers%2F7",
        RedirectReason::Unauthenticated,
    );
    assert_allowed(&evaluate("/users/7", &member(), &policy));
    assert_allowed(&evaluate("/about", &anonymous(), &policy));
}

// --- Development Bypass ---

#[test]
fn test_dev_sentinel_grants_admin_when_enabled_locally() {
    let policy = policy_for(Env::Local, true);
    let jar = cookies(Some(DEV_SENTINEL_TOKEN.to_string()), None);

    match evaluate("/admin", &jar, &policy) {
        GateDecision::Allow(session) => {
            assert!(session.is_admin());
            assert_eq!(session.role.as_deref(), Some("admin"));
            let user = session.user.unwrap();
            assert_eq!(user.email.as_deref(), Some("admin@gmail.com"));
        }
        other => panic!("expected allow, got {other:?}"),
    }
}

#[test]
fn test_dev_sentinel_rejected_in_production() {
    // Even with the opt-in flag set, production never honours the sentinel.
    let policy = policy_for(Env::Production, true);
    let jar = cookies(Some(DEV_SENTINEL_TOKEN.to_string()), None);

    assert_redirect(
        evaluate("/admin", &jar, &policy),
        "/login?redirect=%2Fadmin",
        RedirectReason::Unauthenticated,
    );
}

#[test]
fn test_dev_sentinel_rejected_without_opt_in() {
    let policy = policy_for(Env::Local, false);
    let jar = cookies(Some(DEV_SENTINEL_TOKEN.to_string()), None);

    assert_redirect(
        evaluate("/dashboard", &jar, &policy),
        "/login?redirect=%2Fdashboard",
        RedirectReason::Unauthenticated,
    );
}

// --- Token Failures ---

#[test]
fn test_bad_tokens_behave_like_no_token() {
    let policy = policy();
    let bad_tokens = [
        "not-a-jwt".to_string(),
        create_token("some-other-secret", Some("admin"), 3600),
        create_token(TEST_JWT_SECRET, Some("admin"), -3600),
    ];

    for token in bad_tokens {
        for path in ["/", "/login", "/dashboard", "/admin", "/overview"] {
            assert_eq!(
                evaluate(path, &cookies(Some(token.clone()), None), &policy),
                evaluate(path, &anonymous(), &policy),
                "{path} with {token}"
            );
        }
    }
}

#[test]
fn test_production_admin_without_cookies_redirects_to_login() {
    let policy = policy_for(Env::Production, false);
    assert_redirect(
        evaluate("/admin", &anonymous(), &policy),
        "/login?redirect=%2Fadmin",
        RedirectReason::Unauthenticated,
    );
}
