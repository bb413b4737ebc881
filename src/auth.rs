use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, convert::Infallible};

use crate::error::TokenError;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
pub const USER_ROLE_COOKIE: &str = "userRole";

pub const ADMIN_ROLE: &str = "admin";

/// Token value the dashboard's development login stores in `accessToken`.
/// Only honoured when the development bypass is explicitly enabled.
pub const DEV_SENTINEL_TOKEN: &str = "dev-admin-token";
pub const DEV_ADMIN_ID: &str = "dev-admin";
pub const DEV_ADMIN_EMAIL: &str = "admin@gmail.com";

/// Claims
///
/// Payload of a session token. Every claim is optional: tokens minted by an
/// external issuer only need a valid signature, and `exp` is enforced when
/// present. The role may arrive as either `role` or `userRole`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (sub): the account identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(
        default,
        rename = "userRole",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_role: Option<String>,
    /// Expiration Time (exp): seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>,
    /// Issued At (iat): seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,
}

/// TokenKeys
///
/// HMAC key material derived from the configured secret. Issues HS256 and
/// accepts any HS* signature. Cheap to clone; built once at startup and
/// shared read-only by every request.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    pub fn from_secret(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // No claim is mandatory; `exp` is still checked whenever it is present.
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = true;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(TokenError::Sign)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Verify)
    }
}

/// SessionCookies
///
/// The two cookies the gate reads. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    pub access_token: Option<String>,
    pub user_role: Option<String>,
}

impl SessionCookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            access_token: cookie_value(headers, ACCESS_TOKEN_COOKIE),
            user_role: cookie_value(headers, USER_ROLE_COOKIE),
        }
    }
}

/// First non-empty value of `name` across all `Cookie` headers.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(key, value)| (key, value.trim().trim_matches('"')))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// AuthUser
///
/// The identity carried by a verified token (or by the development bypass).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Token subject; tokens from other issuers may omit it.
    pub id: Option<String>,
    pub email: Option<String>,
    /// Role claim from the token itself, independent of the role cookie.
    pub role: Option<String>,
}

/// Session
///
/// Per-request authentication result. `role` is the effective role: the
/// `userRole` cookie when present, otherwise whatever the token carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<AuthUser>,
    pub role: Option<String>,
}

impl Session {
    pub fn anonymous(role: Option<String>) -> Self {
        Self { user: None, role }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
            || self
                .user
                .as_ref()
                .is_some_and(|user| user.role.as_deref() == Some(ADMIN_ROLE))
    }

    /// resolve
    ///
    /// Derives the session from the request cookies. Verification failures
    /// are logged and downgrade to an anonymous session; an invalid token is
    /// indistinguishable from a missing one.
    pub fn resolve(cookies: &SessionCookies, keys: &TokenKeys, dev_bypass: bool) -> Self {
        let cookie_role = cookies.user_role.clone();

        let Some(token) = cookies.access_token.as_deref() else {
            return Self::anonymous(cookie_role);
        };

        if dev_bypass && token == DEV_SENTINEL_TOKEN {
            tracing::debug!("Development bypass token accepted");
            return Self {
                user: Some(AuthUser {
                    id: Some(DEV_ADMIN_ID.to_string()),
                    email: Some(DEV_ADMIN_EMAIL.to_string()),
                    role: Some(ADMIN_ROLE.to_string()),
                }),
                role: cookie_role.or_else(|| Some(ADMIN_ROLE.to_string())),
            };
        }

        match keys.verify(token) {
            Ok(claims) => {
                let role = cookie_role
                    .or_else(|| claims.role.clone())
                    .or_else(|| claims.user_role.clone());
                Self {
                    user: Some(AuthUser {
                        id: claims.sub,
                        email: claims.email,
                        role: claims.role,
                    }),
                    role,
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Session token rejected, continuing as anonymous");
                Self::anonymous(cookie_role)
            }
        }
    }
}

/// Session Extractor
///
/// Reads the session the gate attached to the request. Requests that never
/// passed through the gate are anonymous.
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Session>().cloned().unwrap_or_default())
    }
}

/// AuthUser Extractor
///
/// Rejects with 401 when the gate found no authenticated identity. Handlers
/// behind protected routes only reach this after the gate already redirected
/// anonymous browsers, so the rejection is a second line for misrouted paths.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .and_then(|session| session.user.clone())
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
