use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AuthUser, Session};

// --- Accounts ---

/// Account
///
/// A dashboard operator that can sign in through `/api/auth/login`.
/// Only ever held by the in-memory repository.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    // bcrypt hash; the plaintext is never stored.
    pub password_hash: String,
    // RBAC field: 'admin' or any lesser role.
    pub role: String,
}

// --- Session API Schemas ---

/// LoginRequest
///
/// Body of `POST /api/auth/login`, mirroring the dashboard's login form.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// FieldError
///
/// A single validation failure, keyed by the offending form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl LoginRequest {
    /// validate
    ///
    /// Applies the login form rules to trimmed input. Returns every failing
    /// field, at most one message per field.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(FieldError::new("email", "Email is required"));
        } else if email.chars().count() > 100 {
            errors.push(FieldError::new("email", "Email must be less than 100 characters"));
        } else if !is_plausible_email(email) {
            errors.push(FieldError::new("email", "Please enter a valid email address"));
        }

        let password = self.password.trim();
        let password_len = password.chars().count();
        if password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        } else if password_len < 2 {
            errors.push(FieldError::new("password", "Password must be at least 2 characters"));
        } else if password_len > 100 {
            errors.push(FieldError::new(
                "password",
                "Password must be less than 100 characters",
            ));
        } else if password.chars().any(char::is_whitespace) {
            errors.push(FieldError::new("password", "Password cannot contain spaces"));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

// local@domain.tld with no whitespace
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// SessionUser
///
/// The identity half of a `SessionView`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionUser {
    pub id: Option<String>,
    pub email: Option<String>,
}

/// SessionView
///
/// What the gate derived for a request: whether it is authenticated and
/// with which role. Returned by the session API and embedded in page views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionView {
    pub authenticated: bool,
    pub user: Option<SessionUser>,
    pub role: Option<String>,
    pub is_admin: bool,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            authenticated: session.is_authenticated(),
            user: session.user.as_ref().map(|AuthUser { id, email, .. }| SessionUser {
                id: id.clone(),
                email: email.clone(),
            }),
            role: session.role.clone(),
            is_admin: session.is_admin(),
        }
    }
}

// --- Pages ---

/// PageView
///
/// Response of every dashboard page route: the matched page and the viewer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageView {
    pub page: String,
    pub viewer: SessionView,
}
