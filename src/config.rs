use std::env;

use crate::error::ConfigError;

/// Signing secret used when `JWT_SECRET` is not set in local mode.
/// Never accepted in production.
pub const DEFAULT_JWT_SECRET: &str = "your-secret-key-change-in-production";

/// Default session lifetime: seven days, matching the dashboard's cookie expiry.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 7 * 24;

/// Upper bound for `SESSION_TTL_HOURS`: one year.
pub const MAX_SESSION_TTL_HOURS: i64 = 365 * 24;

/// AppConfig
///
/// Holds the gate's entire configuration state. Loaded once at startup and
/// immutable afterwards; it is held by `AppState` next to the gate policy.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls whether the development bypass may be enabled.
    pub env: Env,
    // HMAC secret used to sign and verify session tokens.
    pub jwt_secret: String,
    // Explicit opt-in for the sentinel-token bypass. Ignored in production.
    pub insecure_dev_auth: bool,
    // What the gate does with paths that match no route table.
    pub unclassified: UnclassifiedPolicy,
    // Lifetime of issued session tokens, in hours.
    pub session_ttl_hours: i64,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Credentials of the seeded development administrator.
    pub dev_admin_email: String,
    pub dev_admin_password: String,
}

/// Env
///
/// Defines the runtime context. Anything other than `production` is local.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// UnclassifiedPolicy
///
/// Posture for paths outside the public/protected/admin tables.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum UnclassifiedPolicy {
    /// Pass through with security headers and no auth check.
    #[default]
    Allow,
    /// Treat as protected: anonymous requests are sent to login.
    Deny,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for tests. The dev bypass is off.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            insecure_dev_auth: false,
            unclassified: UnclassifiedPolicy::Allow,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            bind_addr: "127.0.0.1:0".to_string(),
            dev_admin_email: "admin@gmail.com".to_string(),
            dev_admin_password: "admin".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Errors
    /// Fails fast in production when `JWT_SECRET` is missing or equal to the
    /// local fallback, and in any environment when a variable cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match (env, env::var("JWT_SECRET")) {
            (Env::Production, Err(_)) => return Err(ConfigError::MissingSecret("JWT_SECRET")),
            (Env::Production, Ok(secret)) if secret == DEFAULT_JWT_SECRET => {
                return Err(ConfigError::WeakSecret("JWT_SECRET"));
            }
            (_, Ok(secret)) => secret,
            (Env::Local, Err(_)) => {
                tracing::warn!("JWT_SECRET not set, falling back to the development default");
                DEFAULT_JWT_SECRET.to_string()
            }
        };

        let dev_flag = parse_flag("INSECURE_DEV_AUTH")?;
        let insecure_dev_auth = match env {
            Env::Production => {
                if dev_flag {
                    tracing::warn!("INSECURE_DEV_AUTH is ignored in production");
                }
                false
            }
            Env::Local => dev_flag,
        };

        let unclassified = match env::var("GATE_UNCLASSIFIED").as_deref() {
            Err(_) | Ok("allow") => UnclassifiedPolicy::Allow,
            Ok("deny") => UnclassifiedPolicy::Deny,
            Ok(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "GATE_UNCLASSIFIED",
                    value: other.to_string(),
                });
            }
        };

        let session_ttl_hours = match env::var("SESSION_TTL_HOURS") {
            Err(_) => DEFAULT_SESSION_TTL_HOURS,
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|hours| (1..=MAX_SESSION_TTL_HOURS).contains(hours))
                .ok_or(ConfigError::InvalidValue {
                    name: "SESSION_TTL_HOURS",
                    value: raw,
                })?,
        };

        Ok(Self {
            env,
            jwt_secret,
            insecure_dev_auth,
            unclassified,
            session_ttl_hours,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            dev_admin_email: env::var("DEV_ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@gmail.com".to_string()),
            dev_admin_password: env::var("DEV_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "admin".to_string()),
        })
    }

    /// True when the sentinel token may authenticate: local env and explicit opt-in.
    pub fn dev_bypass_enabled(&self) -> bool {
        self.env == Env::Local && self.insecure_dev_auth
    }
}

fn parse_flag(name: &'static str) -> Result<bool, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(false),
        Ok(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::InvalidValue { name, value: raw }),
        },
    }
}
