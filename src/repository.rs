use crate::{auth::ADMIN_ROLE, config::AppConfig, models::Account};
use async_trait::async_trait;
use bcrypt::{DEFAULT_COST, hash};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// AccountRepository
///
/// Contract for the account lookups the session API needs. Handlers only see
/// `Arc<dyn AccountRepository>`, so tests can swap in their own store.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Case-insensitive lookup by email.
    async fn find_by_email(&self, email: &str) -> Option<Account>;
}

pub type AccountState = Arc<dyn AccountRepository>;

/// InMemoryAccountRepository
///
/// Accounts keyed by lowercased email behind an async `RwLock`.
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountRepository {
    /// Store holding exactly `accounts`. A later duplicate email replaces an
    /// earlier one.
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|account| (account.email.trim().to_lowercase(), account))
            .collect();
        Self {
            accounts: RwLock::new(accounts),
        }
    }

    /// seeded
    ///
    /// Repository for the running service. The development administrator
    /// exists only while the dev bypass is enabled; otherwise the store starts
    /// empty and every login is rejected. The configured password is stored
    /// as a bcrypt hash.
    pub fn seeded(config: &AppConfig) -> Self {
        if !config.dev_bypass_enabled() {
            return Self::with_accounts([]);
        }

        match hash(&config.dev_admin_password, DEFAULT_COST) {
            Ok(password_hash) => Self::with_accounts([Account {
                id: Uuid::new_v4(),
                email: config.dev_admin_email.clone(),
                password_hash,
                role: ADMIN_ROLE.to_string(),
            }]),
            Err(e) => {
                tracing::error!(error = %e, "Failed to hash the development admin password, seeding no accounts");
                Self::with_accounts([])
            }
        }
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_email(&self, email: &str) -> Option<Account> {
        self.accounts
            .read()
            .await
            .get(&email.trim().to_lowercase())
            .cloned()
    }
}
