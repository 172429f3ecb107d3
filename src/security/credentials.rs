use anyhow::{anyhow, Result};
use log::warn;
use std::sync::Arc;

use super::password::PasswordHasher2;
use crate::core::shared::utils::mask_email;
use crate::directory::User;
use crate::storage::{Store, StoreResult};

const DUMMY_PASSWORD: &str = "helpdesk-unknown-account";

/// Password verification against stored users. Hashing runs on the blocking
/// pool since Argon2 is deliberately slow.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn Store>,
    hasher: PasswordHasher2,
    /// Verified against when the email is unknown, so a miss costs the same
    /// Argon2 work as a wrong password.
    dummy_hash: Arc<str>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn Store>, hasher: PasswordHasher2) -> Result<Self> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self {
            store,
            hasher,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    /// `None` for an unknown email, a wrong password or an unreadable hash.
    pub async fn verify(&self, email: &str, password: &str) -> StoreResult<Option<User>> {
        let user = self.store.find_user_by_email(email).await?;
        let hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.dummy_hash.to_string(),
        };

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .unwrap_or(false);

        match user {
            Some(user) if matches => Ok(Some(user)),
            Some(_) => {
                warn!("Login rejected for {}", mask_email(email));
                Ok(None)
            }
            None => {
                warn!("Login rejected for unknown account {}", mask_email(email));
                Ok(None)
            }
        }
    }

    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| anyhow!("Password hashing task failed: {e}"))?
    }

    pub async fn set_password(&self, user: &mut User, password: &str) -> Result<()> {
        user.password_hash = self.hash_password(password).await?;
        Ok(())
    }
}
