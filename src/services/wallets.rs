// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::data::schema::TransactionRecord;
use crate::data::store::WalletStore;
use crate::domain::constants::WALLET_NAME_MAX_LEN;
use crate::domain::model::{UserId, Wallet, WalletSummary};
use crate::services::swap::signer::{KeyError, private_key_hex, validate_private_key};
use alloy::signers::local::PrivateKeySigner;
use std::sync::Arc;

/// Wallet management on top of the store: creation, import, switching.
#[derive(Clone)]
pub struct WalletService {
    store: Arc<dyn WalletStore>,
}

/// A freshly generated wallet. The key is shown to the user once.
#[derive(Debug)]
pub struct CreatedWallet {
    pub summary: WalletSummary,
    pub private_key: String,
}

pub fn validate_wallet_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    let len = name.chars().count();
    if len == 0 || len > WALLET_NAME_MAX_LEN {
        return Err(AppError::Validation {
            field: "wallet_name".into(),
            message: format!("must be between 1 and {WALLET_NAME_MAX_LEN} characters"),
        });
    }
    Ok(name.to_string())
}

impl WalletService {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self { store }
    }

    pub async fn register_user(&self, user_id: UserId, username: &str) -> Result<(), AppError> {
        self.store.ensure_user(user_id, username).await
    }

    pub async fn create_wallet(&self, user_id: UserId, name: &str) -> Result<CreatedWallet, AppError> {
        let name = validate_wallet_name(name)?;
        let signer = PrivateKeySigner::random();
        let private_key = private_key_hex(&signer);
        let summary = self.persist(user_id, &name, &signer, &private_key).await?;
        tracing::info!(target: "wallets", user_id, wallet_id = summary.id, address = %summary.address, "Wallet created");
        Ok(CreatedWallet {
            summary,
            private_key,
        })
    }

    pub async fn import_wallet(
        &self,
        user_id: UserId,
        name: &str,
        private_key: &str,
    ) -> Result<WalletSummary, AppError> {
        let name = validate_wallet_name(name)?;
        let signer = validate_private_key(private_key).map_err(|e: KeyError| AppError::Validation {
            field: "private_key".into(),
            message: e.to_string(),
        })?;
        // Store the normalized form, never the raw message text.
        let normalized = private_key_hex(&signer);
        let summary = self.persist(user_id, &name, &signer, &normalized).await?;
        tracing::info!(target: "wallets", user_id, wallet_id = summary.id, address = %summary.address, "Wallet imported");
        Ok(summary)
    }

    async fn persist(
        &self,
        user_id: UserId,
        name: &str,
        signer: &PrivateKeySigner,
        private_key: &str,
    ) -> Result<WalletSummary, AppError> {
        let address = signer.address();
        let id = self.store.save(user_id, name, address, private_key).await?;
        let is_active = self
            .store
            .get(user_id)
            .await?
            .is_some_and(|w| w.id == id);
        Ok(WalletSummary {
            id,
            name: name.to_string(),
            address,
            is_active,
        })
    }

    pub async fn list(&self, user_id: UserId) -> Result<Vec<WalletSummary>, AppError> {
        self.store.list(user_id).await
    }

    pub async fn find(&self, user_id: UserId, wallet_id: i64) -> Result<Option<WalletSummary>, AppError> {
        Ok(self
            .list(user_id)
            .await?
            .into_iter()
            .find(|w| w.id == wallet_id))
    }

    pub async fn active(&self, user_id: UserId) -> Result<Option<Wallet>, AppError> {
        self.store.get(user_id).await
    }

    pub async fn history(&self, user_id: UserId, limit: i64) -> Result<Vec<TransactionRecord>, AppError> {
        self.store.history(user_id, limit).await
    }

    /// Make `wallet_id` the active wallet. `None` when the user does not own it.
    pub async fn switch(&self, user_id: UserId, wallet_id: i64) -> Result<Option<WalletSummary>, AppError> {
        if !self.store.set_active(user_id, wallet_id).await? {
            return Ok(None);
        }
        self.find(user_id, wallet_id).await
    }
}
