// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::data::db::Database;
use crate::data::schema::TransactionRecord;
use crate::domain::model::{SwapResult, SwapStatus, UserId, Wallet, WalletSummary};
use alloy::primitives::{Address, B256};
use async_trait::async_trait;

/// Persistence seam used by the wallet screens, the swap pipeline and the
/// confirmation tracker.
#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn ensure_user(&self, user_id: UserId, username: &str) -> Result<(), AppError>;

    /// Active wallet of the user, if any.
    async fn get(&self, user_id: UserId) -> Result<Option<Wallet>, AppError>;

    async fn save(
        &self,
        user_id: UserId,
        name: &str,
        address: Address,
        private_key: &str,
    ) -> Result<i64, AppError>;

    async fn list(&self, user_id: UserId) -> Result<Vec<WalletSummary>, AppError>;

    /// `false` when the user does not own `wallet_id`.
    async fn set_active(&self, user_id: UserId, wallet_id: i64) -> Result<bool, AppError>;

    /// Newest first.
    async fn history(&self, user_id: UserId, limit: i64) -> Result<Vec<TransactionRecord>, AppError>;

    async fn append_transaction(&self, result: &SwapResult) -> Result<(), AppError>;

    /// Returns `false` when the transaction was already terminal or unknown.
    async fn update_status(&self, tx_hash: B256, status: SwapStatus) -> Result<bool, AppError>;
}

#[async_trait]
impl WalletStore for Database {
    async fn ensure_user(&self, user_id: UserId, username: &str) -> Result<(), AppError> {
        Database::ensure_user(self, user_id, username).await
    }

    async fn get(&self, user_id: UserId) -> Result<Option<Wallet>, AppError> {
        self.active_wallet(user_id).await
    }

    async fn save(
        &self,
        user_id: UserId,
        name: &str,
        address: Address,
        private_key: &str,
    ) -> Result<i64, AppError> {
        self.create_wallet(user_id, name, address, private_key).await
    }

    async fn list(&self, user_id: UserId) -> Result<Vec<WalletSummary>, AppError> {
        self.list_wallets(user_id).await
    }

    async fn set_active(&self, user_id: UserId, wallet_id: i64) -> Result<bool, AppError> {
        self.set_active_wallet(user_id, wallet_id).await
    }

    async fn history(&self, user_id: UserId, limit: i64) -> Result<Vec<TransactionRecord>, AppError> {
        self.recent_transactions(user_id, limit).await
    }

    async fn append_transaction(&self, result: &SwapResult) -> Result<(), AppError> {
        self.log_transaction(result, "swap").await.map(|_| ())
    }

    async fn update_status(&self, tx_hash: B256, status: SwapStatus) -> Result<bool, AppError> {
        Database::update_status(self, tx_hash, status).await
    }
}
