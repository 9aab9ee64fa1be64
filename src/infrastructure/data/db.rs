// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::data::schema::{TransactionRecord, WalletRow};
use crate::domain::model::{SwapResult, SwapStatus, UserId, Wallet, WalletSummary};
use alloy::primitives::{Address, B256};
use sqlx::{
    Pool, Row, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Initialization(format!("DB Connect failed: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Initialization(format!("DB Connect failed: {}", e)))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Initialization(format!("DB Migration failed: {}", e)))?;

        Ok(Self { pool })
    }

    pub async fn ensure_user(&self, user_id: UserId, username: &str) -> Result<(), AppError> {
        sqlx::query("INSERT OR IGNORE INTO users (user_id, username) VALUES (?, ?)")
            .bind(user_id)
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("User insert failed: {}", e)))?;
        Ok(())
    }

    /// Store a wallet. The user's first wallet becomes the active one.
    pub async fn create_wallet(
        &self,
        user_id: UserId,
        name: &str,
        address: Address,
        private_key: &str,
    ) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO users (user_id, username) VALUES (?, NULL)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM wallets WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        let is_active = existing == 0;

        let row = sqlx::query(
            r#"
            INSERT INTO wallets (user_id, wallet_name, wallet_address, private_key, is_active)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(format!("{address:#x}"))
        .bind(private_key)
        .bind(is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Wallet insert failed: {}", e)))?;
        let wallet_id: i64 = row.get("id");

        if is_active {
            sqlx::query("UPDATE users SET active_wallet_id = ? WHERE user_id = ?")
                .bind(wallet_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(target: "db", user_id, wallet_id, active = is_active, "Wallet stored");
        Ok(wallet_id)
    }

    pub async fn list_wallets(&self, user_id: UserId) -> Result<Vec<WalletSummary>, AppError> {
        let rows = sqlx::query_as::<_, WalletRow>(
            r#"
            SELECT id, user_id, wallet_name, wallet_address, private_key, is_active
            FROM wallets WHERE user_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Wallet list failed: {}", e)))?;

        rows.into_iter().map(WalletRow::into_summary).collect()
    }

    pub async fn active_wallet(&self, user_id: UserId) -> Result<Option<Wallet>, AppError> {
        let row = sqlx::query_as::<_, WalletRow>(
            r#"
            SELECT w.id, w.user_id, w.wallet_name, w.wallet_address, w.private_key, w.is_active
            FROM wallets w
            JOIN users u ON w.id = u.active_wallet_id
            WHERE u.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Active wallet load failed: {}", e)))?;

        row.map(WalletRow::into_wallet).transpose()
    }

    /// Switch the active wallet. Returns `false` when the wallet is not the
    /// user's.
    pub async fn set_active_wallet(
        &self,
        user_id: UserId,
        wallet_id: i64,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<i64> =
            sqlx::query_scalar("SELECT id FROM wallets WHERE id = ? AND user_id = ?")
                .bind(wallet_id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            return Ok(false);
        }

        sqlx::query("UPDATE users SET active_wallet_id = ? WHERE user_id = ?")
            .bind(wallet_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE wallets SET is_active = (id = ?) WHERE user_id = ?")
            .bind(wallet_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    pub async fn log_transaction(&self, result: &SwapResult, tx_type: &str) -> Result<i64, AppError> {
        let tx_hash = format!("{:#x}", result.tx_hash);
        let row = sqlx::query(
            r#"
            INSERT INTO transactions (user_id, wallet_id, tx_hash, tx_type, amount, token_address, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(result.user_id)
        .bind(result.wallet_id)
        .bind(&tx_hash)
        .bind(tx_type)
        .bind(result.amount.to_string())
        .bind(format!("{:#x}", result.token_address))
        .bind(result.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Transaction insert failed for {tx_hash}: {e}")))?;
        let id: i64 = row.get("id");

        Ok(id)
    }

    /// Move a pending transaction to a terminal status. Rows that already left
    /// `pending` are left untouched and `false` is returned.
    pub async fn update_status(&self, tx_hash: B256, status: SwapStatus) -> Result<bool, AppError> {
        let res = sqlx::query(
            r#"
            UPDATE transactions
            SET status = ?, updated_at = CURRENT_TIMESTAMP
            WHERE tx_hash = ? AND status = 'pending'
            "#,
        )
        .bind(status.as_str())
        .bind(format!("{tx_hash:#x}"))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Status update failed: {}", e)))?;

        Ok(res.rows_affected() > 0)
    }

    pub async fn recent_transactions(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<TransactionRecord>, AppError> {
        let recs = sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT id, user_id, wallet_id, tx_hash, tx_type, amount, token_address, status, created_at
            FROM transactions
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit.max(1))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("History query failed: {}", e)))?;

        Ok(recs)
    }
}
