// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::AppError;
use crate::domain::model::{SwapStatus, Wallet, WalletSummary};
use alloy::primitives::Address;
use chrono::NaiveDateTime;
use sqlx::FromRow;
use std::str::FromStr;

#[derive(Debug, FromRow)]
pub struct WalletRow {
    pub id: i64,
    pub user_id: i64,
    pub wallet_name: String,
    pub wallet_address: String,
    pub private_key: String,
    pub is_active: bool,
}

impl WalletRow {
    fn address(&self) -> Result<Address, AppError> {
        Address::from_str(&self.wallet_address).map_err(|e| {
            AppError::Database(format!(
                "wallet {} has a corrupt address {}: {e}",
                self.id, self.wallet_address
            ))
        })
    }

    pub fn into_wallet(self) -> Result<Wallet, AppError> {
        let address = self.address()?;
        Ok(Wallet {
            id: self.id,
            name: self.wallet_name,
            address,
            private_key: self.private_key,
        })
    }

    pub fn into_summary(self) -> Result<WalletSummary, AppError> {
        let address = self.address()?;
        Ok(WalletSummary {
            id: self.id,
            name: self.wallet_name,
            address,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TransactionRecord {
    pub id: i64,
    pub user_id: i64,
    pub wallet_id: Option<i64>,
    pub tx_hash: String,
    pub tx_type: String,
    pub amount: String,
    pub token_address: String,
    pub status: String,
    pub created_at: Option<NaiveDateTime>,
}

impl TransactionRecord {
    /// Unknown labels are shown as pending rather than dropped.
    pub fn swap_status(&self) -> SwapStatus {
        self.status.parse().unwrap_or(SwapStatus::Pending)
    }
}
