// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::RecordingWarning;
use alloy::primitives::{Address, B256, U256};
use std::fmt;
use std::str::FromStr;

/// Telegram user id.
pub type UserId = i64;

/// A stored wallet. The key is held only long enough to sign.
#[derive(Clone, PartialEq, Eq)]
pub struct Wallet {
    pub id: i64,
    pub name: String,
    pub address: Address,
    pub private_key: String,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Listing entry for wallet management screens (no key material).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSummary {
    pub id: i64,
    pub name: String,
    pub address: Address,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Raw swap input as received from the chat front end.
#[derive(Debug, Clone)]
pub struct SwapOrder {
    pub user_id: UserId,
    pub wallet: Wallet,
    pub from_token: Address,
    pub to_token: String,
    pub amount: String,
    pub slippage_bps: u64,
}

/// Validated swap input. Built once by the validation step and never mutated.
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub user_id: UserId,
    pub from_token: Address,
    pub to_token: Address,
    pub amount_in: U256,
    pub wallet: Wallet,
    pub slippage_bps: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub address: Address,
    pub base_token: Address,
    pub quote_token: Address,
    /// Indicative price reported by the listing, if any.
    pub listed_price: Option<String>,
}

impl Pool {
    /// Order-insensitive pair membership.
    pub fn matches_pair(&self, token_a: Address, token_b: Address) -> bool {
        (self.base_token == token_a && self.quote_token == token_b)
            || (self.base_token == token_b && self.quote_token == token_a)
    }

    /// Buying base with quote when the input token is the quote side.
    pub fn is_buy_from(&self, from_token: Address) -> bool {
        self.quote_token == from_token
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub amount_in: U256,
    /// Route price scaled by 1e18 (output units per input unit).
    pub price: U256,
    pub amount_out: U256,
    pub min_amount_out: U256,
    pub slippage_bps: u64,
    pub is_buy: bool,
    pub pool: Pool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapStatus {
    Pending,
    Confirmed,
    Failed,
}

impl SwapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "pending",
            SwapStatus::Confirmed => "confirmed",
            SwapStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SwapStatus::Pending)
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwapStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(SwapStatus::Pending),
            "confirmed" | "success" => Ok(SwapStatus::Confirmed),
            "failed" | "reverted" => Ok(SwapStatus::Failed),
            other => Err(format!("unknown swap status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapResult {
    pub tx_hash: B256,
    pub status: SwapStatus,
    pub amount: U256,
    pub token_address: Address,
    pub user_id: UserId,
    pub wallet_id: i64,
}

impl SwapResult {
    pub fn pending(tx_hash: B256, request: &SwapRequest) -> Self {
        Self {
            tx_hash,
            status: SwapStatus::Pending,
            amount: request.amount_in,
            token_address: request.to_token,
            user_id: request.user_id,
            wallet_id: request.wallet.id,
        }
    }

    /// Moves a pending result to its terminal status. Returns `false` when the
    /// result already left `Pending`.
    pub fn settle(&mut self, confirmed: bool) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = if confirmed {
            SwapStatus::Confirmed
        } else {
            SwapStatus::Failed
        };
        true
    }
}

/// Successful pipeline outcome handed back to the front end.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub result: SwapResult,
    pub quote: Quote,
    pub warning: Option<RecordingWarning>,
}
