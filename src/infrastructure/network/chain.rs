// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::app::config::ChainSettings;
use crate::common::error::AppError;
use crate::data::abi::{Erc20Metadata, KuruUtils};
use crate::domain::model::TokenInfo;
use crate::network::provider::{ConnectionFactory, HttpProvider};
use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, B256, U256, keccak256};
use alloy::providers::Provider;
use alloy::transports::{RpcError as TransportRpcError, TransportError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEstimate {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Outcome of a failed `eth_sendRawTransaction`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    /// The node answered and refused the transaction.
    #[error("{0}")]
    Rejected(String),
    /// No usable answer; the transaction may or may not have landed.
    #[error("{0}")]
    Transient(String),
}

/// Chain access used by the swap pipeline and the wallet screens.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64, AppError>;

    /// Native balance in wei.
    async fn balance(&self, address: Address) -> Result<U256, AppError>;

    /// ERC-20 balance of `owner` in token base units.
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, AppError>;

    async fn token_info(&self, token: Address) -> Result<TokenInfo, AppError>;

    /// Route price for a single-pool route, scaled by 1e18.
    async fn route_price(&self, pool: Address, is_buy: bool) -> Result<U256, AppError>;

    async fn pending_nonce(&self, address: Address) -> Result<u64, AppError>;

    async fn fee_estimate(&self) -> Result<FeeEstimate, AppError>;

    async fn broadcast(&self, raw: &[u8]) -> Result<B256, BroadcastError>;

    async fn transaction_known(&self, tx_hash: B256) -> Result<bool, AppError>;

    /// `None` while the transaction is not mined yet.
    async fn receipt_status(&self, tx_hash: B256) -> Result<Option<bool>, AppError>;
}

#[derive(Clone)]
pub struct RpcChainClient {
    provider: HttpProvider,
    utils_address: Address,
    timeout: Duration,
    tokens: Arc<DashMap<Address, TokenInfo>>,
}

impl RpcChainClient {
    pub fn new(settings: &ChainSettings) -> Result<Self, AppError> {
        let provider = ConnectionFactory::http(&settings.rpc_url)?;
        Ok(Self {
            provider,
            utils_address: settings.utils_address,
            timeout: settings.timeout,
            tokens: Arc::new(DashMap::new()),
        })
    }

    async fn bounded<T, E, F>(&self, op: &'static str, fut: F) -> Result<Result<T, E>, AppError>
    where
        F: IntoFuture<Output = Result<T, E>>,
    {
        tokio::time::timeout(self.timeout, fut.into_future())
            .await
            .map_err(|_| AppError::Connection(format!("{op} timed out after {:?}", self.timeout)))
    }
}

fn rpc_error(op: &str, err: &TransportError) -> AppError {
    match err {
        TransportRpcError::ErrorResp(payload) => {
            AppError::Rpc(format!("{op}: {} (code {})", payload.message, payload.code))
        }
        _ => AppError::Connection(format!("{op} failed: {err}")),
    }
}

fn contract_error(op: &str, err: alloy::contract::Error) -> AppError {
    match err {
        alloy::contract::Error::TransportError(e) => rpc_error(op, &e),
        other => AppError::Rpc(format!("{op}: {other}")),
    }
}

/// Node messages that mean the transaction is already in the pool.
fn is_already_known(message: &str) -> bool {
    let msg = message.to_lowercase();
    msg.contains("already known")
        || msg.contains("known transaction")
        || msg.contains("already imported")
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn chain_id(&self) -> Result<u64, AppError> {
        self.bounded("eth_chainId", self.provider.get_chain_id())
            .await?
            .map_err(|e| rpc_error("eth_chainId", &e))
    }

    async fn balance(&self, address: Address) -> Result<U256, AppError> {
        self.bounded("eth_getBalance", self.provider.get_balance(address))
            .await?
            .map_err(|e| rpc_error("eth_getBalance", &e))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, AppError> {
        let contract = Erc20Metadata::new(token, self.provider.clone());
        let call = contract.balanceOf(owner);
        self.bounded("balanceOf()", call.call())
            .await?
            .map_err(|e| contract_error("balanceOf()", e))
    }

    async fn token_info(&self, token: Address) -> Result<TokenInfo, AppError> {
        if let Some(info) = self.tokens.get(&token) {
            return Ok(info.clone());
        }

        let contract = Erc20Metadata::new(token, self.provider.clone());
        let name_call = contract.name();
        let symbol_call = contract.symbol();
        let decimals_call = contract.decimals();
        let name = self
            .bounded("name()", name_call.call())
            .await?
            .map_err(|e| contract_error("name()", e))?;
        let symbol = self
            .bounded("symbol()", symbol_call.call())
            .await?
            .map_err(|e| contract_error("symbol()", e))?;
        let decimals = self
            .bounded("decimals()", decimals_call.call())
            .await?
            .map_err(|e| contract_error("decimals()", e))?;

        let info = TokenInfo {
            address: token,
            name,
            symbol,
            decimals,
        };
        self.tokens.insert(token, info.clone());
        Ok(info)
    }

    async fn route_price(&self, pool: Address, is_buy: bool) -> Result<U256, AppError> {
        let utils = KuruUtils::new(self.utils_address, self.provider.clone());
        let call = utils.calculatePriceOverRoute(vec![pool], vec![is_buy]);
        self.bounded("calculatePriceOverRoute", call.call())
            .await?
            .map_err(|e| contract_error("calculatePriceOverRoute", e))
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, AppError> {
        self.bounded(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address).pending(),
        )
        .await?
        .map_err(|e| rpc_error("eth_getTransactionCount", &e))
    }

    async fn fee_estimate(&self) -> Result<FeeEstimate, AppError> {
        let est = self
            .bounded("fee estimation", self.provider.estimate_eip1559_fees())
            .await?
            .map_err(|e| rpc_error("fee estimation", &e))?;
        Ok(FeeEstimate {
            max_fee_per_gas: est.max_fee_per_gas,
            max_priority_fee_per_gas: est.max_priority_fee_per_gas,
        })
    }

    async fn broadcast(&self, raw: &[u8]) -> Result<B256, BroadcastError> {
        let expected = keccak256(raw);
        let sent = tokio::time::timeout(self.timeout, self.provider.send_raw_transaction(raw))
            .await
            .map_err(|_| {
                BroadcastError::Transient(format!(
                    "eth_sendRawTransaction timed out after {:?}",
                    self.timeout
                ))
            })?;

        match sent {
            Ok(pending) => Ok(*pending.tx_hash()),
            Err(TransportRpcError::ErrorResp(payload)) => {
                if is_already_known(&payload.message) {
                    tracing::debug!(target: "chain", tx = %expected, "Node already knows transaction");
                    Ok(expected)
                } else {
                    Err(BroadcastError::Rejected(payload.message.to_string()))
                }
            }
            Err(e) => Err(BroadcastError::Transient(e.to_string())),
        }
    }

    async fn transaction_known(&self, tx_hash: B256) -> Result<bool, AppError> {
        let tx = self
            .bounded(
                "eth_getTransactionByHash",
                self.provider.get_transaction_by_hash(tx_hash),
            )
            .await?
            .map_err(|e| rpc_error("eth_getTransactionByHash", &e))?;
        Ok(tx.is_some())
    }

    async fn receipt_status(&self, tx_hash: B256) -> Result<Option<bool>, AppError> {
        let receipt = self
            .bounded(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(tx_hash),
            )
            .await?
            .map_err(|e| rpc_error("eth_getTransactionReceipt", &e))?;
        Ok(receipt.map(|r| r.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_known_variants_are_detected() {
        assert!(is_already_known("already known"));
        assert!(is_already_known("ALREADY KNOWN"));
        assert!(is_already_known("known transaction: 0xabc"));
        assert!(!is_already_known("nonce too low"));
        assert!(!is_already_known("insufficient funds for gas * price + value"));
    }

    #[test]
    fn broadcast_errors_keep_node_text() {
        let err = BroadcastError::Rejected("insufficient funds".into());
        assert_eq!(err.to_string(), "insufficient funds");
    }

    #[tokio::test]
    async fn unreachable_node_is_a_connection_error() {
        let client = RpcChainClient::new(&ChainSettings {
            rpc_url: "http://127.0.0.1:1".into(),
            chain_id: 10143,
            utils_address: Address::ZERO,
            timeout: Duration::from_millis(500),
        })
        .expect("client");
        match client.balance(Address::ZERO).await {
            Err(AppError::Connection(_)) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }
}
