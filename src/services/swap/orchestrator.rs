// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::app::config::SwapSettings;
use crate::common::error::{AppError, RecordingWarning, SwapError};
use crate::common::keyed_lock::KeyedLocks;
use crate::common::parsing::{parse_address_hex, parse_amount};
use crate::common::retry::retry_when;
use crate::common::time_utils::current_unix;
use crate::data::store::WalletStore;
use crate::domain::constants::{BPS_DENOMINATOR, NATIVE_DECIMALS};
use crate::domain::model::{Pool, SwapOrder, SwapOutcome, SwapRequest, SwapResult};
use crate::network::chain::{BroadcastError, ChainClient};
use crate::network::pool_discovery::PoolDiscovery;
use crate::services::swap::builder::{SwapBuilder, UnsignedSwap};
use crate::services::swap::signer::{SignedSwap, sign_swap, validate_private_key};
use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use std::future::Future;
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Runs one swap end to end: validate, discover, quote, sign, broadcast,
/// record. Each step is terminal on failure.
pub struct SwapOrchestrator {
    chain: Arc<dyn ChainClient>,
    discovery: Arc<dyn PoolDiscovery>,
    store: Arc<dyn WalletStore>,
    builder: SwapBuilder,
    settings: SwapSettings,
    wallet_locks: KeyedLocks<Address>,
}

impl SwapOrchestrator {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        discovery: Arc<dyn PoolDiscovery>,
        store: Arc<dyn WalletStore>,
        settings: SwapSettings,
    ) -> Self {
        let builder = SwapBuilder::new(chain.clone(), settings.clone());
        Self {
            chain,
            discovery,
            store,
            builder,
            settings,
            wallet_locks: KeyedLocks::new(),
        }
    }

    pub fn settings(&self) -> &SwapSettings {
        &self.settings
    }

    /// Full pipeline. `cancel` is honored up to the moment the transaction is
    /// handed to the node.
    pub async fn execute(
        &self,
        order: SwapOrder,
        cancel: &CancellationToken,
    ) -> Result<SwapOutcome, SwapError> {
        let outcome = self.run(order, cancel).await;
        if let Err(e) = &outcome {
            tracing::warn!(target: "swap", kind = e.kind(), error = %e, "Swap failed");
        }
        outcome
    }

    async fn run(
        &self,
        order: SwapOrder,
        cancel: &CancellationToken,
    ) -> Result<SwapOutcome, SwapError> {
        let (request, unsigned) = self.prepare(order, cancel).await?;

        let tx_hash = self.sign_and_broadcast(&request, &unsigned, cancel).await?;

        let result = SwapResult::pending(tx_hash, &request);
        let warning = self.record(&result).await;
        tracing::info!(
            target: "swap",
            user_id = request.user_id,
            tx = %tx_hash,
            amount_in = %unsigned.quote.amount_in,
            min_amount_out = %unsigned.quote.min_amount_out,
            recorded = warning.is_none(),
            "Swap broadcast"
        );

        Ok(SwapOutcome {
            result,
            quote: unsigned.quote,
            warning,
        })
    }

    /// Validate, discover and quote without touching the wallet key. Used for
    /// the confirmation preview and as the first half of `execute`.
    pub async fn prepare(
        &self,
        order: SwapOrder,
        cancel: &CancellationToken,
    ) -> Result<(SwapRequest, UnsignedSwap), SwapError> {
        let request = self.validate(order).await?;
        ensure_live(cancel)?;

        let pool = self.discover(&request).await?;
        ensure_live(cancel)?;

        let unsigned = self.quote(&request, pool).await?;
        ensure_live(cancel)?;
        Ok((request, unsigned))
    }

    pub async fn validate(&self, order: SwapOrder) -> Result<SwapRequest, SwapError> {
        let to_token = parse_address_hex(&order.to_token).ok_or_else(|| {
            SwapError::validation("to_token", format!("`{}` is not an address", order.to_token.trim()))
        })?;
        if to_token == self.settings.native_token {
            return Err(SwapError::validation("to_token", "cannot buy the native token"));
        }
        if to_token == self.settings.wrapped_native_token {
            return Err(SwapError::validation(
                "to_token",
                "wrapped native token is not a swap target",
            ));
        }
        if to_token == order.from_token {
            return Err(SwapError::validation(
                "to_token",
                "input and output token are the same",
            ));
        }
        if order.slippage_bps >= BPS_DENOMINATOR {
            return Err(SwapError::validation(
                "slippage_bps",
                format!("must be below {BPS_DENOMINATOR}"),
            ));
        }

        let decimals = if order.from_token == self.settings.native_token {
            NATIVE_DECIMALS
        } else {
            self.chain.token_info(order.from_token).await?.decimals
        };
        let amount_in =
            parse_amount(&order.amount, decimals).map_err(|m| SwapError::validation("amount", m))?;

        Ok(SwapRequest {
            user_id: order.user_id,
            from_token: order.from_token,
            to_token,
            amount_in,
            wallet: order.wallet,
            slippage_bps: order.slippage_bps,
        })
    }

    pub async fn discover(&self, request: &SwapRequest) -> Result<Pool, SwapError> {
        let policy = self.settings.discovery_retry;
        let discovery = self.discovery.clone();
        let (from, to) = (request.from_token, request.to_token);

        let found = retry_when(
            move |attempt| {
                let discovery = discovery.clone();
                async move {
                    if attempt > 1 {
                        tracing::debug!(target: "swap", attempt, "Retrying pool discovery");
                    }
                    discovery.find_pool(from, to).await
                }
            },
            policy,
            SwapError::is_transient,
        )
        .await
        .map_err(|e| match e {
            SwapError::Transient(last_error) => SwapError::Unavailable {
                attempts: policy.attempts,
                last_error,
            },
            other => other,
        })?;

        match found {
            Some(pool) if pool.matches_pair(from, to) => Ok(pool),
            Some(pool) => Err(SwapError::Internal(format!(
                "discovery returned pool {} for another pair",
                pool.address
            ))),
            None => Err(SwapError::NotFound),
        }
    }

    async fn quote(&self, request: &SwapRequest, pool: Pool) -> Result<UnsignedSwap, SwapError> {
        let owner = request.wallet.address;
        let token = request.from_token;
        let balance = if token == self.settings.native_token {
            self.chain_read(move |chain| async move { chain.balance(owner).await })
                .await?
        } else {
            self.chain_read(move |chain| async move { chain.token_balance(token, owner).await })
                .await?
        };
        if request.amount_in > balance {
            return Err(SwapError::InvalidAmount(format!(
                "amount {} exceeds balance {}",
                request.amount_in, balance
            )));
        }

        self.builder.build_swap(request, pool).await
    }

    async fn sign_and_broadcast(
        &self,
        request: &SwapRequest,
        unsigned: &UnsignedSwap,
        cancel: &CancellationToken,
    ) -> Result<B256, SwapError> {
        let signer = validate_private_key(&request.wallet.private_key).map_err(|e| {
            SwapError::Internal(format!("wallet {} key unusable: {e}", request.wallet.id))
        })?;
        if signer.address() != request.wallet.address {
            return Err(SwapError::Internal(format!(
                "wallet {} key does not match its address",
                request.wallet.id
            )));
        }

        let guard = tokio::select! {
            guard = self.wallet_locks.lock(&request.wallet.address) => Some(guard),
            _ = cancel.cancelled() => None,
        };
        let Some(guard) = guard else {
            self.wallet_locks.prune();
            return Err(SwapError::Cancelled);
        };
        let sent = self.sign_locked(signer, unsigned, cancel).await;
        drop(guard);
        self.wallet_locks.prune();
        sent
    }

    /// Nonce, fees, signature and broadcast. Runs with the wallet lock held.
    async fn sign_locked(
        &self,
        signer: PrivateKeySigner,
        unsigned: &UnsignedSwap,
        cancel: &CancellationToken,
    ) -> Result<B256, SwapError> {
        let address = signer.address();
        let nonce = self
            .chain_read(move |chain| async move { chain.pending_nonce(address).await })
            .await?;
        let fees = self
            .chain_read(|chain| async move { chain.fee_estimate().await })
            .await?;
        if current_unix() > unsigned.deadline {
            return Err(SwapError::Expired);
        }
        let signed = sign_swap(&signer, unsigned, self.settings.chain_id, nonce, fees)
            .map_err(|e| SwapError::Internal(e.to_string()))?;
        drop(signer);

        ensure_live(cancel)?;
        tracing::debug!(target: "swap", tx = %signed.tx_hash, nonce, "Broadcasting swap");
        self.broadcast(&signed).await
    }

    async fn broadcast(&self, signed: &SignedSwap) -> Result<B256, SwapError> {
        let policy = self.settings.broadcast_retry;
        let mut attempt = 1;
        loop {
            let transport_error = match self.chain.broadcast(&signed.raw).await {
                Ok(hash) => return Ok(hash),
                Err(BroadcastError::Rejected(reason)) if attempt == 1 => {
                    return Err(SwapError::Rejected(reason));
                }
                // An earlier send may have landed; the refusal can be the node
                // seeing our own nonce.
                Err(BroadcastError::Rejected(reason)) => {
                    return self.settle_rejected_resend(signed, reason).await;
                }
                Err(BroadcastError::Transient(err)) => err,
            };

            match self.chain.transaction_known(signed.tx_hash).await {
                Ok(true) => {
                    tracing::info!(target: "swap", tx = %signed.tx_hash, "Broadcast landed despite transport error");
                    return Ok(signed.tx_hash);
                }
                Ok(false) if attempt < policy.attempts => {
                    tracing::warn!(
                        target: "swap",
                        tx = %signed.tx_hash,
                        attempt,
                        error = %transport_error,
                        "Broadcast failed, retrying"
                    );
                    sleep(policy.delay_after(attempt)).await;
                    attempt += 1;
                }
                Ok(false) => {
                    return Err(SwapError::Unavailable {
                        attempts: attempt,
                        last_error: transport_error,
                    });
                }
                Err(lookup) => {
                    return Err(SwapError::AmbiguousBroadcast {
                        tx_hash: format!("{:#x}", signed.tx_hash),
                        reason: format!("{transport_error}; lookup failed: {lookup}"),
                    });
                }
            }
        }
    }

    async fn settle_rejected_resend(
        &self,
        signed: &SignedSwap,
        reason: String,
    ) -> Result<B256, SwapError> {
        match self.chain.transaction_known(signed.tx_hash).await {
            Ok(true) => {
                tracing::info!(target: "swap", tx = %signed.tx_hash, "Resend refused but transaction is known");
                Ok(signed.tx_hash)
            }
            Ok(false) => Err(SwapError::AmbiguousBroadcast {
                tx_hash: format!("{:#x}", signed.tx_hash),
                reason: format!("resend rejected after transport error: {reason}"),
            }),
            Err(lookup) => Err(SwapError::AmbiguousBroadcast {
                tx_hash: format!("{:#x}", signed.tx_hash),
                reason: format!("resend rejected: {reason}; lookup failed: {lookup}"),
            }),
        }
    }

    /// Chain read with the bounded retry policy. Exhausted connection
    /// failures become `Unavailable`.
    async fn chain_read<T, F, Fut>(&self, op: F) -> Result<T, SwapError>
    where
        F: Fn(Arc<dyn ChainClient>) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let policy = self.settings.discovery_retry;
        retry_when(
            |_| op(self.chain.clone()),
            policy,
            |e: &AppError| matches!(e, AppError::Connection(_)),
        )
        .await
        .map_err(|e| match e {
            AppError::Connection(last_error) => SwapError::Unavailable {
                attempts: policy.attempts,
                last_error,
            },
            other => other.into(),
        })
    }

    /// Number of per-wallet lock entries currently held or awaited.
    pub fn wallet_lock_count(&self) -> usize {
        self.wallet_locks.len()
    }

    async fn record(&self, result: &SwapResult) -> Option<RecordingWarning> {
        match self.store.append_transaction(result).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(target: "swap", tx = %result.tx_hash, error = %e, "Swap not recorded");
                Some(RecordingWarning(e.to_string()))
            }
        }
    }
}

fn ensure_live(cancel: &CancellationToken) -> Result<(), SwapError> {
    if cancel.is_cancelled() {
        Err(SwapError::Cancelled)
    } else {
        Ok(())
    }
}
