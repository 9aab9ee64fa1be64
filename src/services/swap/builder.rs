// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::app::config::SwapSettings;
use crate::common::error::{AppError, SwapError};
use crate::common::retry::retry_when;
use crate::common::time_utils::current_unix;
use crate::data::abi::KuruRouter;
use crate::domain::constants::{BPS_DENOMINATOR, PRICE_SCALE};
use crate::domain::model::{Pool, Quote, SwapRequest};
use crate::network::chain::ChainClient;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use std::sync::Arc;

/// Router call ready for signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedSwap {
    pub router: Address,
    pub from: Address,
    pub value: U256,
    pub calldata: Bytes,
    pub gas_limit: u64,
    /// Unix seconds after which the swap must not be signed.
    pub deadline: u64,
    pub quote: Quote,
}

/// Derive a quote from an on-chain route price.
///
/// `amount_out = amount_in * price / 1e18`, `min_amount_out` applies the
/// slippage guard rounding down.
pub fn compute_quote(
    amount_in: U256,
    price: U256,
    slippage_bps: u64,
    is_buy: bool,
    pool: Pool,
) -> Result<Quote, SwapError> {
    if amount_in.is_zero() {
        return Err(SwapError::InvalidAmount("amount must be positive".into()));
    }
    if slippage_bps >= BPS_DENOMINATOR {
        return Err(SwapError::validation(
            "slippage_bps",
            format!("must be below {BPS_DENOMINATOR}"),
        ));
    }

    let amount_out = amount_in
        .checked_mul(price)
        .map(|v| v / PRICE_SCALE)
        .ok_or_else(|| SwapError::InvalidAmount("amount too large to quote".into()))?;
    let min_amount_out = amount_out * U256::from(BPS_DENOMINATOR - slippage_bps)
        / U256::from(BPS_DENOMINATOR);

    if amount_out.is_zero() || min_amount_out.is_zero() {
        return Err(SwapError::InvalidAmount(
            "pool liquidity too low for this amount".into(),
        ));
    }

    Ok(Quote {
        amount_in,
        price,
        amount_out,
        min_amount_out,
        slippage_bps,
        is_buy,
        pool,
    })
}

#[derive(Clone)]
pub struct SwapBuilder {
    chain: Arc<dyn ChainClient>,
    settings: SwapSettings,
}

impl SwapBuilder {
    pub fn new(chain: Arc<dyn ChainClient>, settings: SwapSettings) -> Self {
        Self { chain, settings }
    }

    async fn route_price(&self, pool: Address, is_buy: bool) -> Result<U256, SwapError> {
        let policy = self.settings.discovery_retry;
        let chain = self.chain.clone();
        retry_when(
            move |_| {
                let chain = chain.clone();
                async move { chain.route_price(pool, is_buy).await }
            },
            policy,
            |e: &AppError| matches!(e, AppError::Connection(_)),
        )
        .await
        .map_err(|e| match e {
            AppError::Connection(msg) => SwapError::Unavailable {
                attempts: policy.attempts,
                last_error: msg,
            },
            AppError::Rpc(msg) => SwapError::InvalidAmount(format!("pool could not quote: {msg}")),
            other => other.into(),
        })
    }

    pub async fn build_swap(
        &self,
        request: &SwapRequest,
        pool: Pool,
    ) -> Result<UnsignedSwap, SwapError> {
        let is_buy = pool.is_buy_from(request.from_token);
        let price = self.route_price(pool.address, is_buy).await?;
        let quote = compute_quote(request.amount_in, price, request.slippage_bps, is_buy, pool)?;

        let native_send = request.from_token == self.settings.native_token;
        let call = KuruRouter::anyToAnySwapCall {
            _marketAddresses: vec![quote.pool.address],
            _isBuy: vec![quote.is_buy],
            _nativeSend: vec![native_send],
            _debitToken: request.from_token,
            _creditToken: request.to_token,
            _amount: quote.amount_in,
            _minAmountOut: quote.min_amount_out,
        };

        tracing::debug!(
            target: "swap_builder",
            pool = %quote.pool.address,
            is_buy,
            price = %quote.price,
            amount_in = %quote.amount_in,
            amount_out = %quote.amount_out,
            min_amount_out = %quote.min_amount_out,
            "Quote built"
        );

        Ok(UnsignedSwap {
            router: self.settings.router_address,
            from: request.wallet.address,
            value: if native_send { quote.amount_in } else { U256::ZERO },
            calldata: Bytes::from(call.abi_encode()),
            gas_limit: self.settings.gas_limit,
            deadline: current_unix().saturating_add(self.settings.deadline.as_secs()),
            quote,
        })
    }
}
