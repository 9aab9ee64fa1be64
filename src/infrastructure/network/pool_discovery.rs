// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::app::config::DiscoverySettings;
use crate::common::error::{AppError, SwapError};
use crate::domain::model::Pool;
use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const PROVIDER: &str = "kuru-markets";
const MARKETS_PATH: &str = "/api/v1/markets/filtered";

/// Market lookup seam. `Ok(None)` means the pair has no pool.
#[async_trait]
pub trait PoolDiscovery: Send + Sync {
    async fn find_pool(&self, token_a: Address, token_b: Address)
    -> Result<Option<Pool>, SwapError>;
}

#[derive(Serialize)]
struct MarketsRequest {
    pairs: Vec<PairFilter>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PairFilter {
    base_token: String,
    quote_token: String,
}

#[derive(Deserialize, Debug)]
struct MarketsResponse {
    #[serde(default)]
    data: Option<Vec<MarketEntry>>,
}

#[derive(Deserialize, Debug)]
struct MarketEntry {
    market: String,
    #[serde(default, alias = "baseAsset", alias = "base_asset", alias = "baseToken")]
    baseasset: Option<String>,
    #[serde(default, alias = "quoteAsset", alias = "quote_asset", alias = "quoteToken")]
    quoteasset: Option<String>,
    #[serde(default)]
    price: Option<serde_json::Value>,
}

impl MarketEntry {
    /// Resolve the entry into a pool, attributing missing token fields to the
    /// orientation that was queried. Entries with unparsable addresses are
    /// skipped.
    fn into_pool(self, queried_base: Address, queried_quote: Address) -> Option<Pool> {
        let address = Address::from_str(self.market.trim()).ok()?;
        let base_token = match self.baseasset.as_deref() {
            Some(raw) => Address::from_str(raw.trim()).ok()?,
            None => queried_base,
        };
        let quote_token = match self.quoteasset.as_deref() {
            Some(raw) => Address::from_str(raw.trim()).ok()?,
            None => queried_quote,
        };
        let listed_price = match self.price {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Some(Pool {
            address,
            base_token,
            quote_token,
            listed_price,
        })
    }
}

#[derive(Clone)]
pub struct KuruPoolDiscovery {
    client: Client,
    markets_url: String,
}

impl KuruPoolDiscovery {
    pub fn new(settings: &DiscoverySettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {}", e)))?;
        Ok(Self {
            client,
            markets_url: format!("{}{}", settings.api_url.trim_end_matches('/'), MARKETS_PATH),
        })
    }

    async fn query(&self, base: Address, quote: Address) -> Result<Vec<MarketEntry>, SwapError> {
        let body = MarketsRequest {
            pairs: vec![PairFilter {
                base_token: format!("{base:#x}"),
                quote_token: format!("{quote:#x}"),
            }],
        };
        let resp = self
            .client
            .post(&self.markets_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SwapError::Transient(format!("markets request failed: {}", e)))?;

        let status = resp.status();
        if is_transient_status(status) {
            return Err(SwapError::Transient(format!("markets endpoint returned {status}")));
        }
        if !status.is_success() {
            return Err(SwapError::Api {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SwapError::Transient(format!("markets body read failed: {}", e)))?;
        let parsed: MarketsResponse = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(target: "pool_discovery", error = %e, "Undecodable markets response");
            SwapError::Api {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
            }
        })?;
        Ok(parsed.data.unwrap_or_default())
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

#[async_trait]
impl PoolDiscovery for KuruPoolDiscovery {
    async fn find_pool(
        &self,
        token_a: Address,
        token_b: Address,
    ) -> Result<Option<Pool>, SwapError> {
        for (base, quote) in [(token_a, token_b), (token_b, token_a)] {
            let entries = self.query(base, quote).await?;
            let found = entries
                .into_iter()
                .filter_map(|entry| entry.into_pool(base, quote))
                .find(|pool| pool.matches_pair(token_a, token_b));
            if let Some(pool) = found {
                tracing::debug!(
                    target: "pool_discovery",
                    pool = %pool.address,
                    base = %pool.base_token,
                    quote = %pool.quote_token,
                    "Pool found"
                );
                return Ok(Some(pool));
            }
        }
        tracing::debug!(target: "pool_discovery", %token_a, %token_b, "No pool for pair");
        Ok(None)
    }
}
