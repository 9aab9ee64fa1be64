// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::data_path::sqlite_url;
use crate::common::retry::RetryPolicy;
use crate::domain::constants;
use crate::domain::error::AppError;
use alloy::primitives::Address;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    // General
    #[serde(default = "default_false")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub log_json: bool,
    pub data_dir: Option<String>,
    #[serde(default = "default_database_path")]
    pub database_path: String,

    // Telegram
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    #[serde(default = "default_history_limit")]
    pub history_limit: i64,

    // Chain
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_tx_explorer")]
    pub tx_explorer: String,
    #[serde(default = "default_address_explorer")]
    pub address_explorer: String,
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    // Kuru
    #[serde(default = "default_kuru_api_url")]
    pub kuru_api_url: String,
    #[serde(default = "default_router_address")]
    pub router_address: Address,
    #[serde(default = "default_utils_address")]
    pub utils_address: Address,
    #[serde(default = "default_native_token")]
    pub native_token: Address,
    #[serde(default = "default_wrapped_native_token")]
    pub wrapped_native_token: Address,

    // Swap
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u64,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,
}

// Defaults
fn default_false() -> bool {
    false
}
fn default_database_path() -> String {
    "kuruswap_bot.db".to_string()
}
fn default_poll_timeout_secs() -> u64 {
    30
}
fn default_history_limit() -> i64 {
    constants::DEFAULT_HISTORY_LIMIT
}
fn default_rpc_url() -> String {
    constants::MONAD_TESTNET_RPC.to_string()
}
fn default_chain_id() -> u64 {
    constants::CHAIN_MONAD_TESTNET
}
fn default_tx_explorer() -> String {
    format!("{}/tx/", constants::MONAD_TESTNET_EXPLORER)
}
fn default_address_explorer() -> String {
    format!("{}/address/", constants::MONAD_TESTNET_EXPLORER)
}
fn default_http_timeout_ms() -> u64 {
    10_000
}
fn default_kuru_api_url() -> String {
    constants::KURU_TESTNET_API.to_string()
}
fn default_router_address() -> Address {
    constants::KURU_ROUTER_TESTNET
}
fn default_utils_address() -> Address {
    constants::KURU_UTILS_TESTNET
}
fn default_native_token() -> Address {
    constants::NATIVE_TOKEN
}
fn default_wrapped_native_token() -> Address {
    constants::WMON_TESTNET
}
fn default_slippage_bps() -> u64 {
    constants::DEFAULT_SLIPPAGE_BPS
}
fn default_gas_limit() -> u64 {
    constants::DEFAULT_GAS_LIMIT
}
fn default_deadline_secs() -> u64 {
    constants::DEFAULT_DEADLINE_SECS
}
fn default_retry_attempts() -> usize {
    3
}
fn default_retry_initial_delay_ms() -> u64 {
    250
}
fn default_receipt_poll_ms() -> u64 {
    2_000
}
fn default_receipt_timeout_ms() -> u64 {
    120_000
}

/// Everything the chain client needs.
#[derive(Debug, Clone)]
pub struct ChainSettings {
    pub rpc_url: String,
    pub chain_id: u64,
    pub utils_address: Address,
    pub timeout: Duration,
}

/// Everything the pool discovery client needs.
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub api_url: String,
    pub timeout: Duration,
}

/// Pipeline tuning handed to the orchestrator and builder.
#[derive(Debug, Clone)]
pub struct SwapSettings {
    pub chain_id: u64,
    pub router_address: Address,
    pub native_token: Address,
    pub wrapped_native_token: Address,
    pub slippage_bps: u64,
    pub gas_limit: u64,
    pub deadline: Duration,
    pub discovery_retry: RetryPolicy,
    pub broadcast_retry: RetryPolicy,
}

/// Front end settings.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub token: String,
    pub poll_timeout_secs: u64,
    pub history_limit: i64,
    pub tx_explorer: String,
    pub address_explorer: String,
    pub receipt_poll: Duration,
    pub receipt_timeout: Duration,
}

impl Settings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected_path) = path {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Precedence: CLI (in main) > env/.env > config file.
        builder = builder.add_source(Environment::default().try_parsing(true));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.bot_token.trim().is_empty() || self.bot_token == "YOUR_BOT_TOKEN_HERE" {
            return Err(AppError::Config("BOT_TOKEN is missing".to_string()));
        }
        if self.slippage_bps >= constants::BPS_DENOMINATOR {
            return Err(AppError::Validation {
                field: "slippage_bps".into(),
                message: format!(
                    "must be below {} (got {})",
                    constants::BPS_DENOMINATOR,
                    self.slippage_bps
                ),
            });
        }
        Url::parse(&self.rpc_url)
            .map_err(|e| AppError::Config(format!("Invalid RPC URL: {e}")))?;
        Url::parse(&self.kuru_api_url)
            .map_err(|e| AppError::Config(format!("Invalid Kuru API URL: {e}")))?;
        if self.retry_attempts == 0 {
            return Err(AppError::Config("retry_attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn database_url(&self) -> String {
        sqlite_url(&self.database_path, self.data_dir.as_deref())
    }

    fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms.max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_initial_delay_ms),
        )
    }

    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            rpc_url: self.rpc_url.clone(),
            chain_id: self.chain_id,
            utils_address: self.utils_address,
            timeout: self.http_timeout(),
        }
    }

    pub fn discovery_settings(&self) -> DiscoverySettings {
        DiscoverySettings {
            api_url: self.kuru_api_url.trim_end_matches('/').to_string(),
            timeout: self.http_timeout(),
        }
    }

    pub fn swap_settings(&self) -> SwapSettings {
        SwapSettings {
            chain_id: self.chain_id,
            router_address: self.router_address,
            native_token: self.native_token,
            wrapped_native_token: self.wrapped_native_token,
            slippage_bps: self.slippage_bps,
            gas_limit: self.gas_limit,
            deadline: Duration::from_secs(self.deadline_secs),
            discovery_retry: self.retry_policy(),
            broadcast_retry: self.retry_policy(),
        }
    }

    pub fn bot_settings(&self) -> BotSettings {
        BotSettings {
            token: self.bot_token.clone(),
            poll_timeout_secs: self.poll_timeout_secs,
            history_limit: self.history_limit,
            tx_explorer: self.tx_explorer.clone(),
            address_explorer: self.address_explorer.clone(),
            receipt_poll: Duration::from_millis(self.receipt_poll_ms.max(100)),
            receipt_timeout: Duration::from_millis(self.receipt_timeout_ms),
        }
    }
}
