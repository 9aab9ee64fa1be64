// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use alloy::primitives::{Address, B256, U256, keccak256};
use async_trait::async_trait;
use kuruswap_bot::app::config::{BotSettings, SwapSettings};
use kuruswap_bot::common::retry::RetryPolicy;
use kuruswap_bot::domain::constants::{KURU_ROUTER_TESTNET, NATIVE_TOKEN, WMON_TESTNET};
use kuruswap_bot::domain::error::{AppError, SwapError};
use kuruswap_bot::domain::model::{Pool, TokenInfo};
use kuruswap_bot::infrastructure::data::db::Database;
use kuruswap_bot::infrastructure::data::store::WalletStore;
use kuruswap_bot::infrastructure::network::chain::{BroadcastError, ChainClient, FeeEstimate};
use kuruswap_bot::infrastructure::network::pool_discovery::PoolDiscovery;
use kuruswap_bot::services::bot::handlers::{BotContext, handle_callback};
use kuruswap_bot::services::bot::session::{Conversation, Sessions};
use kuruswap_bot::services::bot::telegram::{CallbackQuery, TelegramApi};
use kuruswap_bot::services::swap::signer::validate_private_key;
use kuruswap_bot::services::swap::{ConfirmationTracker, SwapOrchestrator};
use kuruswap_bot::services::wallets::WalletService;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123:test";
const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
const CHAIN_ID: u64 = 10143;
const USER: i64 = 7;

fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

fn token() -> TokenInfo {
    TokenInfo {
        address: Address::repeat_byte(0x42),
        name: "Test Token".into(),
        symbol: "TST".into(),
        decimals: 18,
    }
}

/// Accepts every broadcast and reports it mined on the first receipt poll.
struct MinedChain;

#[async_trait]
impl ChainClient for MinedChain {
    async fn chain_id(&self) -> Result<u64, AppError> {
        Ok(CHAIN_ID)
    }

    async fn balance(&self, _address: Address) -> Result<U256, AppError> {
        Ok(ether(100))
    }

    async fn token_balance(&self, _token: Address, _owner: Address) -> Result<U256, AppError> {
        Ok(ether(100))
    }

    async fn token_info(&self, _token: Address) -> Result<TokenInfo, AppError> {
        Ok(token())
    }

    async fn route_price(&self, _pool: Address, _is_buy: bool) -> Result<U256, AppError> {
        Ok(ether(2))
    }

    async fn pending_nonce(&self, _address: Address) -> Result<u64, AppError> {
        Ok(0)
    }

    async fn fee_estimate(&self) -> Result<FeeEstimate, AppError> {
        Ok(FeeEstimate {
            max_fee_per_gas: 60_000_000_000,
            max_priority_fee_per_gas: 2_000_000_000,
        })
    }

    async fn broadcast(&self, raw: &[u8]) -> Result<B256, BroadcastError> {
        Ok(keccak256(raw))
    }

    async fn transaction_known(&self, _tx_hash: B256) -> Result<bool, AppError> {
        Ok(true)
    }

    async fn receipt_status(&self, _tx_hash: B256) -> Result<Option<bool>, AppError> {
        Ok(Some(true))
    }
}

struct ListedPool;

#[async_trait]
impl PoolDiscovery for ListedPool {
    async fn find_pool(&self, _a: Address, _b: Address) -> Result<Option<Pool>, SwapError> {
        Ok(Some(Pool {
            address: Address::repeat_byte(0x99),
            base_token: token().address,
            quote_token: NATIVE_TOKEN,
            listed_price: None,
        }))
    }
}

fn swap_settings() -> SwapSettings {
    SwapSettings {
        chain_id: CHAIN_ID,
        router_address: KURU_ROUTER_TESTNET,
        native_token: NATIVE_TOKEN,
        wrapped_native_token: WMON_TESTNET,
        slippage_bps: 1_500,
        gas_limit: 250_000,
        deadline: Duration::from_secs(120),
        discovery_retry: RetryPolicy::new(3, Duration::from_millis(1)),
        broadcast_retry: RetryPolicy::new(3, Duration::from_millis(1)),
    }
}

fn bot_settings() -> BotSettings {
    BotSettings {
        token: TOKEN.into(),
        poll_timeout_secs: 1,
        history_limit: 10,
        tx_explorer: "https://testnet.monadexplorer.com/tx/".into(),
        address_explorer: "https://testnet.monadexplorer.com/address/".into(),
        receipt_poll: Duration::from_millis(1),
        receipt_timeout: Duration::from_secs(5),
    }
}

fn confirm_press() -> CallbackQuery {
    serde_json::from_value(json!({
        "id": "cb1",
        "from": { "id": USER, "is_bot": false, "first_name": "Ada" },
        "message": { "message_id": 3, "chat": { "id": USER, "type": "private" }, "text": "confirm?" },
        "data": "confirm_swap"
    }))
    .expect("callback")
}

async fn context(server: &MockServer, db: Database) -> Arc<BotContext> {
    let chain: Arc<dyn ChainClient> = Arc::new(MinedChain);
    let discovery: Arc<dyn PoolDiscovery> = Arc::new(ListedPool);
    let store: Arc<dyn WalletStore> = Arc::new(db);
    let settings = bot_settings();
    Arc::new(BotContext {
        api: TelegramApi::with_base_url(&server.uri(), TOKEN, 1).expect("client"),
        wallets: WalletService::new(store.clone()),
        chain: chain.clone(),
        discovery: discovery.clone(),
        orchestrator: Arc::new(SwapOrchestrator::new(
            chain.clone(),
            discovery,
            store.clone(),
            swap_settings(),
        )),
        tracker: ConfirmationTracker::new(
            chain,
            store,
            settings.receipt_poll,
            settings.receipt_timeout,
        ),
        sessions: Sessions::new(),
        settings,
        shutdown: CancellationToken::new(),
    })
}

#[tokio::test]
async fn swap_is_tracked_even_when_the_result_reply_fails() {
    let server = MockServer::start().await;
    // The "processing" edit goes through; everything after it is refused.
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/editMessageText")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "ok": false,
            "error_code": 500,
            "description": "Internal Server Error"
        })))
        .mount(&server)
        .await;

    let db = Database::new("sqlite::memory:").await.expect("db");
    db.ensure_user(USER, "ada").await.expect("user");
    let address = validate_private_key(KEY).expect("key").address();
    db.create_wallet(USER, "Main", address, KEY).await.expect("wallet");

    let ctx = context(&server, db.clone()).await;
    ctx.sessions.set(
        USER,
        Conversation::ConfirmingSwap {
            token: token(),
            amount: "1".into(),
        },
    );

    let err = handle_callback(&ctx, confirm_press()).await.unwrap_err();
    assert!(matches!(err, AppError::ApiCall { status: 500, .. }), "got {err:?}");

    let mut status = String::new();
    for _ in 0..200 {
        let rows = db.recent_transactions(USER, 10).await.expect("history");
        assert_eq!(rows.len(), 1);
        status = rows[0].status.clone();
        if status == "confirmed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status, "confirmed");
}
