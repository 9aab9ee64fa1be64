// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, B256, U256, keccak256};
use async_trait::async_trait;
use kuruswap_bot::app::config::SwapSettings;
use kuruswap_bot::common::retry::RetryPolicy;
use kuruswap_bot::domain::constants::{KURU_ROUTER_TESTNET, NATIVE_TOKEN, WMON_TESTNET};
use kuruswap_bot::domain::error::{AppError, SwapError};
use kuruswap_bot::domain::model::{
    Pool, SwapOrder, SwapResult, SwapStatus, TokenInfo, UserId, Wallet, WalletSummary,
};
use kuruswap_bot::infrastructure::data::db::Database;
use kuruswap_bot::infrastructure::data::schema::TransactionRecord;
use kuruswap_bot::infrastructure::data::store::WalletStore;
use kuruswap_bot::infrastructure::network::chain::{BroadcastError, ChainClient, FeeEstimate};
use kuruswap_bot::infrastructure::network::pool_discovery::PoolDiscovery;
use kuruswap_bot::services::swap::signer::{decode_signed_swap, validate_private_key};
use kuruswap_bot::services::swap::{ConfirmationTracker, SwapOrchestrator};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
const CHAIN_ID: u64 = 10143;

fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

fn token() -> Address {
    Address::repeat_byte(0x42)
}

fn pool() -> Pool {
    Pool {
        address: Address::repeat_byte(0x99),
        base_token: token(),
        quote_token: NATIVE_TOKEN,
        listed_price: None,
    }
}

#[derive(Clone, Copy)]
enum BroadcastMode {
    Accept,
    Reject,
    /// Transport error, then the lookup answers with `landed`.
    Lost { landed: bool },
    /// Transport error, then the lookup fails too.
    Ambiguous,
    /// Transport error and an empty lookup, then the resend is refused.
    /// Later lookups answer with `landed_late`.
    LostThenRefused { landed_late: bool },
}

struct FakeChain {
    price: U256,
    balance: U256,
    nonce: AtomicU64,
    mode: Mutex<BroadcastMode>,
    sent: Mutex<Vec<Vec<u8>>>,
    broadcasts: AtomicUsize,
    lookups: AtomicUsize,
    receipts: Mutex<VecDeque<Option<bool>>>,
    balance_down: bool,
    balance_reads: AtomicUsize,
    nonce_down: bool,
}

impl FakeChain {
    fn new(mode: BroadcastMode) -> Self {
        Self {
            price: ether(2),
            balance: ether(100),
            nonce: AtomicU64::new(0),
            mode: Mutex::new(mode),
            sent: Mutex::new(Vec::new()),
            broadcasts: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
            receipts: Mutex::new(VecDeque::new()),
            balance_down: false,
            balance_reads: AtomicUsize::new(0),
            nonce_down: false,
        }
    }

    fn with_balance_down(mut self) -> Self {
        self.balance_down = true;
        self
    }

    fn with_nonce_down(mut self) -> Self {
        self.nonce_down = true;
        self
    }

    fn balance_reads(&self) -> usize {
        self.balance_reads.load(Ordering::SeqCst)
    }

    fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    fn with_receipts(self, receipts: Vec<Option<bool>>) -> Self {
        *self.receipts.lock().unwrap() = receipts.into();
        self
    }

    fn broadcast_count(&self) -> usize {
        self.broadcasts.load(Ordering::SeqCst)
    }

    fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn chain_id(&self) -> Result<u64, AppError> {
        Ok(CHAIN_ID)
    }

    async fn balance(&self, _address: Address) -> Result<U256, AppError> {
        self.balance_reads.fetch_add(1, Ordering::SeqCst);
        if self.balance_down {
            return Err(AppError::Connection("rpc timed out".into()));
        }
        Ok(self.balance)
    }

    async fn token_balance(&self, _token: Address, _owner: Address) -> Result<U256, AppError> {
        Ok(self.balance)
    }

    async fn token_info(&self, token: Address) -> Result<TokenInfo, AppError> {
        Ok(TokenInfo {
            address: token,
            name: "Test Token".into(),
            symbol: "TST".into(),
            decimals: 18,
        })
    }

    async fn route_price(&self, _pool: Address, _is_buy: bool) -> Result<U256, AppError> {
        Ok(self.price)
    }

    async fn pending_nonce(&self, _address: Address) -> Result<u64, AppError> {
        if self.nonce_down {
            return Err(AppError::Connection("rpc timed out".into()));
        }
        Ok(self.nonce.load(Ordering::SeqCst))
    }

    async fn fee_estimate(&self) -> Result<FeeEstimate, AppError> {
        Ok(FeeEstimate {
            max_fee_per_gas: 60_000_000_000,
            max_priority_fee_per_gas: 2_000_000_000,
        })
    }

    async fn broadcast(&self, raw: &[u8]) -> Result<B256, BroadcastError> {
        let earlier = self.broadcasts.fetch_add(1, Ordering::SeqCst);
        // Yield so a concurrent swap gets a chance to race for the nonce.
        tokio::task::yield_now().await;
        let mode = *self.mode.lock().unwrap();
        match mode {
            BroadcastMode::Accept => {
                self.sent.lock().unwrap().push(raw.to_vec());
                self.nonce.fetch_add(1, Ordering::SeqCst);
                Ok(keccak256(raw))
            }
            BroadcastMode::Reject => Err(BroadcastError::Rejected("insufficient funds for gas".into())),
            BroadcastMode::LostThenRefused { .. } if earlier > 0 => {
                Err(BroadcastError::Rejected("nonce too low".into()))
            }
            BroadcastMode::Lost { .. }
            | BroadcastMode::Ambiguous
            | BroadcastMode::LostThenRefused { .. } => {
                Err(BroadcastError::Transient("connection reset".into()))
            }
        }
    }

    async fn transaction_known(&self, _tx_hash: B256) -> Result<bool, AppError> {
        let earlier = self.lookups.fetch_add(1, Ordering::SeqCst);
        match *self.mode.lock().unwrap() {
            BroadcastMode::Lost { landed } => Ok(landed),
            BroadcastMode::LostThenRefused { landed_late } => Ok(earlier > 0 && landed_late),
            BroadcastMode::Ambiguous => Err(AppError::Connection("node unreachable".into())),
            _ => Ok(false),
        }
    }

    async fn receipt_status(&self, _tx_hash: B256) -> Result<Option<bool>, AppError> {
        Ok(self.receipts.lock().unwrap().pop_front().flatten())
    }
}

enum DiscoveryMode {
    Found(Pool),
    Missing,
    Down,
}

struct FakeDiscovery {
    mode: DiscoveryMode,
    calls: AtomicUsize,
}

impl FakeDiscovery {
    fn new(mode: DiscoveryMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoolDiscovery for FakeDiscovery {
    async fn find_pool(&self, _a: Address, _b: Address) -> Result<Option<Pool>, SwapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            DiscoveryMode::Found(pool) => Ok(Some(pool.clone())),
            DiscoveryMode::Missing => Ok(None),
            DiscoveryMode::Down => Err(SwapError::Transient("markets endpoint returned 503".into())),
        }
    }
}

#[derive(Default)]
struct FakeStore {
    fail_writes: bool,
    recorded: Mutex<Vec<SwapResult>>,
    updates: Mutex<Vec<(B256, SwapStatus)>>,
}

impl FakeStore {
    fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    fn recorded(&self) -> Vec<SwapResult> {
        self.recorded.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletStore for FakeStore {
    async fn ensure_user(&self, _user_id: UserId, _username: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn get(&self, _user_id: UserId) -> Result<Option<Wallet>, AppError> {
        Ok(None)
    }

    async fn save(
        &self,
        _user_id: UserId,
        _name: &str,
        _address: Address,
        _private_key: &str,
    ) -> Result<i64, AppError> {
        Ok(1)
    }

    async fn list(&self, _user_id: UserId) -> Result<Vec<WalletSummary>, AppError> {
        Ok(Vec::new())
    }

    async fn set_active(&self, _user_id: UserId, _wallet_id: i64) -> Result<bool, AppError> {
        Ok(false)
    }

    async fn history(&self, _user_id: UserId, _limit: i64) -> Result<Vec<TransactionRecord>, AppError> {
        Ok(Vec::new())
    }

    async fn append_transaction(&self, result: &SwapResult) -> Result<(), AppError> {
        if self.fail_writes {
            return Err(AppError::Database("database is locked".into()));
        }
        self.recorded.lock().unwrap().push(result.clone());
        Ok(())
    }

    async fn update_status(&self, tx_hash: B256, status: SwapStatus) -> Result<bool, AppError> {
        self.updates.lock().unwrap().push((tx_hash, status));
        Ok(true)
    }
}

fn settings() -> SwapSettings {
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

fn wallet() -> Wallet {
    let signer = validate_private_key(KEY).expect("key");
    Wallet {
        id: 1,
        name: "Main".into(),
        address: signer.address(),
        private_key: KEY.into(),
    }
}

fn order(amount: &str) -> SwapOrder {
    SwapOrder {
        user_id: 7,
        wallet: wallet(),
        from_token: NATIVE_TOKEN,
        to_token: format!("{:#x}", token()),
        amount: amount.into(),
        slippage_bps: 1_500,
    }
}

struct Harness {
    chain: Arc<FakeChain>,
    discovery: Arc<FakeDiscovery>,
    store: Arc<FakeStore>,
    orchestrator: SwapOrchestrator,
}

fn harness(chain: FakeChain, discovery: DiscoveryMode, store: FakeStore) -> Harness {
    let chain = Arc::new(chain);
    let discovery = Arc::new(FakeDiscovery::new(discovery));
    let store = Arc::new(store);
    let orchestrator = SwapOrchestrator::new(
        chain.clone(),
        discovery.clone(),
        store.clone(),
        settings(),
    );
    Harness {
        chain,
        discovery,
        store,
        orchestrator,
    }
}

fn healthy() -> Harness {
    harness(
        FakeChain::new(BroadcastMode::Accept),
        DiscoveryMode::Found(pool()),
        FakeStore::default(),
    )
}

#[tokio::test]
async fn swap_is_quoted_signed_broadcast_and_recorded() {
    let h = healthy();
    let outcome = h
        .orchestrator
        .execute(order("10"), &CancellationToken::new())
        .await
        .expect("swap");

    assert_eq!(outcome.quote.amount_out, ether(20));
    assert_eq!(outcome.quote.min_amount_out, ether(17));
    assert!(outcome.quote.is_buy);
    assert!(outcome.warning.is_none());
    assert_eq!(outcome.result.status, SwapStatus::Pending);

    let sent = h.chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(outcome.result.tx_hash, keccak256(&sent[0]));

    let decoded = decode_signed_swap(&sent[0]).expect("decodable");
    assert_eq!(decoded.sender, wallet().address);
    assert_eq!(decoded.router, KURU_ROUTER_TESTNET);
    assert_eq!(decoded.value, ether(10));
    assert_eq!(decoded.amount_in, ether(10));
    assert_eq!(decoded.min_amount_out, ether(17));
    assert_eq!(decoded.market, pool().address);

    let recorded = h.store.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].tx_hash, outcome.result.tx_hash);
    assert_eq!(recorded[0].token_address, token());
    assert_eq!(recorded[0].amount, ether(10));
}

#[tokio::test]
async fn missing_pool_stops_before_signing() {
    let h = harness(
        FakeChain::new(BroadcastMode::Accept),
        DiscoveryMode::Missing,
        FakeStore::default(),
    );
    let err = h
        .orchestrator
        .execute(order("1"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err, SwapError::NotFound);
    assert_eq!(h.chain.broadcast_count(), 0);
    assert!(h.store.recorded().is_empty());
}

#[tokio::test]
async fn bad_amounts_never_reach_discovery() {
    let h = healthy();
    for amount in ["0", "-1", "abc", "", "1.2.3"] {
        let err = h
            .orchestrator
            .execute(order(amount), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(
            matches!(err, SwapError::Validation { field: "amount", .. }),
            "{amount:?} gave {err:?}"
        );
    }
    assert_eq!(h.discovery.calls(), 0);
    assert_eq!(h.chain.broadcast_count(), 0);
}

#[tokio::test]
async fn bad_targets_are_rejected() {
    let h = healthy();
    for target in ["not-an-address".to_string(), format!("{NATIVE_TOKEN:#x}"), format!("{WMON_TESTNET:#x}")] {
        let mut order = order("1");
        order.to_token = target.clone();
        let err = h
            .orchestrator
            .execute(order, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(
            matches!(err, SwapError::Validation { field: "to_token", .. }),
            "{target} gave {err:?}"
        );
    }
    assert_eq!(h.discovery.calls(), 0);
}

#[tokio::test]
async fn amount_above_balance_is_refused() {
    let h = harness(
        FakeChain::new(BroadcastMode::Accept).with_balance(ether(5)),
        DiscoveryMode::Found(pool()),
        FakeStore::default(),
    );
    let err = h
        .orchestrator
        .execute(order("10"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SwapError::InvalidAmount(_)));
    assert_eq!(h.chain.broadcast_count(), 0);
}

#[tokio::test]
async fn unreachable_discovery_is_retried_then_unavailable() {
    let h = harness(
        FakeChain::new(BroadcastMode::Accept),
        DiscoveryMode::Down,
        FakeStore::default(),
    );
    let err = h
        .orchestrator
        .execute(order("1"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SwapError::Unavailable { attempts: 3, .. }));
    assert_eq!(h.discovery.calls(), 3);
    assert_eq!(h.chain.broadcast_count(), 0);
}

#[tokio::test]
async fn lost_broadcast_is_retried_then_unavailable() {
    let h = harness(
        FakeChain::new(BroadcastMode::Lost { landed: false }),
        DiscoveryMode::Found(pool()),
        FakeStore::default(),
    );
    let err = h
        .orchestrator
        .execute(order("1"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SwapError::Unavailable { attempts: 3, .. }));
    assert_eq!(h.chain.broadcast_count(), 3);
    assert!(h.store.recorded().is_empty());
}

#[tokio::test]
async fn broadcast_that_landed_despite_error_is_accepted() {
    let h = harness(
        FakeChain::new(BroadcastMode::Lost { landed: true }),
        DiscoveryMode::Found(pool()),
        FakeStore::default(),
    );
    let outcome = h
        .orchestrator
        .execute(order("1"), &CancellationToken::new())
        .await
        .expect("landed");
    assert_eq!(h.chain.broadcast_count(), 1);
    assert_eq!(h.store.recorded().len(), 1);
    assert_eq!(h.store.recorded()[0].tx_hash, outcome.result.tx_hash);
}

#[tokio::test]
async fn unknown_broadcast_outcome_is_ambiguous() {
    let h = harness(
        FakeChain::new(BroadcastMode::Ambiguous),
        DiscoveryMode::Found(pool()),
        FakeStore::default(),
    );
    let err = h
        .orchestrator
        .execute(order("1"), &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        SwapError::AmbiguousBroadcast { tx_hash, .. } => assert!(tx_hash.starts_with("0x")),
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(h.chain.broadcast_count(), 1);
    assert!(h.store.recorded().is_empty());
}

#[tokio::test]
async fn refused_resend_after_lost_broadcast_is_ambiguous() {
    let h = harness(
        FakeChain::new(BroadcastMode::LostThenRefused { landed_late: false }),
        DiscoveryMode::Found(pool()),
        FakeStore::default(),
    );
    let err = h
        .orchestrator
        .execute(order("1"), &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        SwapError::AmbiguousBroadcast { tx_hash, reason } => {
            assert!(tx_hash.starts_with("0x"));
            assert!(reason.contains("nonce too low"), "{reason}");
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(h.chain.broadcast_count(), 2);
    assert!(h.store.recorded().is_empty());
}

#[tokio::test]
async fn refused_resend_of_a_known_transaction_is_accepted() {
    let h = harness(
        FakeChain::new(BroadcastMode::LostThenRefused { landed_late: true }),
        DiscoveryMode::Found(pool()),
        FakeStore::default(),
    );
    let outcome = h
        .orchestrator
        .execute(order("1"), &CancellationToken::new())
        .await
        .expect("known to the node");
    assert_eq!(h.chain.broadcast_count(), 2);
    assert_eq!(h.store.recorded().len(), 1);
    assert_eq!(h.store.recorded()[0].tx_hash, outcome.result.tx_hash);
}

#[tokio::test]
async fn unreachable_balance_read_is_retried_then_unavailable() {
    let h = harness(
        FakeChain::new(BroadcastMode::Accept).with_balance_down(),
        DiscoveryMode::Found(pool()),
        FakeStore::default(),
    );
    let err = h
        .orchestrator
        .execute(order("1"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SwapError::Unavailable { attempts: 3, .. }), "got {err:?}");
    assert_eq!(h.chain.balance_reads(), 3);
    assert_eq!(h.chain.broadcast_count(), 0);
}

#[tokio::test]
async fn unreachable_nonce_read_releases_the_wallet_lock() {
    let h = harness(
        FakeChain::new(BroadcastMode::Accept).with_nonce_down(),
        DiscoveryMode::Found(pool()),
        FakeStore::default(),
    );
    let err = h
        .orchestrator
        .execute(order("1"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SwapError::Unavailable { attempts: 3, .. }), "got {err:?}");
    assert_eq!(h.chain.broadcast_count(), 0);
    assert_eq!(h.orchestrator.wallet_lock_count(), 0);
}

#[tokio::test]
async fn node_rejection_is_not_retried() {
    let h = harness(
        FakeChain::new(BroadcastMode::Reject),
        DiscoveryMode::Found(pool()),
        FakeStore::default(),
    );
    let err = h
        .orchestrator
        .execute(order("1"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SwapError::Rejected(ref r) if r.contains("insufficient funds")));
    assert_eq!(h.chain.broadcast_count(), 1);
    assert_eq!(h.orchestrator.wallet_lock_count(), 0);
}

#[tokio::test]
async fn failed_history_write_becomes_a_warning() {
    let h = harness(
        FakeChain::new(BroadcastMode::Accept),
        DiscoveryMode::Found(pool()),
        FakeStore::failing(),
    );
    let outcome = h
        .orchestrator
        .execute(order("1"), &CancellationToken::new())
        .await
        .expect("swap still succeeds");
    let warning = outcome.warning.expect("warning");
    assert!(warning.to_string().contains("database is locked"));
    assert_eq!(h.chain.broadcast_count(), 1);
}

#[tokio::test]
async fn cancelled_swap_is_never_broadcast() {
    let h = healthy();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = h.orchestrator.execute(order("1"), &cancel).await.unwrap_err();
    assert_eq!(err, SwapError::Cancelled);
    assert_eq!(h.chain.broadcast_count(), 0);
    assert_eq!(h.discovery.calls(), 0);
}

#[tokio::test]
async fn wallet_with_mismatched_key_is_internal() {
    let h = healthy();
    let mut order = order("1");
    order.wallet.address = Address::repeat_byte(0x01);
    let err = h
        .orchestrator
        .execute(order, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SwapError::Internal(_)));
    assert_eq!(h.chain.broadcast_count(), 0);
}

#[tokio::test]
async fn concurrent_swaps_of_one_wallet_use_distinct_nonces() {
    let h = Arc::new(healthy());
    let cancel = CancellationToken::new();
    let (a, b) = tokio::join!(
        h.orchestrator.execute(order("1"), &cancel),
        h.orchestrator.execute(order("2"), &cancel)
    );
    let (a, b) = (a.expect("first"), b.expect("second"));
    assert_ne!(a.result.tx_hash, b.result.tx_hash);

    let mut nonces: Vec<u64> = h
        .chain
        .sent()
        .iter()
        .map(|raw| decode_signed_swap(raw).expect("decodable").nonce)
        .collect();
    nonces.sort_unstable();
    assert_eq!(nonces, vec![0, 1]);
    assert_eq!(h.orchestrator.wallet_lock_count(), 0);
}

#[tokio::test]
async fn prepare_previews_without_broadcasting() {
    let h = healthy();
    let (request, unsigned) = h
        .orchestrator
        .prepare(order("10"), &CancellationToken::new())
        .await
        .expect("preview");
    assert_eq!(request.amount_in, ether(10));
    assert_eq!(unsigned.quote.min_amount_out, ether(17));
    assert_eq!(unsigned.value, ether(10));
    assert_eq!(h.chain.broadcast_count(), 0);
    assert!(h.store.recorded().is_empty());
}

#[tokio::test]
async fn tracker_settles_once_receipt_arrives() {
    let chain = Arc::new(
        FakeChain::new(BroadcastMode::Accept).with_receipts(vec![None, None, Some(true)]),
    );
    let store = Arc::new(FakeStore::default());
    let tracker = ConfirmationTracker::new(
        chain.clone(),
        store.clone(),
        Duration::from_millis(1),
        Duration::from_secs(5),
    );
    let result = SwapResult {
        tx_hash: B256::repeat_byte(0xab),
        status: SwapStatus::Pending,
        amount: ether(1),
        token_address: token(),
        user_id: 7,
        wallet_id: 1,
    };

    let status = tracker.track(result, &CancellationToken::new()).await;
    assert_eq!(status, Some(SwapStatus::Confirmed));
    let updates = store.updates.lock().unwrap().clone();
    assert_eq!(updates, vec![(B256::repeat_byte(0xab), SwapStatus::Confirmed)]);
}

#[tokio::test]
async fn tracker_gives_up_without_touching_the_row() {
    let chain = Arc::new(FakeChain::new(BroadcastMode::Accept));
    let store = Arc::new(FakeStore::default());
    let tracker = ConfirmationTracker::new(
        chain,
        store.clone(),
        Duration::from_millis(2),
        Duration::from_millis(20),
    );
    let result = SwapResult {
        tx_hash: B256::repeat_byte(0xcd),
        status: SwapStatus::Pending,
        amount: ether(1),
        token_address: token(),
        user_id: 7,
        wallet_id: 1,
    };
    assert_eq!(tracker.track(result, &CancellationToken::new()).await, None);
    assert!(store.updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn swap_history_settles_in_sqlite() {
    let db = Database::new("sqlite::memory:").await.expect("db");
    let wallet_id = db
        .create_wallet(7, "Main", wallet().address, KEY)
        .await
        .expect("wallet");
    let mut order = order("1");
    order.wallet.id = wallet_id;

    let chain = Arc::new(FakeChain::new(BroadcastMode::Accept).with_receipts(vec![Some(false)]));
    let store: Arc<dyn WalletStore> = Arc::new(db.clone());
    let orchestrator = SwapOrchestrator::new(
        chain.clone(),
        Arc::new(FakeDiscovery::new(DiscoveryMode::Found(pool()))),
        store.clone(),
        settings(),
    );
    let outcome = orchestrator
        .execute(order, &CancellationToken::new())
        .await
        .expect("swap");
    assert!(outcome.warning.is_none());

    let rows = db.recent_transactions(7, 10).await.expect("history");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, "pending");
    assert_eq!(rows[0].amount, ether(1).to_string());

    let tracker = ConfirmationTracker::new(
        chain,
        store,
        Duration::from_millis(1),
        Duration::from_secs(1),
    );
    let status = tracker
        .track(outcome.result.clone(), &CancellationToken::new())
        .await;
    assert_eq!(status, Some(SwapStatus::Failed));

    let rows = db.recent_transactions(7, 10).await.expect("history");
    assert_eq!(rows[0].status, "failed");
    assert_eq!(rows[0].tx_hash, format!("{:#x}", outcome.result.tx_hash));

    // Terminal rows do not move again.
    assert!(
        !db.update_status(outcome.result.tx_hash, SwapStatus::Confirmed)
            .await
            .expect("update")
    );
}
