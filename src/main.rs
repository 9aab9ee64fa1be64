// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use clap::Parser;
use kuruswap_bot::app::config::Settings;
use kuruswap_bot::app::logging::setup_logging;
use kuruswap_bot::domain::error::AppError;
use kuruswap_bot::infrastructure::data::db::Database;
use kuruswap_bot::infrastructure::data::store::WalletStore;
use kuruswap_bot::infrastructure::network::chain::{ChainClient, RpcChainClient};
use kuruswap_bot::infrastructure::network::pool_discovery::{KuruPoolDiscovery, PoolDiscovery};
use kuruswap_bot::services::bot::{self, handlers::BotContext, session::Sessions, telegram::TelegramApi};
use kuruswap_bot::services::swap::{ConfirmationTracker, SwapOrchestrator};
use kuruswap_bot::services::wallets::WalletService;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about = "Kuru swap bot for Monad testnet")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    /// Default slippage in basis points (overrides config/env)
    #[arg(long)]
    slippage_bps: Option<u64>,

    /// Verbose logging
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut settings = Settings::load_with_path(cli.config.as_deref())?;
    if let Some(bps) = cli.slippage_bps {
        settings.slippage_bps = bps;
    }
    settings.debug |= cli.debug;
    settings.log_json |= cli.log_json;
    settings.validate()?;

    setup_logging(
        if settings.debug { "debug" } else { "info" },
        settings.log_json,
    );

    let database_url = settings.database_url();
    let db = Database::new(&database_url).await?;
    tracing::info!(target: "config", database = %database_url, "Database ready");

    let chain_client = RpcChainClient::new(&settings.chain_settings())?;
    match chain_client.chain_id().await {
        Ok(id) if id == settings.chain_id => {
            tracing::info!(target: "config", chain_id = id, rpc = %settings.rpc_url, "RPC chain confirmed");
        }
        Ok(id) => {
            tracing::warn!(
                target: "config",
                expected = settings.chain_id,
                reported = id,
                "RPC reports a different chain id; transactions are signed for the configured one"
            );
        }
        Err(e) => {
            tracing::warn!(target: "config", error = %e, "chain_id preflight failed; continuing");
        }
    }

    let chain: Arc<dyn ChainClient> = Arc::new(chain_client);
    let discovery: Arc<dyn PoolDiscovery> =
        Arc::new(KuruPoolDiscovery::new(&settings.discovery_settings())?);
    let store: Arc<dyn WalletStore> = Arc::new(db);

    let swap_settings = settings.swap_settings();
    tracing::info!(
        target: "config",
        chain_id = swap_settings.chain_id,
        router = %swap_settings.router_address,
        slippage_bps = swap_settings.slippage_bps,
        "Swap pipeline configured"
    );
    let orchestrator = Arc::new(SwapOrchestrator::new(
        chain.clone(),
        discovery.clone(),
        store.clone(),
        swap_settings,
    ));

    let bot_settings = settings.bot_settings();
    let tracker = ConfirmationTracker::new(
        chain.clone(),
        store.clone(),
        bot_settings.receipt_poll,
        bot_settings.receipt_timeout,
    );
    let api = TelegramApi::new(&bot_settings.token, bot_settings.poll_timeout_secs)?;

    let shutdown = CancellationToken::new();
    let ctx = Arc::new(BotContext {
        api,
        wallets: WalletService::new(store),
        chain,
        discovery,
        orchestrator,
        tracker,
        sessions: Sessions::new(),
        settings: bot_settings,
        shutdown: shutdown.clone(),
    });

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(target: "bot", "Shutdown requested");
            signal_token.cancel();
        }
    });

    bot::run(ctx).await
}
