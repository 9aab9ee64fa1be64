// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::app::config::BotSettings;
use crate::common::error::{AppError, SwapError};
use crate::common::parsing::parse_address_hex;
use crate::domain::model::{SwapOrder, TokenInfo, UserId};
use crate::network::chain::ChainClient;
use crate::network::pool_discovery::PoolDiscovery;
use crate::services::bot::messages::{
    self as msg, CB_BACK_TO_MENU, CB_CANCEL, CB_CANCEL_SWAP, CB_CHECK_BALANCE, CB_CONFIRM_SWAP,
    CB_CREATE_WALLET, CB_IMPORT_WALLET, CB_MANAGE_WALLETS, CB_SELECT_WALLET, CB_START_SWAP,
    CB_SWITCH_WALLET, CB_TX_HISTORY, back_keyboard, callback_id, cancel_keyboard,
    confirm_keyboard, escape_markdown, main_keyboard, wallet_details_keyboard, wallets_keyboard,
};
use crate::services::bot::session::{Conversation, Sessions, WalletAction};
use crate::services::bot::telegram::{CallbackQuery, InlineKeyboardMarkup, Message, TelegramApi};
use crate::services::swap::{ConfirmationTracker, SwapOrchestrator};
use crate::services::wallets::{WalletService, validate_wallet_name};
use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything an update handler needs. Shared by all update tasks.
pub struct BotContext {
    pub api: TelegramApi,
    pub wallets: WalletService,
    pub chain: Arc<dyn ChainClient>,
    pub discovery: Arc<dyn PoolDiscovery>,
    pub orchestrator: Arc<SwapOrchestrator>,
    pub tracker: ConfirmationTracker,
    pub sessions: Sessions,
    pub settings: BotSettings,
    pub shutdown: CancellationToken,
}

/// Where a reply goes: a fresh message, or an edit of the message that
/// carried the pressed button.
#[derive(Debug, Clone, Copy)]
struct Reply {
    chat_id: i64,
    edit: Option<i64>,
}

impl BotContext {
    async fn reply(&self, to: Reply, text: &str, markup: &InlineKeyboardMarkup) -> Result<(), AppError> {
        match to.edit {
            Some(message_id) => {
                self.api
                    .edit_message(to.chat_id, message_id, text, Some(markup))
                    .await
            }
            None => self
                .api
                .send_message(to.chat_id, text, Some(markup))
                .await
                .map(|_| ()),
        }
    }

    async fn native_balance(&self, address: Address) -> Option<U256> {
        match self.chain.balance(address).await {
            Ok(b) => Some(b),
            Err(e) => {
                tracing::warn!(target: "bot", %address, error = %e, "Balance lookup failed");
                None
            }
        }
    }
}

pub async fn handle_message(ctx: &BotContext, message: Message) -> Result<(), AppError> {
    let Some(user) = message.from.clone() else {
        return Ok(());
    };
    if user.is_bot {
        return Ok(());
    }
    let Some(text) = message.text.as_deref().map(str::trim) else {
        return Ok(());
    };
    let to = Reply {
        chat_id: message.chat.id,
        edit: None,
    };

    match text.split_whitespace().next().unwrap_or_default() {
        "/start" => {
            ctx.sessions.reset(user.id);
            ctx.wallets.register_user(user.id, user.display_name()).await?;
            return ctx.reply(to, &msg::welcome(&user.first_name), &main_keyboard()).await;
        }
        "/menu" | "/cancel" => {
            ctx.sessions.reset(user.id);
            return ctx.reply(to, msg::menu(), &main_keyboard()).await;
        }
        _ => {}
    }

    match ctx.sessions.get(user.id) {
        Conversation::AwaitingWalletName(action) => {
            on_wallet_name(ctx, to, user.id, action, text).await
        }
        Conversation::AwaitingPrivateKey { wallet_name } => {
            // Best effort: the key should not linger in the chat.
            if let Err(e) = ctx.api.delete_message(message.chat.id, message.message_id).await {
                tracing::debug!(target: "bot", error = %e, "Could not delete key message");
            }
            on_private_key(ctx, to, user.id, &wallet_name, text).await
        }
        Conversation::AwaitingTokenAddress => on_token_address(ctx, to, user.id, text).await,
        Conversation::AwaitingSwapAmount { token } => {
            on_swap_amount(ctx, to, user.id, token, text).await
        }
        Conversation::ConfirmingSwap { .. } | Conversation::Idle => {
            ctx.reply(to, msg::menu(), &main_keyboard()).await
        }
    }
}

async fn on_wallet_name(
    ctx: &BotContext,
    to: Reply,
    user_id: UserId,
    action: WalletAction,
    text: &str,
) -> Result<(), AppError> {
    let name = match validate_wallet_name(text) {
        Ok(name) => name,
        Err(_) => {
            return ctx
                .reply(
                    to,
                    "❌ *Invalid wallet name!*\n\nWallet name must be between 1 and 50 characters.\n\nPlease try again:",
                    &cancel_keyboard(),
                )
                .await;
        }
    };

    match action {
        WalletAction::Create => {
            ctx.sessions.reset(user_id);
            match ctx.wallets.create_wallet(user_id, &name).await {
                Ok(created) => {
                    ctx.reply(
                        to,
                        &msg::wallet_created(&created.summary, &created.private_key),
                        &back_keyboard(),
                    )
                    .await
                }
                Err(e) => {
                    tracing::error!(target: "bot", user_id, error = %e, "Wallet creation failed");
                    ctx.reply(
                        to,
                        "❌ *Error creating wallet.* Please try again later.",
                        &back_keyboard(),
                    )
                    .await
                }
            }
        }
        WalletAction::Import => {
            let prompt = format!(
                "📥 *Import Wallet: {}*\n\nNow please send your private key (0x followed by 64 hex characters).\n\n\
                 ⚠️ *Security Warning*: Make sure you're in a private chat. Your message will be deleted.",
                escape_markdown(&name)
            );
            ctx.sessions
                .set(user_id, Conversation::AwaitingPrivateKey { wallet_name: name });
            ctx.reply(to, &prompt, &cancel_keyboard()).await
        }
    }
}

async fn on_private_key(
    ctx: &BotContext,
    to: Reply,
    user_id: UserId,
    wallet_name: &str,
    text: &str,
) -> Result<(), AppError> {
    match ctx.wallets.import_wallet(user_id, wallet_name, text).await {
        Ok(summary) => {
            ctx.sessions.reset(user_id);
            ctx.reply(to, &msg::wallet_imported(&summary), &back_keyboard())
                .await
        }
        Err(AppError::Validation { message, .. }) => {
            ctx.reply(
                to,
                &format!(
                    "❌ *Invalid private key!*\n\n{}\n\nPlease try again:",
                    escape_markdown(&message)
                ),
                &cancel_keyboard(),
            )
            .await
        }
        Err(e) => {
            tracing::error!(target: "bot", user_id, error = %e, "Wallet import failed");
            ctx.sessions.reset(user_id);
            ctx.reply(
                to,
                "❌ *Error importing wallet.* Please try again later.",
                &back_keyboard(),
            )
            .await
        }
    }
}

async fn on_token_address(
    ctx: &BotContext,
    to: Reply,
    user_id: UserId,
    text: &str,
) -> Result<(), AppError> {
    let swap = ctx.orchestrator.settings();
    let Some(token_address) = parse_address_hex(text) else {
        return ctx
            .reply(
                to,
                "❌ *Invalid token address!* Please send a valid address.",
                &cancel_keyboard(),
            )
            .await;
    };
    if token_address == swap.native_token || token_address == swap.wrapped_native_token {
        return ctx
            .reply(
                to,
                "❌ *Pick a token other than MON or WMON.*",
                &cancel_keyboard(),
            )
            .await;
    }

    let token = match ctx.chain.token_info(token_address).await {
        Ok(token) => token,
        Err(e) => {
            tracing::debug!(target: "bot", token = %token_address, error = %e, "Token metadata lookup failed");
            return ctx
                .reply(
                    to,
                    "❌ *Invalid token!* Could not fetch token information. Please make sure the address is correct.",
                    &cancel_keyboard(),
                )
                .await;
        }
    };

    let pool = match ctx.discovery.find_pool(swap.native_token, token_address).await {
        Ok(Some(pool)) => pool,
        Ok(None) => {
            ctx.sessions.reset(user_id);
            let text = format!(
                "❌ *No trading pool found!*\n\nToken: *{} ({})*\nAddress: `{}`\n\nThis token cannot be traded on KuruSwap yet.",
                escape_markdown(&token.name),
                escape_markdown(&token.symbol),
                token.address
            );
            return ctx.reply(to, &text, &back_keyboard()).await;
        }
        Err(e) => {
            ctx.sessions.reset(user_id);
            return ctx.reply(to, &msg::swap_error(&e), &back_keyboard()).await;
        }
    };

    let Some(wallet) = ctx.wallets.active(user_id).await? else {
        ctx.sessions.reset(user_id);
        return ctx
            .reply(to, "❌ *No active wallet found!*", &back_keyboard())
            .await;
    };
    let balance = ctx.native_balance(wallet.address).await.unwrap_or_default();
    let text = msg::token_found(&token, pool.address, &wallet.name, balance);
    ctx.sessions
        .set(user_id, Conversation::AwaitingSwapAmount { token });
    ctx.reply(to, &text, &cancel_keyboard()).await
}

async fn on_swap_amount(
    ctx: &BotContext,
    to: Reply,
    user_id: UserId,
    token: TokenInfo,
    text: &str,
) -> Result<(), AppError> {
    let Some(wallet) = ctx.wallets.active(user_id).await? else {
        ctx.sessions.reset(user_id);
        return ctx
            .reply(to, "❌ *No active wallet found!*", &back_keyboard())
            .await;
    };
    let swap = ctx.orchestrator.settings();
    let order = SwapOrder {
        user_id,
        wallet,
        from_token: swap.native_token,
        to_token: format!("{:#x}", token.address),
        amount: text.to_string(),
        slippage_bps: swap.slippage_bps,
    };

    match ctx.orchestrator.prepare(order, &ctx.shutdown).await {
        Ok((_, unsigned)) => {
            let quote = &unsigned.quote;
            let prompt = msg::confirm_swap(
                text,
                &token,
                quote.amount_out,
                quote.min_amount_out,
                quote.slippage_bps,
            );
            ctx.sessions.set(
                user_id,
                Conversation::ConfirmingSwap {
                    token,
                    amount: text.to_string(),
                },
            );
            ctx.reply(to, &prompt, &confirm_keyboard()).await
        }
        // Let the user correct the amount.
        Err(e @ (SwapError::Validation { .. } | SwapError::InvalidAmount(_))) => {
            ctx.reply(to, &msg::swap_error(&e), &cancel_keyboard()).await
        }
        Err(e) => {
            ctx.sessions.reset(user_id);
            ctx.reply(to, &msg::swap_error(&e), &back_keyboard()).await
        }
    }
}

pub async fn handle_callback(ctx: &Arc<BotContext>, query: CallbackQuery) -> Result<(), AppError> {
    if let Err(e) = ctx.api.answer_callback(&query.id).await {
        tracing::debug!(target: "bot", error = %e, "answerCallbackQuery failed");
    }
    let user = &query.from;
    let data = query.data.as_deref().unwrap_or_default();
    let to = Reply {
        chat_id: query.message.as_ref().map_or(user.id, |m| m.chat.id),
        edit: query.message.as_ref().map(|m| m.message_id),
    };
    tracing::debug!(target: "bot", user_id = user.id, data, "Callback");

    match data {
        CB_CREATE_WALLET | CB_IMPORT_WALLET => {
            ctx.wallets.register_user(user.id, user.display_name()).await?;
            let (action, text) = if data == CB_CREATE_WALLET {
                (
                    WalletAction::Create,
                    "🔐 *Create New Wallet*\n\nPlease send a name for your new wallet.\n\nExamples: `Main Wallet`, `Trading Wallet`, `Savings`",
                )
            } else {
                (
                    WalletAction::Import,
                    "📥 *Import Existing Wallet*\n\nPlease send a name for your imported wallet.\n\nExamples: `Imported Wallet`, `MetaMask Wallet`",
                )
            };
            ctx.sessions
                .set(user.id, Conversation::AwaitingWalletName(action));
            ctx.reply(to, text, &cancel_keyboard()).await
        }
        CB_MANAGE_WALLETS => {
            let wallets = ctx.wallets.list(user.id).await?;
            if wallets.is_empty() {
                return ctx
                    .reply(
                        to,
                        "👛 *No wallets found!*\n\nCreate or import a wallet first.",
                        &back_keyboard(),
                    )
                    .await;
            }
            ctx.reply(
                to,
                "👛 *Your Wallets*\n\nSelect a wallet to view details or switch to it:",
                &wallets_keyboard(&wallets),
            )
            .await
        }
        CB_CHECK_BALANCE => {
            let Some(wallet) = ctx.wallets.active(user.id).await? else {
                return ctx
                    .reply(
                        to,
                        "❌ *No active wallet found!* Please create a wallet first.",
                        &back_keyboard(),
                    )
                    .await;
            };
            match ctx.native_balance(wallet.address).await {
                Some(balance) => {
                    let text = msg::balance(
                        &wallet.name,
                        wallet.address,
                        balance,
                        &ctx.settings.address_explorer,
                    );
                    ctx.reply(to, &text, &back_keyboard()).await
                }
                None => {
                    ctx.reply(
                        to,
                        "❌ *Error checking balance.* Please try again later.",
                        &back_keyboard(),
                    )
                    .await
                }
            }
        }
        CB_START_SWAP => {
            let Some(wallet) = ctx.wallets.active(user.id).await? else {
                return ctx
                    .reply(
                        to,
                        "❌ *No active wallet found!* Please create a wallet first.",
                        &back_keyboard(),
                    )
                    .await;
            };
            let balance = ctx.native_balance(wallet.address).await.unwrap_or_default();
            if balance.is_zero() {
                let text = format!(
                    "❌ *Insufficient Balance!*\n\n*Wallet:* {}\n*Balance:* `{}`\n\nPlease deposit some MON to your wallet first.",
                    escape_markdown(&wallet.name),
                    msg::mon(balance)
                );
                return ctx.reply(to, &text, &back_keyboard()).await;
            }
            ctx.sessions.set(user.id, Conversation::AwaitingTokenAddress);
            let text = format!(
                "🔄 *Start Token Swap*\n\n*Active Wallet:* {}\n*Balance:* `{}`\n\n\
                 Please send me the *token contract address* you want to swap to.",
                escape_markdown(&wallet.name),
                msg::mon(balance)
            );
            ctx.reply(to, &text, &cancel_keyboard()).await
        }
        CB_TX_HISTORY => {
            let records = ctx
                .wallets
                .history(user.id, ctx.settings.history_limit)
                .await?;
            ctx.reply(
                to,
                &msg::history(&records, &ctx.settings.tx_explorer),
                &back_keyboard(),
            )
            .await
        }
        CB_CONFIRM_SWAP => confirm_swap(ctx, to, user.id).await,
        CB_CANCEL_SWAP => {
            ctx.sessions.reset(user.id);
            ctx.reply(to, &msg::swap_error(&SwapError::Cancelled), &back_keyboard())
                .await
        }
        CB_BACK_TO_MENU | CB_CANCEL => {
            ctx.sessions.reset(user.id);
            ctx.reply(to, msg::menu(), &main_keyboard()).await
        }
        other => {
            if let Some(wallet_id) = callback_id(other, CB_SELECT_WALLET) {
                return select_wallet(ctx, to, user.id, wallet_id).await;
            }
            if let Some(wallet_id) = callback_id(other, CB_SWITCH_WALLET) {
                let text = match ctx.wallets.switch(user.id, wallet_id).await? {
                    Some(w) => format!(
                        "✅ *Wallet switched successfully!*\n\nActive wallet is now: *{}*\n\n*Address:* `{}`",
                        escape_markdown(&w.name),
                        w.address
                    ),
                    None => "❌ *Error switching wallet.*".to_string(),
                };
                return ctx.reply(to, &text, &back_keyboard()).await;
            }
            tracing::debug!(target: "bot", data = other, "Unknown callback");
            Ok(())
        }
    }
}

async fn select_wallet(
    ctx: &BotContext,
    to: Reply,
    user_id: UserId,
    wallet_id: i64,
) -> Result<(), AppError> {
    let Some(wallet) = ctx.wallets.find(user_id, wallet_id).await? else {
        return ctx
            .reply(to, "❌ *Wallet not found!*", &back_keyboard())
            .await;
    };
    match ctx.native_balance(wallet.address).await {
        Some(balance) => {
            let text = msg::wallet_details(&wallet, balance, &ctx.settings.address_explorer);
            ctx.reply(to, &text, &wallet_details_keyboard(&wallet)).await
        }
        None => {
            ctx.reply(
                to,
                "❌ *Error loading wallet details.*",
                &back_keyboard(),
            )
            .await
        }
    }
}

async fn confirm_swap(ctx: &Arc<BotContext>, to: Reply, user_id: UserId) -> Result<(), AppError> {
    let Some((token, amount)) = ctx.sessions.take_confirmation(user_id) else {
        return ctx
            .reply(
                to,
                "❌ *Nothing to confirm.* Please start the swap again.",
                &back_keyboard(),
            )
            .await;
    };
    let Some(wallet) = ctx.wallets.active(user_id).await? else {
        return ctx
            .reply(
                to,
                "❌ *Error:* No active wallet found. Please create a wallet first.",
                &back_keyboard(),
            )
            .await;
    };

    let processing = format!(
        "⏳ *Processing your swap...*\n\nSwapping `{} MON` to {}...\nPlease wait, this may take a few moments.",
        msg::code_span(amount.trim()),
        escape_markdown(&token.symbol)
    );
    ctx.reply(to, &processing, &InlineKeyboardMarkup::default())
        .await?;

    let swap = ctx.orchestrator.settings();
    let order = SwapOrder {
        user_id,
        wallet,
        from_token: swap.native_token,
        to_token: format!("{:#x}", token.address),
        amount,
        slippage_bps: swap.slippage_bps,
    };
    let cancel = ctx.shutdown.child_token();

    match ctx.orchestrator.execute(order, &cancel).await {
        Ok(outcome) => {
            // The transaction is on the wire: tracking must not depend on
            // the chat reply going through.
            let tracked = ctx.clone();
            let result = outcome.result.clone();
            tokio::spawn(async move {
                let tx = format!("{:#x}", result.tx_hash);
                if let Some(status) = tracked.tracker.track(result, &tracked.shutdown).await {
                    let text = msg::swap_settled(&tx, status, &tracked.settings.tx_explorer);
                    if let Err(e) = tracked.api.send_message(to.chat_id, &text, None).await {
                        tracing::warn!(target: "bot", error = %e, "Settlement notice not delivered");
                    }
                }
            });

            let text = msg::swap_sent(&outcome, &token, &ctx.settings.tx_explorer);
            ctx.reply(to, &text, &back_keyboard()).await
        }
        Err(e) => ctx.reply(to, &msg::swap_error(&e), &back_keyboard()).await,
    }
}
