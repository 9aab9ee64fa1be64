// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::SwapError;
use crate::common::parsing::format_amount;
use crate::data::schema::TransactionRecord;
use crate::domain::constants::{NATIVE_DECIMALS, NATIVE_SYMBOL};
use crate::domain::model::{SwapOutcome, SwapStatus, TokenInfo, WalletSummary};
use crate::services::bot::telegram::{InlineKeyboardButton, InlineKeyboardMarkup};
use alloy::primitives::{Address, U256};

pub const CB_CREATE_WALLET: &str = "create_wallet";
pub const CB_IMPORT_WALLET: &str = "import_wallet";
pub const CB_MANAGE_WALLETS: &str = "manage_wallets";
pub const CB_CHECK_BALANCE: &str = "check_balance";
pub const CB_START_SWAP: &str = "start_swap";
pub const CB_TX_HISTORY: &str = "tx_history";
pub const CB_BACK_TO_MENU: &str = "back_to_menu";
pub const CB_CANCEL: &str = "cancel";
pub const CB_CONFIRM_SWAP: &str = "confirm_swap";
pub const CB_CANCEL_SWAP: &str = "cancel_swap";
pub const CB_SELECT_WALLET: &str = "select_wallet_";
pub const CB_SWITCH_WALLET: &str = "switch_wallet_";

/// Escape user-controlled text for legacy Markdown.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Text placed between backticks. Legacy Markdown does not unescape inside
/// code, so only the closing backtick has to go.
pub fn code_span(text: &str) -> String {
    text.replace('`', "'")
}

pub fn mon(value: U256) -> String {
    format!("{} {NATIVE_SYMBOL}", format_amount(value, NATIVE_DECIMALS, 6))
}

fn button(text: &str, data: impl Into<String>) -> InlineKeyboardButton {
    InlineKeyboardButton {
        text: text.to_string(),
        callback_data: data.into(),
    }
}

pub fn main_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![
                button("🔐 Create Wallet", CB_CREATE_WALLET),
                button("📥 Import Wallet", CB_IMPORT_WALLET),
            ],
            vec![button("👛 Manage Wallets", CB_MANAGE_WALLETS)],
            vec![
                button("💰 Check Balance", CB_CHECK_BALANCE),
                button("🔄 Swap Tokens", CB_START_SWAP),
            ],
            vec![button("📊 Transaction History", CB_TX_HISTORY)],
        ],
    }
}

pub fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![button("🏠 Back to Menu", CB_BACK_TO_MENU)]],
    }
}

pub fn cancel_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![button("❌ Cancel", CB_CANCEL)],
            vec![button("🏠 Back to Menu", CB_BACK_TO_MENU)],
        ],
    }
}

pub fn confirm_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![button("✅ Confirm Swap", CB_CONFIRM_SWAP)],
            vec![button("❌ Cancel", CB_CANCEL_SWAP)],
            vec![button("🏠 Back to Menu", CB_BACK_TO_MENU)],
        ],
    }
}

pub fn wallets_keyboard(wallets: &[WalletSummary]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = wallets
        .iter()
        .map(|w| {
            let status = if w.is_active { "🟢 Active" } else { "⚪ Inactive" };
            vec![button(
                &format!("{status} {}", w.name),
                format!("{CB_SELECT_WALLET}{}", w.id),
            )]
        })
        .collect();
    rows.push(vec![button("🏠 Back to Menu", CB_BACK_TO_MENU)]);
    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}

pub fn wallet_details_keyboard(wallet: &WalletSummary) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if !wallet.is_active {
        rows.push(vec![button(
            "🔄 Switch to this wallet",
            format!("{CB_SWITCH_WALLET}{}", wallet.id),
        )]);
    }
    rows.push(vec![button("👛 Back to Wallets", CB_MANAGE_WALLETS)]);
    rows.push(vec![button("🏠 Back to Menu", CB_BACK_TO_MENU)]);
    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}

/// Parse `<prefix><id>` callback payloads.
pub fn callback_id(data: &str, prefix: &str) -> Option<i64> {
    data.strip_prefix(prefix)?.parse().ok()
}

pub fn welcome(first_name: &str) -> String {
    format!(
        "🚀 *Welcome to KuruSwap Bot!* 🚀\n\n\
         Hello {}! I'm your personal KuruSwap assistant on Monad Testnet.\n\n\
         *What I can do:*\n\
         • Create or import wallets\n\
         • Check your {NATIVE_SYMBOL} balance\n\
         • Swap {NATIVE_SYMBOL} to any token with a Kuru market\n\
         • Track your transaction history\n\n\
         *Getting Started:*\n\
         1. Create a wallet first\n\
         2. Deposit some {NATIVE_SYMBOL}\n\
         3. Start swapping!\n\n\
         ⚠️ *Important:* This bot operates on Monad Testnet. Use only testnet tokens!",
        escape_markdown(first_name)
    )
}

pub fn menu() -> &'static str {
    "🏠 *Main Menu*\n\nChoose an option:"
}

pub fn address_link(explorer: &str, address: Address) -> String {
    format!("{explorer}{address}")
}

pub fn tx_link(explorer: &str, tx_hash: &str) -> String {
    format!("{explorer}{tx_hash}")
}

pub fn balance(name: &str, address: Address, balance: U256, explorer: &str) -> String {
    format!(
        "💰 *Balance - {}*\n\n*Address:* `{address}`\n*{NATIVE_SYMBOL} Balance:* `{}`\n\n🔗 [View on Explorer]({})",
        escape_markdown(name),
        mon(balance),
        address_link(explorer, address)
    )
}

pub fn wallet_details(wallet: &WalletSummary, balance: U256, explorer: &str) -> String {
    let status = if wallet.is_active {
        "🟢 *Active Wallet*"
    } else {
        "⚪ Inactive"
    };
    format!(
        "👛 *{}*\n\n{status}\n\n*Address:* `{}`\n*Balance:* `{}`\n\n🔗 [View on Explorer]({})",
        escape_markdown(&wallet.name),
        wallet.address,
        mon(balance),
        address_link(explorer, wallet.address)
    )
}

pub fn wallet_created(wallet: &WalletSummary, private_key: &str) -> String {
    format!(
        "🎉 *Wallet Created Successfully!*\n\n*Name:* {}\n*Address:* `{}`\n\n🔑 *Private Key:* `{private_key}`\n\n\
         ⚠️ *IMPORTANT:* Save your private key securely! I'll remember it for you, but you should back it up.\n\n\
         💰 *Next Step:* Send some {NATIVE_SYMBOL} to your address to start swapping!",
        escape_markdown(&wallet.name),
        wallet.address
    )
}

pub fn wallet_imported(wallet: &WalletSummary) -> String {
    format!(
        "🎉 *Wallet Imported Successfully!*\n\n*Name:* {}\n*Address:* `{}`\n\n\
         ✅ Your wallet has been imported and is ready to use.",
        escape_markdown(&wallet.name),
        wallet.address
    )
}

pub fn token_found(token: &TokenInfo, pool: Address, wallet_name: &str, balance: U256) -> String {
    format!(
        "✅ *Token Found!*\n\n*Token:* {} ({})\n*Address:* `{}`\n*Pool:* `{pool}`\n\n\
         *Active Wallet:* {}\n*{NATIVE_SYMBOL} Balance:* `{}`\n\n\
         💡 *How much {NATIVE_SYMBOL} do you want to swap?*\nPlease enter the amount (e.g., 0.1, 1.5, 10):",
        escape_markdown(&token.name),
        escape_markdown(&token.symbol),
        token.address,
        escape_markdown(wallet_name),
        mon(balance)
    )
}

pub fn confirm_swap(
    amount: &str,
    token: &TokenInfo,
    expected_out: U256,
    min_out: U256,
    slippage_bps: u64,
) -> String {
    format!(
        "🔄 *Confirm Your Swap*\n\n*From:* `{} {NATIVE_SYMBOL}`\n*To:* {} ({})\n*Token Address:* `{}`\n\n\
         *Expected:* `{} {}`\n*Minimum:* `{} {}`\n⚠️ *Slippage:* {}%\n\n*Are you sure you want to proceed?*",
        code_span(amount.trim()),
        escape_markdown(&token.name),
        escape_markdown(&token.symbol),
        token.address,
        format_amount(expected_out, token.decimals, 6),
        code_span(&token.symbol),
        format_amount(min_out, token.decimals, 6),
        code_span(&token.symbol),
        format_amount(U256::from(slippage_bps), 2, 2)
    )
}

pub fn swap_sent(outcome: &SwapOutcome, token: &TokenInfo, explorer: &str) -> String {
    let tx = format!("{:#x}", outcome.result.tx_hash);
    let mut text = format!(
        "🎉 *Swap Transaction Sent!*\n\n*Amount:* `{}`\n*Token:* {} ({})\n*Minimum received:* `{}`\n\
         *Transaction Hash:* `{tx}`\n\n🔗 [View on Explorer]({})\n\n⏳ *Status:* Pending confirmation...",
        mon(outcome.quote.amount_in),
        escape_markdown(&token.name),
        escape_markdown(&token.symbol),
        format_amount(outcome.quote.min_amount_out, token.decimals, 6),
        tx_link(explorer, &tx)
    );
    if let Some(warning) = &outcome.warning {
        text.push_str(&format!(
            "\n\n⚠️ The swap was sent but could not be saved to your history ({}).",
            escape_markdown(&warning.0)
        ));
    }
    text
}

pub fn swap_settled(tx_hash: &str, status: SwapStatus, explorer: &str) -> String {
    let headline = match status {
        SwapStatus::Confirmed => "✅ *Swap confirmed!*",
        SwapStatus::Failed => "❌ *Swap reverted on chain.*",
        SwapStatus::Pending => "⏳ *Swap still pending.*",
    };
    format!(
        "{headline}\n\n`{tx_hash}`\n🔗 [View on Explorer]({})",
        tx_link(explorer, tx_hash)
    )
}

/// One user-facing message per pipeline failure.
pub fn swap_error(err: &SwapError) -> String {
    match err {
        SwapError::Validation { field, message } => format!(
            "❌ *Invalid {}:* {}",
            escape_markdown(field),
            escape_markdown(message)
        ),
        SwapError::NotFound => {
            "❌ *No trading pool found!*\n\nThis token cannot be traded on KuruSwap yet.".into()
        }
        SwapError::InvalidAmount(reason) => format!(
            "❌ *Invalid amount:* {}\n\nPlease enter a smaller amount.",
            escape_markdown(reason)
        ),
        SwapError::Transient(_) | SwapError::Unavailable { .. } | SwapError::Api { .. } => {
            "⚠️ *Service temporarily unavailable.* Please try again in a moment.".into()
        }
        SwapError::Rejected(reason) => format!(
            "❌ *Transaction rejected by the network:*\n`{}`",
            code_span(reason)
        ),
        SwapError::AmbiguousBroadcast { tx_hash, .. } => format!(
            "⚠️ *Swap status unknown.*\n\nThe transaction `{tx_hash}` may or may not have been sent. \
             *Do not resubmit*; check the explorer before trying again."
        ),
        SwapError::Expired => "⌛ *Quote expired.* Please start the swap again.".into(),
        SwapError::Cancelled => {
            "❌ *Swap Cancelled*\n\nYour swap has been cancelled. No tokens were exchanged.".into()
        }
        SwapError::Internal(_) => {
            "❌ *Something went wrong with your wallet data.* Please contact support.".into()
        }
    }
}

pub fn history(records: &[TransactionRecord], explorer: &str) -> String {
    if records.is_empty() {
        return "📊 *Transaction History*\n\nNo transactions yet.".into();
    }
    let mut text = String::from("📊 *Transaction History*\n");
    for rec in records {
        let icon = match rec.swap_status() {
            SwapStatus::Pending => "⏳",
            SwapStatus::Confirmed => "✅",
            SwapStatus::Failed => "❌",
        };
        let amount = rec
            .amount
            .parse::<U256>()
            .map(mon)
            .unwrap_or_else(|_| code_span(&rec.amount));
        let when = rec
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let short = rec.tx_hash.get(..10).unwrap_or(&rec.tx_hash);
        text.push_str(&format!(
            "\n{icon} {when} {} `{amount}` → `{}`\n[{short}…]({})\n",
            escape_markdown(&rec.tx_type),
            code_span(&rec.token_address),
            tx_link(explorer, &rec.tx_hash)
        ));
    }
    text
}
