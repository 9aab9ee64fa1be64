// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, U256, address};

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_MONAD_TESTNET: u64 = 10143;
pub const MONAD_TESTNET_RPC: &str = "https://testnet-rpc.monad.xyz";
pub const MONAD_TESTNET_EXPLORER: &str = "https://testnet.monadexplorer.com";
pub const KURU_TESTNET_API: &str = "https://api.testnet.kuru.io";

/// Native MON is addressed as the zero address by the Kuru router.
pub const NATIVE_TOKEN: Address = Address::ZERO;
pub const WMON_TESTNET: Address = address!("760AfE86e5de5fa0Ee542fc7B7B713e1c5425701");
pub const KURU_ROUTER_TESTNET: Address = address!("c816865f172d640d93712C68a7E1F83F3fA63235");
pub const KURU_UTILS_TESTNET: Address = address!("9E50D9202bEc0D046a75048Be8d51bBa93386Ade");

pub const NATIVE_SYMBOL: &str = "MON";
pub const NATIVE_DECIMALS: u8 = 18;

// =============================================================================
// SWAP CONSTANTS
// =============================================================================

pub const BPS_DENOMINATOR: u64 = 10_000;
pub const DEFAULT_SLIPPAGE_BPS: u64 = 1_500;
pub const DEFAULT_GAS_LIMIT: u64 = 250_000;
pub const DEFAULT_DEADLINE_SECS: u64 = 120;

/// Fixed-point scale of prices returned by the Kuru utility contract.
pub const PRICE_SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

// =============================================================================
// WALLETS
// =============================================================================

pub const WALLET_NAME_MAX_LEN: usize = 50;
pub const DEFAULT_HISTORY_LIMIT: i64 = 10;
