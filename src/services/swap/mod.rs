// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod builder;
pub mod confirmation;
pub mod orchestrator;
pub mod signer;

pub use builder::{SwapBuilder, UnsignedSwap};
pub use confirmation::ConfirmationTracker;
pub use orchestrator::SwapOrchestrator;
