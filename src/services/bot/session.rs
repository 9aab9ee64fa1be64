// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::model::{TokenInfo, UserId};
use dashmap::DashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletAction {
    Create,
    Import,
}

/// Where a user is inside a multi-message flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Conversation {
    #[default]
    Idle,
    AwaitingWalletName(WalletAction),
    AwaitingPrivateKey { wallet_name: String },
    AwaitingTokenAddress,
    AwaitingSwapAmount { token: TokenInfo },
    ConfirmingSwap { token: TokenInfo, amount: String },
}

/// Per-user conversation state. Updates of one user may be handled on
/// different tasks, so every transition goes through the map.
#[derive(Debug, Default)]
pub struct Sessions {
    states: DashMap<UserId, Conversation>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: UserId) -> Conversation {
        self.states
            .get(&user_id)
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn set(&self, user_id: UserId, state: Conversation) {
        if state == Conversation::Idle {
            self.states.remove(&user_id);
        } else {
            self.states.insert(user_id, state);
        }
    }

    pub fn reset(&self, user_id: UserId) {
        self.states.remove(&user_id);
    }

    /// Take the pending swap, leaving the user idle. A second confirm on the
    /// same prompt finds nothing.
    pub fn take_confirmation(&self, user_id: UserId) -> Option<(TokenInfo, String)> {
        let (_, state) = self
            .states
            .remove_if(&user_id, |_, s| matches!(s, Conversation::ConfirmingSwap { .. }))?;
        match state {
            Conversation::ConfirmingSwap { token, amount } => Some((token, amount)),
            _ => None,
        }
    }
}
