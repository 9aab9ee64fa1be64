// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::data::store::WalletStore;
use crate::domain::model::{SwapResult, SwapStatus};
use crate::network::chain::ChainClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// Polls receipts of broadcast swaps and settles their stored status.
#[derive(Clone)]
pub struct ConfirmationTracker {
    chain: Arc<dyn ChainClient>,
    store: Arc<dyn WalletStore>,
    poll_interval: Duration,
    timeout: Duration,
}

impl ConfirmationTracker {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        store: Arc<dyn WalletStore>,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            chain,
            store,
            poll_interval,
            timeout,
        }
    }

    /// Wait for the receipt of `result`. Returns the terminal status, or
    /// `None` when the receipt did not show up in time (the row stays pending).
    pub async fn track(
        &self,
        mut result: SwapResult,
        cancel: &CancellationToken,
    ) -> Option<SwapStatus> {
        let started = Instant::now();
        loop {
            match self.chain.receipt_status(result.tx_hash).await {
                Ok(Some(success)) => {
                    if !result.settle(success) {
                        return Some(result.status);
                    }
                    match self.store.update_status(result.tx_hash, result.status).await {
                        Ok(true) => {}
                        Ok(false) => tracing::debug!(
                            target: "confirmation",
                            tx = %result.tx_hash,
                            "Stored status already terminal"
                        ),
                        Err(e) => tracing::warn!(
                            target: "confirmation",
                            tx = %result.tx_hash,
                            error = %e,
                            "Failed to persist swap status"
                        ),
                    }
                    tracing::info!(
                        target: "confirmation",
                        tx = %result.tx_hash,
                        status = %result.status,
                        "Swap settled"
                    );
                    return Some(result.status);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(target: "confirmation", tx = %result.tx_hash, error = %e, "Receipt poll failed");
                }
            }

            if started.elapsed() >= self.timeout {
                tracing::warn!(
                    target: "confirmation",
                    tx = %result.tx_hash,
                    waited_ms = started.elapsed().as_millis() as u64,
                    "No receipt before timeout"
                );
                return None;
            }
            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }
}
