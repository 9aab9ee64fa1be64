// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

pub mod handlers;
pub mod messages;
pub mod session;
pub mod telegram;

use crate::common::error::AppError;
use handlers::BotContext;
use std::sync::Arc;
use std::time::Duration;
use telegram::Update;
use tokio::time::sleep;

/// Long-poll the Bot API until shutdown. Each update runs on its own task.
pub async fn run(ctx: Arc<BotContext>) -> Result<(), AppError> {
    let me = ctx.api.get_me().await?;
    tracing::info!(
        target: "bot",
        username = me.username.as_deref().unwrap_or("unknown"),
        "Bot identity confirmed"
    );

    let mut offset = 0i64;
    loop {
        let updates = tokio::select! {
            _ = ctx.shutdown.cancelled() => break,
            res = ctx.api.get_updates(offset, ctx.settings.poll_timeout_secs) => res,
        };
        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(target: "bot", error = %e, "getUpdates failed, backing off");
                tokio::select! {
                    _ = ctx.shutdown.cancelled() => break,
                    _ = sleep(Duration::from_secs(2)) => continue,
                }
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let ctx = ctx.clone();
            tokio::spawn(async move { dispatch(ctx, update).await });
        }
    }

    tracing::info!(target: "bot", "Polling stopped");
    Ok(())
}

async fn dispatch(ctx: Arc<BotContext>, update: Update) {
    let update_id = update.update_id;
    let res = if let Some(query) = update.callback_query {
        handlers::handle_callback(&ctx, query).await
    } else if let Some(message) = update.message {
        handlers::handle_message(&ctx, message).await
    } else {
        Ok(())
    };
    if let Err(e) = res {
        tracing::error!(target: "bot", update_id, error = %e, "Update handling failed");
    }
}
