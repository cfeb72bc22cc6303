//! Long-polling loop wiring Telegram updates into the relay engine.

use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {deskrelay_bridge::RelayEngine, deskrelay_config::Config};

use crate::inbound;

/// Build a `Bot` whose HTTP timeout outlives the long-poll timeout (30 s),
/// so the client never aborts a poll Telegram is still holding open.
pub fn build_bot(config: &Config) -> anyhow::Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(std::time::Duration::from_secs(45))
        .build()?;
    Ok(Bot::with_client(config.token.expose_secret(), client))
}

/// Start polling for updates. Each message is handled on its own task.
///
/// Returns a token that stops the loop when cancelled; the loop cancels it
/// itself when another instance is already polling with the same token.
pub async fn start_polling(bot: Bot, engine: Arc<RelayEngine>) -> anyhow::Result<CancellationToken> {
    let me = bot.get_me().await?;

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;
    info!(username = ?me.username, "telegram bot connected (webhook cleared)");

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            if cancel_clone.is_cancelled() {
                info!("telegram polling stopped");
                break;
            }

            let result = bot
                .get_updates()
                .offset(offset)
                .timeout(30)
                .allowed_updates(vec![AllowedUpdate::Message])
                .await;

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                let engine = Arc::clone(&engine);
                                tokio::spawn(async move {
                                    let profile = inbound::profile(&msg);
                                    if let Err(e) = engine.handle(&profile).await {
                                        error!(
                                            chat_id = msg.chat.id.0,
                                            error = %e,
                                            "relay failed for message"
                                        );
                                    }
                                });
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    // Another instance is polling with the same token; this
                    // one can never make progress.
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        error!("another bot instance is already polling with this token, stopping");
                        cancel_clone.cancel();
                        break;
                    }
                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                },
            }
        }
    });

    Ok(cancel)
}
