//! Countdown promotion lifecycle in the group thread

use anyhow::Result;
use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{debug, error, info};

use super::AppState;
use crate::localization::t_lang;
use crate::promo::Promo;

/// Publish the promotion text into the thread and pin it
///
/// Starts the countdown and records the message id; send and pin failures
/// are logged and the promotion stays active.
pub async fn send_initial_messages(bot: &Bot, state: &AppState, promo: &mut Promo) {
    let chat_id = state.target_chat();
    let thread_id = state.config.thread_id;
    promo.start(Utc::now());
    let text = promo.render(Utc::now());

    match bot
        .send_message(chat_id, text)
        .message_thread_id(state.target_thread())
        .await
    {
        Ok(message) => {
            promo.record_message(thread_id, message.id.0);
            if let Err(e) = bot
                .pin_chat_message(chat_id, message.id)
                .disable_notification(true)
                .await
            {
                error!(chat_id = %chat_id, message_id = message.id.0, error = %e, "Failed to pin promotion message");
            }
            info!(chat_id = %chat_id, thread_id, message_id = message.id.0, "Promotion published");
        }
        Err(e) => {
            error!(chat_id = %chat_id, thread_id, error = %e, "Failed to publish promotion message");
        }
    }
}

/// Delete every published promotion message
pub async fn retract_messages(bot: &Bot, state: &AppState, promo: &Promo) {
    let chat_id = state.target_chat();
    for &message_id in promo.messages.values() {
        if let Err(e) = bot.delete_message(chat_id, MessageId(message_id)).await {
            error!(chat_id = %chat_id, message_id, error = %e, "Failed to delete promotion message");
        }
    }
}

/// Remove the promotion message, announce the end and mark it inactive
pub async fn finish_promo(bot: &Bot, state: &AppState, promo: &mut Promo) {
    let chat_id = state.target_chat();
    let thread_id = state.config.thread_id;

    retract_messages(bot, state, promo).await;

    if let Err(e) = bot
        .send_message(chat_id, t_lang("promo-finished", None))
        .message_thread_id(state.target_thread())
        .await
    {
        error!(chat_id = %chat_id, thread_id, error = %e, "Failed to announce promotion end");
    }

    promo.stop();
    info!(chat_id = %chat_id, "Promotion finished");
}

/// One countdown step: finish an expired promotion or refresh its messages
pub async fn tick(bot: &Bot, state: &AppState) -> Result<()> {
    let mut data = state.promo.lock().await;
    let Some(promo) = data.promo.as_mut() else {
        return Ok(());
    };
    if !promo.active {
        return Ok(());
    }

    let now = Utc::now();
    if promo.is_expired(now) {
        finish_promo(bot, state, promo).await;
        state.save_promo(&data);
        return Ok(());
    }

    let text = promo.render(now);
    for (thread, message_id) in &promo.messages {
        match bot
            .edit_message_text(state.target_chat(), MessageId(*message_id), text.clone())
            .await
        {
            Ok(_) => debug!(thread = %thread, message_id, "Promotion countdown updated"),
            Err(e) => error!(thread = %thread, message_id, error = %e, "Failed to update promotion message"),
        }
    }
    Ok(())
}

/// Republish an active promotion that lost its messages, after a restart
pub async fn restore_active(bot: &Bot, state: &AppState) {
    let mut data = state.promo.lock().await;
    let Some(promo) = data.promo.as_mut() else {
        info!("No active promotion to restore");
        return;
    };
    if !promo.active {
        info!("No active promotion to restore");
        return;
    }

    info!("Restoring active promotion after restart");
    if promo.messages.is_empty() {
        info!("Promotion messages missing, publishing again");
        send_initial_messages(bot, state, promo).await;
        state.save_promo(&data);
    }
}
