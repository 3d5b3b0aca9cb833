//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{debug, error, info};

use super::promotions::{finish_promo, retract_messages, send_initial_messages};
use super::ui_builder::{callbacks, cancel_creation_keyboard, main_menu_keyboard};
use super::AppState;
use crate::dialogue::{PromoDialogue, PromoDialogueState};
use crate::localization::t_lang;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    dialogue: PromoDialogue,
    state: Arc<AppState>,
) -> Result<()> {
    let language_code = q.from.language_code.clone();
    let language_code = language_code.as_deref();
    let data = q.data.clone().unwrap_or_default();
    debug!(user_id = %q.from.id, data = %data, "Received callback query from user");

    if !state.is_admin(q.from.id.0) {
        bot.answer_callback_query(q.id.clone())
            .text(t_lang("not-enough-rights", language_code))
            .show_alert(true)
            .await?;
        return Ok(());
    }

    let Some(message) = q.message.as_ref() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    if !message.chat().is_private() {
        debug!(user_id = %q.from.id, "Ignoring callback outside private chat");
        return Ok(());
    }
    let chat_id = message.chat().id;

    match data.as_str() {
        callbacks::CONFIRM_REPLACE => {
            {
                let mut promo_state = state.promo.lock().await;
                if let Some(promo) = promo_state.promo.as_mut().filter(|p| p.active) {
                    finish_promo(&bot, &state, promo).await;
                }
                promo_state.promo = None;
                state.save_promo(&promo_state);
            }
            if let Err(e) = bot.edit_message_reply_markup(chat_id, message.id()).await {
                error!(user_id = %q.from.id, error = %e, "Failed to remove replace keyboard");
            }
            dialogue.update(PromoDialogueState::WaitingForTemplate).await?;
            bot.send_message(chat_id, t_lang("promo-enter-new-template", language_code))
                .reply_markup(cancel_creation_keyboard(language_code))
                .await?;
            bot.answer_callback_query(q.id.clone()).await?;
        }
        callbacks::CANCEL_REPLACE => {
            if let Err(e) = bot.edit_message_reply_markup(chat_id, message.id()).await {
                error!(user_id = %q.from.id, error = %e, "Failed to remove replace keyboard");
            }
            dialogue.exit().await?;
            bot.send_message(chat_id, t_lang("main-menu", language_code))
                .reply_markup(main_menu_keyboard(language_code))
                .await?;
            bot.answer_callback_query(q.id.clone()).await?;
        }
        callbacks::ACTIVATE | callbacks::DEACTIVATE | callbacks::RESET | callbacks::DELETE => {
            let notice = promo_action(&bot, &state, &data).await;
            bot.answer_callback_query(q.id.clone())
                .text(t_lang(notice, language_code))
                .await?;
        }
        other => {
            debug!(user_id = %q.from.id, data = %other, "Unknown callback data");
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }
    Ok(())
}

/// Apply a promotion control and return the notice key for the admin
async fn promo_action(bot: &Bot, state: &AppState, action: &str) -> &'static str {
    let mut data = state.promo.lock().await;
    let Some(promo) = data.promo.as_mut() else {
        return "promo-missing";
    };

    let notice = match action {
        callbacks::ACTIVATE => {
            send_initial_messages(bot, state, promo).await;
            "promo-activated"
        }
        callbacks::RESET => {
            retract_messages(bot, state, promo).await;
            send_initial_messages(bot, state, promo).await;
            "promo-reset"
        }
        callbacks::DEACTIVATE => {
            finish_promo(bot, state, promo).await;
            "promo-deactivated"
        }
        _ => {
            if promo.active {
                finish_promo(bot, state, promo).await;
            }
            data.promo = None;
            "promo-deleted"
        }
    };

    info!(action, "Promotion control applied");
    state.save_promo(&data);
    notice
}
