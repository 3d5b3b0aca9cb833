//! Dialogue Manager module for the promotion creation steps

use anyhow::Result;
use teloxide::prelude::*;
use tracing::{debug, info};

use super::ui_builder::{cancel_creation_keyboard, main_menu_keyboard, replace_confirm_keyboard};
use super::AppState;
use crate::dialogue::{PromoDialogue, PromoDialogueState};
use crate::errors::PromoError;
use crate::localization::t_lang;
use crate::promo::{parse_duration, validate_template, Promo};

/// Begin creating a promotion, asking first when one already exists
pub async fn start_creation(
    bot: &Bot,
    msg: &Message,
    dialogue: PromoDialogue,
    state: &AppState,
    language_code: Option<&str>,
) -> Result<()> {
    if state.promo.lock().await.promo.is_some() {
        bot.send_message(msg.chat.id, t_lang("promo-exists", language_code))
            .reply_markup(replace_confirm_keyboard(language_code))
            .await?;
        return Ok(());
    }

    dialogue.update(PromoDialogueState::WaitingForTemplate).await?;
    bot.send_message(msg.chat.id, t_lang("promo-enter-template", language_code))
        .reply_markup(cancel_creation_keyboard(language_code))
        .await?;
    Ok(())
}

/// Abort creation and return to the main menu
pub async fn cancel_creation(
    bot: &Bot,
    msg: &Message,
    dialogue: PromoDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    dialogue.exit().await?;
    bot.send_message(msg.chat.id, t_lang("promo-cancelled", language_code))
        .reply_markup(main_menu_keyboard(language_code))
        .await?;
    Ok(())
}

/// Handle the template step
pub async fn handle_template_input(
    bot: &Bot,
    msg: &Message,
    dialogue: PromoDialogue,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    match validate_template(text) {
        Ok(template) => {
            dialogue
                .update(PromoDialogueState::WaitingForDuration { template })
                .await?;
            bot.send_message(msg.chat.id, t_lang("promo-enter-duration", language_code))
                .reply_markup(cancel_creation_keyboard(language_code))
                .await?;
        }
        Err(e) => {
            debug!(user_id = %msg.chat.id, error = %e, "Promotion template rejected");
            // Keep dialogue active, admin can try again
            bot.send_message(msg.chat.id, t_lang("promo-template-invalid", language_code))
                .await?;
        }
    }
    Ok(())
}

/// Handle the duration step and store the new inactive promotion
pub async fn handle_duration_input(
    bot: &Bot,
    msg: &Message,
    dialogue: PromoDialogue,
    state: &AppState,
    template: String,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let duration = match parse_duration(text) {
        Ok(duration) => duration,
        Err(e) => {
            let key = match e {
                PromoError::DurationRange(_) => "promo-duration-range",
                _ => "promo-duration-format",
            };
            bot.send_message(msg.chat.id, t_lang(key, language_code)).await?;
            return Ok(());
        }
    };

    {
        let mut data = state.promo.lock().await;
        data.promo = Some(Promo::new(template, duration));
        data.admin_id = msg.from.as_ref().map(|user| user.id.0);
        state.save_promo(&data);
    }
    dialogue.exit().await?;

    info!(user_id = %msg.chat.id, duration, "Promotion created");
    bot.send_message(msg.chat.id, t_lang("promo-created", language_code))
        .reply_markup(main_menu_keyboard(language_code))
        .await?;
    Ok(())
}
