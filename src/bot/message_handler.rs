//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};
use tracing::{debug, error, info, warn};

use super::dialogue_manager::{
    cancel_creation, handle_duration_input, handle_template_input, start_creation,
};
use super::publisher::{publish_reports, send_general, update_reports};
use super::ui_builder::{format_chat_ids, format_promo_view, main_menu_keyboard, promo_keyboard, MenuAction};
use super::AppState;
use crate::answer_matcher::Reply;
use crate::dialogue::{PromoDialogue, PromoDialogueState};
use crate::localization::{t_args_lang, t_lang};

const GET_CHAT_ID: &str = "get_chat_id";

/// Entry point for every message update
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: PromoDialogue,
    state: Arc<AppState>,
) -> Result<()> {
    let Some(text) = msg.text().map(str::to_string) else {
        debug!(chat_id = %msg.chat.id, "Ignoring non-text message");
        return Ok(());
    };
    let user = msg.from.clone();
    let language_code = user.as_ref().and_then(|u| u.language_code.clone());
    let language_code = language_code.as_deref();
    let is_admin = user.as_ref().is_some_and(|u| state.is_admin(u.id.0));

    debug!(
        user_id = ?user.as_ref().map(|u| u.id),
        chat_id = %msg.chat.id,
        is_admin,
        "Received text message"
    );

    if text.trim() == GET_CHAT_ID && is_admin {
        let thread_id = msg.thread_id.map(|t| t.0 .0);
        bot.send_message(msg.chat.id, format_chat_ids(msg.chat.id.0, thread_id, language_code))
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    }

    if msg.chat.is_private() {
        if is_admin {
            return handle_admin_message(&bot, &msg, dialogue, &state, &text, language_code).await;
        }
        if text.starts_with("/start") {
            bot.send_message(msg.chat.id, t_lang("welcome", language_code)).await?;
            return Ok(());
        }
    } else if text.trim() == "/help" || text.starts_with("/help@") {
        bot.send_message(msg.chat.id, t_lang("help-text", language_code))
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    }

    if msg.chat.is_private() || msg.chat.is_group() || msg.chat.is_supergroup() {
        answer_question(&bot, &msg, &state, &text, language_code).await?;
    }
    Ok(())
}

/// Private-chat admin commands and promotion dialogue steps
async fn handle_admin_message(
    bot: &Bot,
    msg: &Message,
    dialogue: PromoDialogue,
    state: &AppState,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    if text.starts_with("/start") {
        dialogue.exit().await?;
        bot.send_message(msg.chat.id, t_lang("admin-menu-prompt", language_code))
            .reply_markup(main_menu_keyboard(language_code))
            .await?;
        return Ok(());
    }

    let action = MenuAction::from_text(text, language_code);
    if action == Some(MenuAction::CancelCreation) {
        return cancel_creation(bot, msg, dialogue, language_code).await;
    }

    // Menu buttons take precedence over dialogue input
    if action.is_none() {
        match dialogue.get_or_default().await? {
            PromoDialogueState::WaitingForTemplate => {
                return handle_template_input(bot, msg, dialogue, text, language_code).await;
            }
            PromoDialogueState::WaitingForDuration { template } => {
                return handle_duration_input(bot, msg, dialogue, state, template, text, language_code)
                    .await;
            }
            PromoDialogueState::Start => {}
        }
    } else if dialogue.get_or_default().await?.is_creating() {
        debug!(user_id = %msg.chat.id, "Menu action interrupts promotion creation");
        dialogue.exit().await?;
    }

    match action {
        Some(MenuAction::ViewPromo) => view_promo(bot, msg, state, language_code).await,
        Some(MenuAction::CreatePromo) => start_creation(bot, msg, dialogue, state, language_code).await,
        Some(MenuAction::PublishReport) => {
            bot.send_message(msg.chat.id, t_lang("report-publishing", language_code)).await?;
            let outcome = publish_reports(bot, state).await;
            report_outcome(bot, msg, outcome, "report-published", language_code).await
        }
        Some(MenuAction::UpdateReport) => {
            bot.send_message(msg.chat.id, t_lang("report-updating", language_code)).await?;
            let outcome = update_reports(bot, state).await;
            report_outcome(bot, msg, outcome, "done", language_code).await
        }
        Some(MenuAction::PublishGeneral) => {
            bot.send_message(msg.chat.id, t_lang("general-publishing", language_code)).await?;
            let outcome = send_general(bot, state).await;
            report_outcome(bot, msg, outcome, "done", language_code).await
        }
        Some(MenuAction::CancelCreation) => Ok(()),
        // Admins ask questions like everybody else
        None => answer_question(bot, msg, state, text, language_code).await,
    }
}

async fn report_outcome(
    bot: &Bot,
    msg: &Message,
    outcome: Result<()>,
    success_key: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let text = match outcome {
        Ok(()) => t_lang(success_key, language_code),
        Err(e) => {
            error!(user_id = %msg.chat.id, error = %e, "Publication failed");
            t_args_lang("operation-failed", &[("error", &format!("{e:#}"))], language_code)
        }
    };
    bot.send_message(msg.chat.id, text)
        .reply_markup(main_menu_keyboard(language_code))
        .await?;
    Ok(())
}

async fn view_promo(bot: &Bot, msg: &Message, state: &AppState, language_code: Option<&str>) -> Result<()> {
    let data = state.promo.lock().await;
    match &data.promo {
        None => {
            bot.send_message(msg.chat.id, t_lang("promo-none", language_code))
                .reply_markup(main_menu_keyboard(language_code))
                .await?;
        }
        Some(promo) => {
            bot.send_message(msg.chat.id, format_promo_view(promo, Utc::now(), language_code))
                .reply_markup(promo_keyboard(promo, language_code))
                .await?;
        }
    }
    Ok(())
}

/// Run the answer engine on a question and deliver the reply
///
/// Reports go to the asker's private chat when possible. Group chats stay
/// silent when nothing matches.
async fn answer_question(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let reply = match state.engine.find_answer(text) {
        Ok(reply) => reply,
        Err(e) => {
            error!(chat_id = %msg.chat.id, error = %e, "Answer lookup failed");
            return Ok(());
        }
    };

    match reply {
        Reply::Text(answer) => {
            info!(chat_id = %msg.chat.id, "Answer found");
            bot.send_message(msg.chat.id, answer)
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
        }
        Reply::Report(html) => {
            let private_sent = match &msg.from {
                Some(user) if !msg.chat.is_private() => {
                    match bot.send_message(user.id, html.clone()).parse_mode(ParseMode::Html).await {
                        Ok(_) => {
                            info!(user_id = %user.id, "Report sent to private chat");
                            true
                        }
                        Err(e) => {
                            warn!(user_id = %user.id, error = %e, "Private report delivery failed, replying in place");
                            false
                        }
                    }
                }
                _ => false,
            };

            if private_sent {
                bot.send_message(msg.chat.id, t_lang("report-sent-private", language_code))
                    .reply_parameters(ReplyParameters::new(msg.id))
                    .await?;
            } else {
                bot.send_message(msg.chat.id, html)
                    .parse_mode(ParseMode::Html)
                    .reply_parameters(ReplyParameters::new(msg.id))
                    .await?;
            }
        }
        Reply::NoMatch => {
            debug!(chat_id = %msg.chat.id, "No answer matched");
            if msg.chat.is_private() {
                bot.send_message(msg.chat.id, t_lang("no-answer", language_code)).await?;
            }
        }
    }
    Ok(())
}
