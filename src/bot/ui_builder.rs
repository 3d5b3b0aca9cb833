//! UI Builder module for creating keyboards and formatting messages

use chrono::{DateTime, Utc};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::localization::{t_args_lang, t_lang};
use crate::promo::{fmt_secs, Promo};

/// Callback data of the inline buttons
pub mod callbacks {
    pub const CONFIRM_REPLACE: &str = "confirm_replace";
    pub const CANCEL_REPLACE: &str = "cancel_replace";
    pub const ACTIVATE: &str = "activate";
    pub const DEACTIVATE: &str = "deactivate";
    pub const RESET: &str = "reset";
    pub const DELETE: &str = "delete";
}

/// Admin actions reachable from the main menu keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ViewPromo,
    CreatePromo,
    PublishReport,
    UpdateReport,
    PublishGeneral,
    CancelCreation,
}

impl MenuAction {
    const ALL: [(MenuAction, &'static str); 6] = [
        (MenuAction::ViewPromo, "menu-view-promo"),
        (MenuAction::CreatePromo, "menu-create-promo"),
        (MenuAction::PublishReport, "menu-publish-report"),
        (MenuAction::UpdateReport, "menu-update-report"),
        (MenuAction::PublishGeneral, "menu-publish-general"),
        (MenuAction::CancelCreation, "cancel-creation"),
    ];

    /// Menu action whose button label equals `text`
    pub fn from_text(text: &str, language_code: Option<&str>) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .iter()
            .find(|(_, key)| t_lang(key, language_code) == text)
            .map(|(action, _)| *action)
    }
}

fn reply_keyboard(rows: Vec<Vec<String>>) -> KeyboardMarkup {
    let mut keyboard = KeyboardMarkup::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>())
            .collect::<Vec<_>>(),
    );
    keyboard.resize_keyboard = true;
    keyboard
}

/// Main menu for admins
pub fn main_menu_keyboard(language_code: Option<&str>) -> KeyboardMarkup {
    reply_keyboard(vec![
        vec![
            t_lang("menu-view-promo", language_code),
            t_lang("menu-create-promo", language_code),
        ],
        vec![
            t_lang("menu-publish-report", language_code),
            t_lang("menu-update-report", language_code),
        ],
        vec![t_lang("menu-publish-general", language_code)],
    ])
}

/// Single-button keyboard aborting promotion creation
pub fn cancel_creation_keyboard(language_code: Option<&str>) -> KeyboardMarkup {
    reply_keyboard(vec![vec![t_lang("cancel-creation", language_code)]])
}

pub fn replace_confirm_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            t_lang("promo-replace-yes", language_code),
            callbacks::CONFIRM_REPLACE,
        ),
        InlineKeyboardButton::callback(
            t_lang("promo-replace-no", language_code),
            callbacks::CANCEL_REPLACE,
        ),
    ]])
}

/// Controls of a running promotion
pub fn active_promo_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback(
                t_lang("promo-button-deactivate", language_code),
                callbacks::DEACTIVATE,
            ),
            InlineKeyboardButton::callback(t_lang("promo-button-reset", language_code), callbacks::RESET),
        ],
        vec![InlineKeyboardButton::callback(
            t_lang("promo-button-delete", language_code),
            callbacks::DELETE,
        )],
    ])
}

/// Controls of a stopped promotion
pub fn inactive_promo_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            t_lang("promo-button-activate", language_code),
            callbacks::ACTIVATE,
        )],
        vec![InlineKeyboardButton::callback(
            t_lang("promo-button-delete", language_code),
            callbacks::DELETE,
        )],
    ])
}

pub fn promo_keyboard(promo: &Promo, language_code: Option<&str>) -> InlineKeyboardMarkup {
    if promo.active {
        active_promo_keyboard(language_code)
    } else {
        inactive_promo_keyboard(language_code)
    }
}

/// Admin overview of the current promotion
pub fn format_promo_view(promo: &Promo, now: DateTime<Utc>, language_code: Option<&str>) -> String {
    let remaining = promo.remaining(now);
    let status = if promo.active {
        t_lang("promo-status-active", language_code)
    } else {
        t_lang("promo-status-inactive", language_code)
    };
    format!(
        "{}\n{}\n\n{}\n{}",
        t_lang("promo-view-template", language_code),
        promo.render(now),
        t_args_lang("promo-view-remaining", &[("remaining", &fmt_secs(remaining))], language_code),
        t_args_lang("promo-view-status", &[("status", &status)], language_code),
    )
}

/// Chat and topic ids of a message, for configuring the bot
pub fn format_chat_ids(chat_id: i64, thread_id: Option<i32>, language_code: Option<&str>) -> String {
    let mut text = t_args_lang("chat-id", &[("chat_id", &chat_id.to_string())], language_code);
    text.push('\n');
    match thread_id {
        Some(thread_id) => text.push_str(&t_args_lang(
            "thread-id",
            &[("thread_id", &thread_id.to_string())],
            language_code,
        )),
        None => text.push_str(&t_lang("not-in-topic", language_code)),
    }
    text
}
