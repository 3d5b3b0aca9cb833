//! Publications into the group thread: stock reports and the general catalogue

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{InputFile, InputMedia, InputMediaPhoto, MessageId, ParseMode};
use tracing::{debug, error, info, warn};

use super::scheduler::fetch_inventory;
use super::AppState;
use crate::general::{parse_general, GeneralPublication};
use crate::inventory::{ReportMessages, LOCATIONS};
use crate::markup::MarkdownV2;
use crate::sheets::{export_url, fetch_csv};
use crate::state::PublishedReport;

const SEPARATORS: [&str; 2] = ["🚀🚀🚀🚀🚀🚀", "🔥🔥🔥🔥🔥🔥"];
const CHUNK_PAUSE: Duration = Duration::from_millis(500);
const POST_PAUSE: Duration = Duration::from_secs(1);

fn separator() -> &'static str {
    SEPARATORS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(SEPARATORS[0])
}

async fn send_markdown(bot: &Bot, state: &AppState, text: String) -> Result<Message> {
    let message = bot
        .send_message(state.target_chat(), text)
        .parse_mode(ParseMode::MarkdownV2)
        .message_thread_id(state.target_thread())
        .await?;
    Ok(message)
}

/// Publish every location report anew, forgetting earlier message ids
pub async fn publish_reports(bot: &Bot, state: &AppState) -> Result<()> {
    {
        let mut reports = state.reports.lock().await;
        reports.clear();
        state.save_reports(&reports);
    }
    update_reports(bot, state).await
}

/// Bring published reports up to date with the warehouse sheet
///
/// Locations with stored message ids are edited in place; everything else
/// is sent. The framing texts and separators go out only with a fresh
/// publication.
pub async fn update_reports(bot: &Bot, state: &AppState) -> Result<()> {
    let inventory = fetch_inventory(state)
        .await
        .context("Failed to load warehouse sheet")?;
    state.inventory.replace(inventory.clone());

    let mut reports = state.reports.lock().await;
    let fresh = reports.locations.is_empty();
    info!(fresh, items = inventory.item_count(), "Publishing stock reports");

    if fresh && !inventory.begin_text.is_empty() {
        send_markdown(bot, state, MarkdownV2::escape(&inventory.begin_text)).await?;
        send_markdown(bot, state, separator().to_string()).await?;
    }

    for (idx, location) in LOCATIONS.iter().enumerate() {
        let Some(stock) = inventory.stock(location) else {
            continue;
        };
        let messages = stock.publication(location);
        let previous = reports.get(location.slug).cloned().unwrap_or_default();
        let published = publish_location(bot, state, &messages, previous).await?;
        reports.set(location.slug, published);
        state.save_reports(&reports);

        if fresh && idx + 1 < LOCATIONS.len() {
            send_markdown(bot, state, separator().to_string()).await?;
        }
    }

    if fresh && !inventory.finish_text.is_empty() {
        send_markdown(bot, state, MarkdownV2::escape(&inventory.finish_text)).await?;
    }
    Ok(())
}

async fn publish_location(
    bot: &Bot,
    state: &AppState,
    messages: &ReportMessages,
    previous: PublishedReport,
) -> Result<PublishedReport> {
    let chat_id = state.target_chat();
    let plan = previous.plan_update(messages.caption.is_some(), messages.texts.len());

    for &message_id in &plan.delete {
        if let Err(e) = bot.delete_message(chat_id, MessageId(message_id)).await {
            error!(chat_id = %chat_id, message_id, error = %e, "Failed to delete stale report message");
        }
    }

    let mut published = PublishedReport::default();
    if let Some(caption) = &messages.caption {
        if let Some(message_id) = plan.edit_caption {
            if let Err(e) = bot
                .edit_message_caption(chat_id, MessageId(message_id))
                .caption(caption.clone())
                .parse_mode(ParseMode::MarkdownV2)
                .await
            {
                error!(chat_id = %chat_id, message_id, error = %e, "Failed to edit report caption");
            }
            published.caption = Some(message_id);
            published.photos = previous.photos.clone();
        } else if plan.send_photos {
            let mut ids = send_photos(bot, state, &messages.photos, caption).await?.into_iter();
            published.caption = ids.next();
            published.photos = ids.collect();
        }
    }

    let mut edits = plan.edit_texts.iter().peekable();
    for (i, chunk) in messages.texts.iter().enumerate() {
        match edits.next_if(|(idx, _)| *idx == i) {
            Some(&(_, message_id)) => {
                if let Err(e) = bot
                    .edit_message_text(chat_id, MessageId(message_id), chunk.clone())
                    .parse_mode(ParseMode::MarkdownV2)
                    .await
                {
                    error!(chat_id = %chat_id, message_id, error = %e, "Failed to edit report message");
                }
                published.texts.push(message_id);
            }
            None => {
                let message = send_markdown(bot, state, chunk.clone()).await?;
                published.texts.push(message.id.0);
            }
        }
        tokio::time::sleep(CHUNK_PAUSE).await;
    }

    debug!(
        deleted = plan.delete.len(),
        sent = plan.send_texts.len(),
        "Location report synchronized"
    );
    Ok(published)
}

/// Send up to ten photos as a media group, the first one captioned
///
/// Returns the ids of every sent message; without a usable photo the
/// caption goes out as a text message.
async fn send_photos(
    bot: &Bot,
    state: &AppState,
    photos: &[String],
    caption: &str,
) -> Result<Vec<i32>> {
    let media: Vec<InputMedia> = photos
        .iter()
        .filter_map(|url| match reqwest::Url::parse(url) {
            Ok(url) => Some(InputMediaPhoto::new(InputFile::url(url))),
            Err(e) => {
                warn!(url = %url, error = %e, "Skipping invalid photo URL");
                None
            }
        })
        .enumerate()
        .map(|(i, photo)| {
            let photo = if i == 0 {
                photo.caption(caption).parse_mode(ParseMode::MarkdownV2)
            } else {
                photo
            };
            InputMedia::Photo(photo)
        })
        .collect();

    if media.is_empty() {
        let message = send_markdown(bot, state, caption.to_string()).await?;
        debug!(message_id = message.id.0, "Caption sent as text, no usable photos");
        return Ok(vec![message.id.0]);
    }

    let sent = bot
        .send_media_group(state.target_chat(), media)
        .message_thread_id(state.target_thread())
        .await?;
    Ok(sent.iter().map(|m| m.id.0).collect())
}

async fn fetch_general(state: &AppState) -> Result<GeneralPublication> {
    let url = export_url(&state.config.sheet_id, &state.config.general_sheet_gid);
    let csv_text = fetch_csv(&state.http, &url).await?;
    Ok(parse_general(&csv_text)?)
}

async fn send_html(bot: &Bot, state: &AppState, text: &str) -> Result<()> {
    bot.send_message(state.target_chat(), text)
        .parse_mode(ParseMode::Html)
        .message_thread_id(state.target_thread())
        .await?;
    Ok(())
}

/// Send the general catalogue: opening text, one post per item, closing text
pub async fn send_general(bot: &Bot, state: &AppState) -> Result<()> {
    let publication = fetch_general(state)
        .await
        .context("Failed to load general sheet")?;
    info!(messages = publication.message_count(), "Publishing general catalogue");

    if let Some(opening) = &publication.opening {
        send_html(bot, state, opening).await?;
        tokio::time::sleep(POST_PAUSE).await;
    }

    for post in &publication.posts {
        let photo = post.photo.as_deref().and_then(|url| reqwest::Url::parse(url).ok());
        match photo {
            Some(url) => {
                bot.send_photo(state.target_chat(), InputFile::url(url))
                    .caption(post.caption.clone())
                    .parse_mode(ParseMode::Html)
                    .message_thread_id(state.target_thread())
                    .await?;
            }
            None => send_html(bot, state, &post.caption).await?,
        }
        debug!(caption = %post.caption, "General post sent");
        tokio::time::sleep(POST_PAUSE).await;
    }

    if let Some(closing) = &publication.closing {
        send_html(bot, state, closing).await?;
    }
    Ok(())
}
