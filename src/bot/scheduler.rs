//! Background tasks: the promotion ticker and the periodic sheet re-sync

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::promotions;
use super::AppState;
use crate::catalog::parse_qa_catalog;
use crate::config::BotConfig;
use crate::corpus::Corpus;
use crate::inventory::Inventory;
use crate::sheets::{export_url, fetch_csv, SheetGrid};
use crate::text_processing::Normalizer;

/// Download the Q&A sheet and build a corpus from it
pub async fn fetch_corpus(
    http: &reqwest::Client,
    config: &BotConfig,
    normalizer: &Normalizer,
) -> Result<Corpus> {
    let url = export_url(&config.sheet_id, &config.qa_sheet_gid);
    let csv_text = fetch_csv(http, &url).await?;
    let entries = parse_qa_catalog(&csv_text)?;
    let corpus = Corpus::build(&entries, normalizer).context("Q&A sheet produced no usable records")?;
    Ok(corpus)
}

/// Download and parse the warehouse sheet
pub async fn fetch_inventory_with(http: &reqwest::Client, config: &BotConfig) -> Result<Inventory> {
    let url = export_url(&config.sheet_id, &config.stock_sheet_gid);
    let csv_text = fetch_csv(http, &url).await?;
    let grid = SheetGrid::parse(&csv_text)?;
    Ok(Inventory::from_grid(&grid)?)
}

pub async fn fetch_inventory(state: &AppState) -> Result<Inventory> {
    fetch_inventory_with(&state.http, &state.config).await
}

/// Refresh the corpus and the inventory snapshot once
///
/// Each source is swapped only when it loaded completely; a failure keeps
/// the previous data.
pub async fn resync_sheets(state: &AppState) {
    match fetch_corpus(&state.http, &state.config, state.engine.normalizer()).await {
        Ok(corpus) => state.engine.replace_corpus(corpus),
        Err(e) => warn!(error = %e, "Q&A re-sync failed, keeping previous corpus"),
    }

    match fetch_inventory(state).await {
        Ok(inventory) => {
            info!(items = inventory.item_count(), "Inventory snapshot refreshed");
            state.inventory.replace(inventory);
        }
        Err(e) => warn!(error = %e, "Inventory re-sync failed, keeping previous snapshot"),
    }
}

/// Tick the promotion countdown every `PROMO_TICK_SECS`
pub fn spawn_promo_ticker(bot: Bot, state: Arc<AppState>) -> JoinHandle<()> {
    let period = Duration::from_secs(state.config.promo_tick_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = promotions::tick(&bot, &state).await {
                error!(error = %e, "Promotion tick failed");
            }
        }
    })
}

/// Re-sync the sheets every `CATALOG_SYNC_SECS`
pub fn spawn_sheet_sync(state: Arc<AppState>) -> JoinHandle<()> {
    let period = Duration::from_secs(state.config.catalog_sync_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            resync_sheets(&state).await;
        }
    })
}
