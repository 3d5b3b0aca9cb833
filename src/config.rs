//! # Configuration Module
//!
//! Runtime settings for the bot, read from the environment (after `.env` is
//! loaded), and the tuning of the answer matcher.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

pub const DEFAULT_THREAD_ID: i32 = 745;
pub const DEFAULT_QA_SHEET_GID: &str = "384502621";
pub const DEFAULT_STOCK_SHEET_GID: &str = "1265864442";
pub const DEFAULT_GENERAL_SHEET_GID: &str = "1339673984";
pub const DEFAULT_SYNONYMS_PATH: &str = "data/synonyms.json";
pub const DEFAULT_PROMO_DATA_FILE: &str = "promo_data.json";
pub const DEFAULT_REPORT_DATA_FILE: &str = "report_data.json";
pub const DEFAULT_PROMO_TICK_SECS: u64 = 60;
pub const DEFAULT_CATALOG_SYNC_SECS: u64 = 1800;

/// Similarity a fallback match must reach (inclusive)
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;
/// Prefix marking a catalog answer as a generated-report trigger
pub const REPORT_MARKER: &str = "Генерируемый ответ системой.";

/// Answer matcher tuning
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Minimum cosine similarity for a keyword-less match
    pub threshold: f64,
    /// Prefix turning an answer into a report request
    pub report_marker: String,
    /// Report modes recognized in a trigger, possibly multi-word
    pub report_modes: Vec<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            report_marker: REPORT_MARKER.to_string(),
            report_modes: vec!["Наличии".to_string(), "В пути".to_string()],
        }
    }
}

/// Bot settings
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    /// Group where promotions and reports are published
    pub chat_id: i64,
    /// Forum topic inside the group
    pub thread_id: i32,
    pub admin_ids: Vec<u64>,
    pub sheet_id: String,
    pub qa_sheet_gid: String,
    pub stock_sheet_gid: String,
    pub general_sheet_gid: String,
    pub synonyms_path: String,
    pub lemma_dictionary_path: Option<String>,
    pub promo_data_file: String,
    pub report_data_file: String,
    pub promo_tick_secs: u64,
    pub catalog_sync_secs: u64,
    pub matcher: MatcherConfig,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        let matcher = MatcherConfig {
            threshold: parse_or("MATCH_THRESHOLD", DEFAULT_MATCH_THRESHOLD)?,
            ..Default::default()
        };

        Ok(Self {
            bot_token: required("TELEGRAM_BOT_TOKEN")?,
            chat_id: required("CHAT_ID")?
                .parse()
                .context("CHAT_ID must be an integer chat id")?,
            thread_id: parse_or("CHAT_THREAD_ID", DEFAULT_THREAD_ID)?,
            admin_ids: parse_admin_ids(&env::var("ADMIN_IDS").unwrap_or_default())?,
            sheet_id: required("SHEET_ID")?,
            qa_sheet_gid: string_or("QA_SHEET_GID", DEFAULT_QA_SHEET_GID),
            stock_sheet_gid: string_or("STOCK_SHEET_GID", DEFAULT_STOCK_SHEET_GID),
            general_sheet_gid: string_or("GENERAL_SHEET_GID", DEFAULT_GENERAL_SHEET_GID),
            synonyms_path: string_or("SYNONYMS_PATH", DEFAULT_SYNONYMS_PATH),
            lemma_dictionary_path: env::var("LEMMA_DICTIONARY_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            promo_data_file: string_or("PROMO_DATA_FILE", DEFAULT_PROMO_DATA_FILE),
            report_data_file: string_or("REPORT_DATA_FILE", DEFAULT_REPORT_DATA_FILE),
            promo_tick_secs: parse_or("PROMO_TICK_SECS", DEFAULT_PROMO_TICK_SECS)?,
            catalog_sync_secs: parse_or("CATALOG_SYNC_SECS", DEFAULT_CATALOG_SYNC_SECS)?,
            matcher,
        })
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

/// Parse a comma-separated list of Telegram user ids
pub fn parse_admin_ids(raw: &str) -> Result<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .with_context(|| format!("Invalid admin id in ADMIN_IDS: '{s}'"))
        })
        .collect()
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn string_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: '{value}'")),
        _ => Ok(default),
    }
}
