//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: routes incoming text to admin commands or the answer engine
//! - `callback_handler`: handles inline keyboard callback queries
//! - `dialogue_manager`: promotion creation dialogue steps
//! - `promotions`: publishing, ticking and finishing the countdown promotion
//! - `publisher`: stock report and general catalogue publications
//! - `scheduler`: background tasks (promotion ticker, sheet re-sync)
//! - `ui_builder`: keyboards and message formatting

pub mod callback_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod promotions;
pub mod publisher;
pub mod scheduler;
pub mod ui_builder;

use std::path::PathBuf;
use std::sync::Arc;
use teloxide::types::{ChatId, MessageId, ThreadId};
use tokio::sync::Mutex;
use tracing::error;

use crate::answer_matcher::AnswerEngine;
use crate::config::BotConfig;
use crate::inventory::InventoryReports;
use crate::state::{save_json, PromoState, ReportState};

pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

/// Shared state handed to every handler and background task
pub struct AppState {
    pub config: BotConfig,
    pub engine: AnswerEngine,
    pub inventory: Arc<InventoryReports>,
    pub http: reqwest::Client,
    pub promo: Mutex<PromoState>,
    pub reports: Mutex<ReportState>,
}

impl AppState {
    pub fn new(
        config: BotConfig,
        engine: AnswerEngine,
        inventory: Arc<InventoryReports>,
        http: reqwest::Client,
        promo: PromoState,
        reports: ReportState,
    ) -> Self {
        Self {
            config,
            engine,
            inventory,
            http,
            promo: Mutex::new(promo),
            reports: Mutex::new(reports),
        }
    }

    /// Group receiving promotions and publications
    pub fn target_chat(&self) -> ChatId {
        ChatId(self.config.chat_id)
    }

    pub fn target_thread(&self) -> ThreadId {
        ThreadId(MessageId(self.config.thread_id))
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.config.is_admin(user_id)
    }

    /// Persist the promotion state; failures are logged
    pub fn save_promo(&self, promo: &PromoState) {
        let path = PathBuf::from(&self.config.promo_data_file);
        if let Err(e) = save_json(&path, promo) {
            error!(error = %e, "Failed to save promotion data");
        }
    }

    /// Persist published report ids; failures are logged
    pub fn save_reports(&self, reports: &ReportState) {
        let path = PathBuf::from(&self.config.report_data_file);
        if let Err(e) = save_json(&path, reports) {
            error!(error = %e, "Failed to save report data");
        }
    }
}
