use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use storefront_bot::answer_matcher::{AnswerEngine, ReportLookup};
use storefront_bot::bot::{self, promotions, scheduler, AppState};
use storefront_bot::config::BotConfig;
use storefront_bot::dialogue::PromoDialogueState;
use storefront_bot::inventory::{Inventory, InventoryReports};
use storefront_bot::localization::init_localization;
use storefront_bot::state::{load_or_default, PromoState, ReportState};
use storefront_bot::synonyms::SynsetLexicon;
use storefront_bot::text_processing::{DictionaryAnalyzer, MorphAnalyzer, Normalizer, SnowballAnalyzer};

fn build_analyzer(config: &BotConfig) -> Result<Arc<dyn MorphAnalyzer>> {
    match &config.lemma_dictionary_path {
        Some(path) => {
            let dictionary = DictionaryAnalyzer::load(path)?
                .with_fallback(Box::new(SnowballAnalyzer::russian()));
            info!(path = %path, forms = dictionary.len(), "Lemma dictionary loaded");
            Ok(Arc::new(dictionary))
        }
        None => Ok(Arc::new(SnowballAnalyzer::russian())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging; `log` records from the library are bridged in
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting storefront bot");

    init_localization()?;
    let config = BotConfig::from_env()?;

    // Lexical resources are required; a missing lexicon aborts startup
    let analyzer = build_analyzer(&config)?;
    let lexicon = SynsetLexicon::load(&config.synonyms_path, analyzer.as_ref())?;
    let normalizer = Normalizer::new(analyzer, Arc::new(lexicon));

    let http = reqwest::Client::new();
    let corpus = scheduler::fetch_corpus(&http, &config, &normalizer)
        .await
        .context("Failed to build the question corpus")?;
    info!(records = corpus.len(), "Question corpus ready");

    let inventory = match scheduler::fetch_inventory_with(&http, &config).await {
        Ok(inventory) => inventory,
        Err(e) => {
            warn!(error = %e, "Warehouse sheet unavailable, reports start empty");
            Inventory::default()
        }
    };
    let inventory = Arc::new(InventoryReports::new(inventory));

    let engine = AnswerEngine::new(
        normalizer,
        corpus,
        Arc::clone(&inventory) as Arc<dyn ReportLookup>,
        config.matcher.clone(),
    );

    let promo_state: PromoState = load_or_default(Path::new(&config.promo_data_file));
    let report_state: ReportState = load_or_default(Path::new(&config.report_data_file));

    let bot = Bot::new(config.bot_token.clone());
    let state = Arc::new(AppState::new(
        config,
        engine,
        inventory,
        http,
        promo_state,
        report_state,
    ));

    promotions::restore_active(&bot, &state).await;
    scheduler::spawn_promo_ticker(bot.clone(), Arc::clone(&state));
    scheduler::spawn_sheet_sync(Arc::clone(&state));

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<PromoDialogueState>, PromoDialogueState>()
                .endpoint(bot::message_handler),
        )
        .branch(
            Update::filter_callback_query()
                .enter_dialogue::<CallbackQuery, InMemStorage<PromoDialogueState>, PromoDialogueState>()
                .endpoint(bot::callback_handler),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state, InMemStorage::<PromoDialogueState>::new()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
