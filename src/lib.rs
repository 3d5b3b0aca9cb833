//! # Storefront Telegram Bot
//!
//! A Telegram bot for a furniture storefront: it answers customer questions
//! from a spreadsheet-backed Q&A catalog (lemmatized bag-of-words matching
//! with synonym expansion), generates warehouse stock reports, publishes
//! stock and catalogue posts into a group topic, and runs a countdown
//! promotion.

pub mod answer_matcher;
pub mod bot;
pub mod catalog;
pub mod config;
pub mod corpus;
pub mod dialogue;
pub mod errors;
pub mod general;
pub mod inventory;
pub mod localization;
pub mod markup;
pub mod promo;
pub mod sheets;
pub mod state;
pub mod synonyms;
pub mod text_processing;

pub use answer_matcher::{AnswerEngine, Reply, ReportLookup};
pub use text_processing::Normalizer;
