//! Q&A catalog parsing
//!
//! The catalog sheet has one row per topic with three `;`-delimited columns:
//! question variants, candidate answers and keyword phrases.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::SheetError;
use crate::sheets::{header_index, strip_bom};

pub const QUESTIONS_HEADER: &str = "Варианты вопросов";
pub const ANSWERS_HEADER: &str = "Варианты ответов";
pub const KEYWORDS_HEADER: &str = "Ключевые слова";

/// One catalog row before normalization
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub questions: Vec<String>,
    pub answers: Vec<String>,
    pub keywords: Vec<String>,
}

/// Split a `;`-delimited cell, trimming items and dropping blanks
pub fn split_list(cell: &str) -> Vec<String> {
    cell.split(';')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}

/// Parse the catalog CSV export
///
/// Rows without questions or without answers are skipped; a missing
/// keywords cell means the row has no required keywords.
pub fn parse_qa_catalog(csv_text: &str) -> Result<Vec<CatalogEntry>, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(strip_bom(csv_text).as_bytes());

    let headers = reader.headers()?.clone();
    let questions_idx = header_index(&headers, QUESTIONS_HEADER)
        .ok_or_else(|| SheetError::MissingHeader(QUESTIONS_HEADER.to_string()))?;
    let answers_idx = header_index(&headers, ANSWERS_HEADER)
        .ok_or_else(|| SheetError::MissingHeader(ANSWERS_HEADER.to_string()))?;
    let keywords_idx = header_index(&headers, KEYWORDS_HEADER);

    let mut entries = Vec::new();
    for (row_number, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unreadable catalog row {}: {}", row_number + 2, e);
                continue;
            }
        };

        let (Some(questions), Some(answers)) = (record.get(questions_idx), record.get(answers_idx))
        else {
            warn!("Skipping catalog row {}: missing required field", row_number + 2);
            continue;
        };

        let entry = CatalogEntry {
            questions: split_list(questions),
            answers: split_list(answers),
            keywords: keywords_idx
                .and_then(|idx| record.get(idx))
                .map(split_list)
                .unwrap_or_default(),
        };

        if entry.questions.is_empty() || entry.answers.is_empty() {
            warn!(
                "Skipping catalog row {}: no question variants or no answers",
                row_number + 2
            );
            continue;
        }
        entries.push(entry);
    }

    debug!("Parsed {} catalog entries", entries.len());
    Ok(entries)
}
