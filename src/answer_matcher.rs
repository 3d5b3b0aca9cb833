//! # Answer Matcher Module
//!
//! Finds the best canned answer for free-form user text.
//!
//! Ranking is keyword-first: records whose required keywords overlap the
//! user's literal lemmas are ordered by overlap count, then by cosine
//! similarity. Only when no record has a keyword hit does pure similarity
//! decide, and then the best record must reach the configured threshold.
//! The record is picked deterministically; the answer among its variants
//! is picked at random.
//!
//! Answers starting with the report marker are commands: the remainder names
//! a report mode and a city, and the reply is the generated report.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

use crate::config::MatcherConfig;
use crate::corpus::{Corpus, QaRecord};
use crate::errors::MatchError;
use crate::markup::escape_html;
use crate::text_processing::{LemmaSet, Normalizer, TermVector};

/// Cosine similarity of two term vectors, `0.0` when either has zero magnitude
pub fn cosine_similarity(v1: &TermVector, v2: &TermVector) -> f64 {
    let numerator: f64 = v1
        .iter()
        .filter_map(|(term, &a)| v2.get(term).map(|&b| a as f64 * b as f64))
        .sum();
    let norm = |v: &TermVector| v.values().map(|&c| (c as f64) * (c as f64)).sum::<f64>().sqrt();
    let denominator = norm(v1) * norm(v2);
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Number of a record's required keywords present in the user's lemmas
pub fn keyword_overlap(record: &QaRecord, lemmas: &LemmaSet) -> usize {
    record
        .keywords()
        .iter()
        .filter(|kw| lemmas.contains(*kw))
        .count()
}

/// A record reached by keyword overlap during one matching call
#[derive(Debug, Clone, Copy)]
pub struct MatchCandidate<'a> {
    pub overlap: usize,
    pub similarity: f64,
    pub record: &'a QaRecord,
}

/// Generates report bodies for report-trigger answers
pub trait ReportLookup: Send + Sync {
    fn get_report(&self, city: &str, mode: &str) -> anyhow::Result<String>;
}

/// Mode and city extracted from a report-trigger answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTrigger {
    pub mode: String,
    pub city: String,
}

/// Split the text after the report marker into mode and city
///
/// A leading known mode (case-insensitive, possibly multi-word) wins and the
/// rest is the city; a known mode alone is malformed. Otherwise two tokens
/// are `mode city`, and three or more are a two-word mode followed by the city.
pub fn parse_report_trigger(rest: &str, known_modes: &[String]) -> Result<ReportTrigger, MatchError> {
    let tokens: Vec<&str> = rest.split_whitespace().collect();

    let mut modes: Vec<Vec<&str>> = known_modes
        .iter()
        .map(|m| m.split_whitespace().collect::<Vec<_>>())
        .filter(|m| !m.is_empty())
        .collect();
    modes.sort_by_key(|m| std::cmp::Reverse(m.len()));

    for mode in &modes {
        let prefix_matches = tokens.len() >= mode.len()
            && mode
                .iter()
                .zip(&tokens)
                .all(|(m, t)| m.to_lowercase() == t.to_lowercase());
        if !prefix_matches {
            continue;
        }
        // A known mode with nothing after it has no city
        if tokens.len() == mode.len() {
            return Err(MatchError::MalformedReportTrigger(rest.to_string()));
        }
        return Ok(ReportTrigger {
            mode: tokens[..mode.len()].join(" "),
            city: tokens[mode.len()..].join(" "),
        });
    }

    match tokens.len() {
        0 | 1 => Err(MatchError::MalformedReportTrigger(rest.to_string())),
        2 => Ok(ReportTrigger {
            mode: tokens[0].to_string(),
            city: tokens[1].to_string(),
        }),
        _ => Ok(ReportTrigger {
            mode: tokens[..2].join(" "),
            city: tokens[2..].join(" "),
        }),
    }
}

/// Header line placed above a generated report
///
/// `report` is already HTML; mode and city come from catalog text and are escaped.
pub fn format_report_reply(trigger: &ReportTrigger, report: &str) -> String {
    format!(
        "<b>Отчет {} в {}:</b>\n\n{}",
        escape_html(&trigger.mode),
        escape_html(&trigger.city),
        report
    )
}

/// Outcome of one matching call
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Literal catalog answer
    Text(String),
    /// Generated report, HTML formatted
    Report(String),
    /// Nothing matched well enough
    NoMatch,
}

impl Reply {
    /// `(answer, is_report)` view of the reply
    pub fn into_parts(self) -> (Option<String>, bool) {
        match self {
            Reply::Text(text) => (Some(text), false),
            Reply::Report(html) => (Some(html), true),
            Reply::NoMatch => (None, false),
        }
    }
}

/// Answer engine over a swappable corpus
///
/// Matching never mutates the corpus. A re-sync builds a new [`Corpus`] and
/// swaps the shared reference, so a reader sees either the old or the new
/// corpus, never a partial one.
pub struct AnswerEngine {
    normalizer: Normalizer,
    corpus: RwLock<Arc<Corpus>>,
    reports: Arc<dyn ReportLookup>,
    config: MatcherConfig,
    rng: Mutex<StdRng>,
}

impl AnswerEngine {
    pub fn new(
        normalizer: Normalizer,
        corpus: Corpus,
        reports: Arc<dyn ReportLookup>,
        config: MatcherConfig,
    ) -> Self {
        Self {
            normalizer,
            corpus: RwLock::new(Arc::new(corpus)),
            reports,
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Fix the answer-choice randomness
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Current corpus snapshot
    pub fn corpus(&self) -> Arc<Corpus> {
        match self.corpus.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Atomically replace the corpus
    pub fn replace_corpus(&self, corpus: Corpus) {
        let records = corpus.len();
        let fresh = Arc::new(corpus);
        match self.corpus.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
        info!(records, "Question corpus replaced");
    }

    /// Pick the winning record for a normalized query, if any
    pub fn select_record<'a>(
        &self,
        corpus: &'a Corpus,
        vector: &TermVector,
        lemmas: &LemmaSet,
    ) -> Option<&'a QaRecord> {
        let mut candidates: Vec<MatchCandidate<'a>> = corpus
            .records()
            .iter()
            .filter_map(|record| {
                let overlap = keyword_overlap(record, lemmas);
                (overlap > 0).then(|| MatchCandidate {
                    overlap,
                    similarity: cosine_similarity(vector, record.vector()),
                    record,
                })
            })
            .collect();

        if !candidates.is_empty() {
            // Stable sort keeps corpus order among exact ties
            candidates.sort_by(|a, b| {
                b.overlap
                    .cmp(&a.overlap)
                    .then_with(|| b.similarity.total_cmp(&a.similarity))
            });
            let best = candidates[0];
            debug!(
                question = %best.record.question(),
                overlap = best.overlap,
                similarity = best.similarity,
                "Keyword match selected"
            );
            return Some(best.record);
        }

        let mut best: Option<(&QaRecord, f64)> = None;
        for record in corpus.records() {
            let similarity = cosine_similarity(vector, record.vector());
            if best.map_or(true, |(_, top)| similarity > top) {
                best = Some((record, similarity));
            }
        }

        match best {
            Some((record, similarity)) if similarity >= self.config.threshold => {
                debug!(
                    question = %record.question(),
                    similarity,
                    "Similarity match selected"
                );
                Some(record)
            }
            Some((_, similarity)) => {
                debug!(similarity, threshold = self.config.threshold, "Best similarity below threshold");
                None
            }
            None => None,
        }
    }

    fn choose_answer(&self, record: &QaRecord) -> Option<String> {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        record.answers().choose(&mut *rng).cloned()
    }

    /// Find the reply for free-form user text
    ///
    /// Errors only come from report triggers: an unusable trigger or a
    /// failing report lookup. A missing match is [`Reply::NoMatch`].
    pub fn find_answer(&self, user_text: &str) -> Result<Reply, MatchError> {
        let (vector, lemmas) = self.normalizer.text_to_vector(user_text);
        let corpus = self.corpus();

        let Some(record) = self.select_record(&corpus, &vector, &lemmas) else {
            return Ok(Reply::NoMatch);
        };
        let Some(answer) = self.choose_answer(record) else {
            return Ok(Reply::NoMatch);
        };

        match answer.strip_prefix(self.config.report_marker.as_str()) {
            Some(rest) => {
                let trigger = parse_report_trigger(rest.trim(), &self.config.report_modes)?;
                info!(mode = %trigger.mode, city = %trigger.city, "Generating report answer");
                let report = self
                    .reports
                    .get_report(&trigger.city, &trigger.mode)
                    .map_err(MatchError::ReportLookup)?;
                Ok(Reply::Report(format_report_reply(&trigger, &report)))
            }
            None => Ok(Reply::Text(answer)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(pairs: &[(&str, u32)]) -> TermVector {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn modes() -> Vec<String> {
        MatcherConfig::default().report_modes
    }

    #[test]
    fn test_cosine_similarity_basics() {
        let a = vector(&[("a", 1), ("b", 1)]);
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&a, &vector(&[("c", 2)])), 0.0);
        assert_eq!(cosine_similarity(&TermVector::new(), &a), 0.0);
        assert_eq!(cosine_similarity(&a, &TermVector::new()), 0.0);
    }

    #[test]
    fn test_cosine_uses_full_norms() {
        let a = vector(&[("a", 3), ("e", 4)]);
        let b = vector(&[("a", 1)]);
        assert_eq!(cosine_similarity(&a, &b), 0.6);
        assert_eq!(cosine_similarity(&b, &a), 0.6);
    }

    #[test]
    fn test_parse_trigger_known_modes() {
        let trigger = parse_report_trigger("Наличии Казань", &modes()).unwrap();
        assert_eq!(trigger.mode, "Наличии");
        assert_eq!(trigger.city, "Казань");

        let trigger = parse_report_trigger("в пути Москва (Дзержинский)", &modes()).unwrap();
        assert_eq!(trigger.mode, "в пути");
        assert_eq!(trigger.city, "Москва (Дзержинский)");
    }

    #[test]
    fn test_parse_trigger_token_shapes() {
        let trigger = parse_report_trigger("Склад Самара", &[]).unwrap();
        assert_eq!((trigger.mode.as_str(), trigger.city.as_str()), ("Склад", "Самара"));

        let trigger = parse_report_trigger("На складе Самара", &[]).unwrap();
        assert_eq!((trigger.mode.as_str(), trigger.city.as_str()), ("На складе", "Самара"));

        assert!(matches!(
            parse_report_trigger("Казань", &modes()),
            Err(MatchError::MalformedReportTrigger(_))
        ));
        assert!(matches!(
            parse_report_trigger("", &modes()),
            Err(MatchError::MalformedReportTrigger(_))
        ));
        // A bare known mode has no city
        assert!(matches!(
            parse_report_trigger("В пути", &modes()),
            Err(MatchError::MalformedReportTrigger(_))
        ));
        assert!(matches!(
            parse_report_trigger("наличии", &modes()),
            Err(MatchError::MalformedReportTrigger(_))
        ));
    }

    #[test]
    fn test_reply_parts() {
        assert_eq!(Reply::Text("a".into()).into_parts(), (Some("a".into()), false));
        assert_eq!(Reply::Report("r".into()).into_parts(), (Some("r".into()), true));
        assert_eq!(Reply::NoMatch.into_parts(), (None, false));
    }
}
