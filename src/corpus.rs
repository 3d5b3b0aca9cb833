//! Question corpus: the fixed set of records the answer matcher ranks against

use log::{info, warn};
use std::collections::HashSet;

use crate::catalog::CatalogEntry;
use crate::errors::CorpusError;
use crate::text_processing::{Normalizer, TermVector};

/// One question variant with its precomputed vector, answers and required keywords
#[derive(Debug, Clone, PartialEq)]
pub struct QaRecord {
    question: String,
    vector: TermVector,
    answers: Vec<String>,
    keywords: HashSet<String>,
}

impl QaRecord {
    /// Returns `None` when `answers` is empty; such a record must never exist
    pub fn new(
        question: impl Into<String>,
        vector: TermVector,
        answers: Vec<String>,
        keywords: HashSet<String>,
    ) -> Option<Self> {
        if answers.is_empty() {
            return None;
        }
        Some(Self {
            question: question.into(),
            vector,
            answers,
            keywords,
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn vector(&self) -> &TermVector {
        &self.vector
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn keywords(&self) -> &HashSet<String> {
        &self.keywords
    }
}

/// Immutable list of records, never empty
#[derive(Debug, Clone)]
pub struct Corpus {
    records: Vec<QaRecord>,
}

impl Corpus {
    pub fn from_records(records: Vec<QaRecord>) -> Result<Self, CorpusError> {
        if records.is_empty() {
            return Err(CorpusError::Empty);
        }
        Ok(Self { records })
    }

    /// Run every question variant of every entry through the normalizer
    ///
    /// Each variant becomes its own record; variants of one entry share the
    /// answers and the keywords. Entries without answers are skipped.
    pub fn build(entries: &[CatalogEntry], normalizer: &Normalizer) -> Result<Self, CorpusError> {
        let mut records = Vec::new();

        for entry in entries {
            let keywords: HashSet<String> = entry
                .keywords
                .iter()
                .map(|kw| normalizer.normalize_phrase(kw))
                .filter(|kw| !kw.is_empty())
                .collect();
            for phrase in keywords.iter().filter(|kw| kw.contains(' ')) {
                // Overlap compares single lemmas, so a phrase never counts
                warn!(
                    "Multi-word keyword '{}' cannot match a single lemma; use separate keywords",
                    phrase
                );
            }

            for question in &entry.questions {
                let (vector, _) = normalizer.text_to_vector(question);
                match QaRecord::new(
                    question.clone(),
                    vector,
                    entry.answers.clone(),
                    keywords.clone(),
                ) {
                    Some(record) => records.push(record),
                    None => warn!("Skipping question '{}' without answers", question),
                }
            }
        }

        info!(
            "Built question corpus: {} records from {} catalog entries",
            records.len(),
            entries.len()
        );
        Self::from_records(records)
    }

    pub fn records(&self) -> &[QaRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synonyms::EmptyLexicon;
    use crate::text_processing::IdentityAnalyzer;
    use std::sync::Arc;

    fn normalizer() -> Normalizer {
        Normalizer::new(Arc::new(IdentityAnalyzer), Arc::new(EmptyLexicon))
    }

    #[test]
    fn test_record_requires_answers() {
        assert!(QaRecord::new("q", TermVector::new(), vec![], HashSet::new()).is_none());
        assert!(QaRecord::new("q", TermVector::new(), vec!["a".into()], HashSet::new()).is_some());
    }

    #[test]
    fn test_one_record_per_question_variant() {
        let entries = vec![CatalogEntry {
            questions: vec!["есть акция".into(), "какие скидки".into()],
            answers: vec!["Да".into(), "Конечно".into()],
            keywords: vec!["Акция".into()],
        }];

        let corpus = Corpus::build(&entries, &normalizer()).unwrap();

        assert_eq!(corpus.len(), 2);
        for record in corpus.records() {
            assert_eq!(record.answers().len(), 2);
            assert!(record.keywords().contains("акция"));
        }
        assert!(corpus.records()[1].vector().contains_key("скидки"));
    }

    #[test]
    fn test_empty_corpus_is_error() {
        let entries = vec![CatalogEntry {
            questions: vec!["вопрос".into()],
            answers: vec![],
            keywords: vec![],
        }];
        assert!(matches!(
            Corpus::build(&entries, &normalizer()),
            Err(CorpusError::Empty)
        ));
        assert!(matches!(Corpus::build(&[], &normalizer()), Err(CorpusError::Empty)));
    }

    #[test]
    fn test_multi_word_keyword_kept_as_phrase() {
        let entries = vec![CatalogEntry {
            questions: vec!["что в пути".into()],
            answers: vec!["Скоро".into()],
            keywords: vec![" В  пути ".into(), "пути".into()],
        }];
        let normalizer = normalizer();
        let corpus = Corpus::build(&entries, &normalizer).unwrap();
        let record = &corpus.records()[0];

        assert!(record.keywords().contains("в пути"));
        let (_, lemmas) = normalizer.text_to_vector("в пути");
        // Only the single-word keyword overlaps
        assert_eq!(crate::answer_matcher::keyword_overlap(record, &lemmas), 1);
    }
}
