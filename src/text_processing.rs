//! # Text Processing Module
//!
//! This module provides the lexical normalizer used by the answer engine:
//! tokenization on Unicode word boundaries, reduction of every token to a
//! base form, and expansion of a lemma set with its synonyms.
//!
//! ## Features
//!
//! - Locale-aware word splitting (UAX #29 word boundaries)
//! - Pluggable morphology through the [`MorphAnalyzer`] trait
//!   (Russian Snowball stemmer, form→lemma dictionaries, identity)
//! - Synonym expansion through the [`SynonymLexicon`] trait
//! - Term vectors over the expanded vocabulary, lemma sets over the literal input

use log::{debug, info, trace};
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

use crate::errors::NormalizerError;
use crate::synonyms::SynonymLexicon;

/// Occurrence counts over the expanded (synonym-included) vocabulary
pub type TermVector = HashMap<String, u32>;

/// Base forms of the literal input tokens, without synonym expansion
pub type LemmaSet = HashSet<String>;

/// Reduces a lower-cased token to its dictionary base form
pub trait MorphAnalyzer: Send + Sync {
    /// Returns the base form, or `None` when the analyzer has nothing to offer
    fn normal_form(&self, token: &str) -> Option<String>;
}

/// Analyzer that keeps every token as is
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityAnalyzer;

impl MorphAnalyzer for IdentityAnalyzer {
    fn normal_form(&self, token: &str) -> Option<String> {
        Some(token.to_string())
    }
}

/// Russian Snowball stemmer
///
/// Stems are not dictionary lemmas, but every inflected form of a word
/// collapses onto the same stem, which is what matching needs.
pub struct SnowballAnalyzer {
    stemmer: Stemmer,
}

impl SnowballAnalyzer {
    pub fn russian() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::Russian),
        }
    }
}

impl Default for SnowballAnalyzer {
    fn default() -> Self {
        Self::russian()
    }
}

impl MorphAnalyzer for SnowballAnalyzer {
    fn normal_form(&self, token: &str) -> Option<String> {
        if token.is_empty() {
            return None;
        }
        let folded = token.replace('ё', "е");
        let stem = self.stemmer.stem(&folded);
        if stem.is_empty() {
            None
        } else {
            Some(stem.into_owned())
        }
    }
}

/// Form→lemma table, optionally backed by another analyzer for unknown forms
pub struct DictionaryAnalyzer {
    forms: HashMap<String, String>,
    fallback: Option<Box<dyn MorphAnalyzer>>,
}

impl DictionaryAnalyzer {
    /// Build a dictionary from `(form, lemma)` pairs
    pub fn from_pairs<I, F, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (F, L)>,
        F: Into<String>,
        L: Into<String>,
    {
        let forms = pairs
            .into_iter()
            .map(|(form, lemma)| (form.into().to_lowercase(), lemma.into().to_lowercase()))
            .collect();
        Self {
            forms,
            fallback: None,
        }
    }

    /// Load a `form<TAB>lemma` file; blank lines and `#` comments are ignored
    pub fn load(path: &str) -> Result<Self, NormalizerError> {
        let content = fs::read_to_string(path).map_err(|e| NormalizerError::ResourceUnavailable {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        let mut pairs = Vec::new();
        for (line_number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('\t') {
                Some((form, lemma)) if !form.trim().is_empty() && !lemma.trim().is_empty() => {
                    pairs.push((form.trim().to_string(), lemma.trim().to_string()));
                }
                _ => {
                    return Err(NormalizerError::MalformedResource {
                        path: path.to_string(),
                        reason: format!("line {} is not 'form<TAB>lemma'", line_number + 1),
                    });
                }
            }
        }

        info!("Loaded {} word forms from {}", pairs.len(), path);
        Ok(Self::from_pairs(pairs))
    }

    /// Use `fallback` for forms missing from the table
    pub fn with_fallback(mut self, fallback: Box<dyn MorphAnalyzer>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

impl MorphAnalyzer for DictionaryAnalyzer {
    fn normal_form(&self, token: &str) -> Option<String> {
        match self.forms.get(token) {
            Some(lemma) => Some(lemma.clone()),
            None => self.fallback.as_ref().and_then(|f| f.normal_form(token)),
        }
    }
}

/// Split lower-cased text into word tokens; punctuation never becomes a token
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .unicode_words()
        .map(|word| word.to_string())
        .collect()
}

/// Reduce one token, keeping the token itself when the analyzer yields nothing
pub fn lemmatize_token(analyzer: &dyn MorphAnalyzer, token: &str) -> String {
    match analyzer.normal_form(token) {
        Some(lemma) if !lemma.is_empty() => lemma,
        _ => token.to_string(),
    }
}

/// Normalize a multi-word phrase: separators become spaces, words are lemmatized
///
/// Used for synonym phrases and catalog keywords so that they live in the same
/// vocabulary as lemmatized user text.
pub fn normalize_phrase(analyzer: &dyn MorphAnalyzer, phrase: &str) -> String {
    let spaced = phrase.to_lowercase().replace(['_', '-'], " ");
    tokenize(&spaced)
        .iter()
        .map(|token| lemmatize_token(analyzer, token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lexical normalizer combining a morphology analyzer and a synonym lexicon
///
/// Both capabilities are constructed once at startup and shared; the
/// normalizer itself holds no mutable state and is safe to use from any
/// number of concurrent handlers.
#[derive(Clone)]
pub struct Normalizer {
    analyzer: Arc<dyn MorphAnalyzer>,
    lexicon: Arc<dyn SynonymLexicon>,
}

impl Normalizer {
    pub fn new(analyzer: Arc<dyn MorphAnalyzer>, lexicon: Arc<dyn SynonymLexicon>) -> Self {
        Self { analyzer, lexicon }
    }

    /// Lower-case, split into words and reduce every word to its base form
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use storefront_bot::synonyms::EmptyLexicon;
    /// use storefront_bot::text_processing::{DictionaryAnalyzer, Normalizer};
    ///
    /// let analyzer = DictionaryAnalyzer::from_pairs([("акцию", "акция")]);
    /// let normalizer = Normalizer::new(Arc::new(analyzer), Arc::new(EmptyLexicon));
    ///
    /// assert_eq!(
    ///     normalizer.tokenize_and_lemmatize("Расскажи про акцию!"),
    ///     vec!["расскажи", "про", "акция"]
    /// );
    /// ```
    pub fn tokenize_and_lemmatize(&self, text: &str) -> Vec<String> {
        let lemmas: Vec<String> = tokenize(text)
            .iter()
            .map(|token| lemmatize_token(self.analyzer.as_ref(), token))
            .collect();
        trace!("Lemmatized '{}' -> {:?}", text, lemmas);
        lemmas
    }

    /// Normalize a phrase into the lemma vocabulary (see [`normalize_phrase`])
    pub fn normalize_phrase(&self, phrase: &str) -> String {
        normalize_phrase(self.analyzer.as_ref(), phrase)
    }

    /// Add every synonym of every lemma; the input lemmas are always kept
    ///
    /// Polysemous words pull in all of their senses. Repeated expansion of a
    /// fixed input only ever grows within the finite lexicon.
    pub fn expand_with_synonyms<'a, I>(&self, lemmas: I) -> HashSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut expanded = HashSet::new();
        for lemma in lemmas {
            expanded.insert(lemma.clone());
            for phrase in self.lexicon.synonyms(lemma) {
                let normalized = self.normalize_phrase(&phrase);
                if !normalized.is_empty() {
                    expanded.insert(normalized);
                }
            }
        }
        expanded
    }

    /// Build the term vector over the expanded vocabulary and the literal lemma set
    pub fn text_to_vector(&self, text: &str) -> (TermVector, LemmaSet) {
        let lemmas = self.tokenize_and_lemmatize(text);
        let expanded = self.expand_with_synonyms(lemmas.iter());

        let mut vector = TermVector::new();
        for term in expanded {
            *vector.entry(term).or_insert(0) += 1;
        }

        let lemma_set: LemmaSet = lemmas.into_iter().collect();
        debug!(
            "Vectorized text: {} lemmas, {} expanded terms",
            lemma_set.len(),
            vector.len()
        );
        (vector, lemma_set)
    }
}
