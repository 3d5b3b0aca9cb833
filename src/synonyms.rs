//! Synonym lexicon for query expansion
//!
//! A lexicon is a list of synsets: groups of words or phrases that share a
//! sense. Every member is indexed by its normalized form, so a lemma finds all
//! synsets it belongs to. A word listed in several synsets gets every sense.

use log::info;
use std::collections::HashMap;
use std::fs;

use crate::errors::NormalizerError;
use crate::text_processing::{normalize_phrase, MorphAnalyzer};

/// Source of synonym phrases for a lemma
pub trait SynonymLexicon: Send + Sync {
    /// Raw phrases of every synset containing `lemma` (the lemma's own entry included)
    fn synonyms(&self, lemma: &str) -> Vec<String>;
}

/// Lexicon without entries
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyLexicon;

impl SynonymLexicon for EmptyLexicon {
    fn synonyms(&self, _lemma: &str) -> Vec<String> {
        Vec::new()
    }
}

/// In-memory synset lexicon
#[derive(Debug, Default, Clone)]
pub struct SynsetLexicon {
    synsets: Vec<Vec<String>>,
    index: HashMap<String, Vec<usize>>,
}

impl SynsetLexicon {
    /// Index `synsets` under the normal form produced by `analyzer`
    pub fn new(synsets: Vec<Vec<String>>, analyzer: &dyn MorphAnalyzer) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, synset) in synsets.iter().enumerate() {
            for member in synset {
                let key = normalize_phrase(analyzer, member);
                if key.is_empty() {
                    continue;
                }
                let entry = index.entry(key).or_default();
                if !entry.contains(&position) {
                    entry.push(position);
                }
            }
        }
        Self { synsets, index }
    }

    /// Load a JSON array of synsets, e.g. `[["акция", "распродажа"], ["цена", "стоимость"]]`
    pub fn load(path: &str, analyzer: &dyn MorphAnalyzer) -> Result<Self, NormalizerError> {
        let content = fs::read_to_string(path).map_err(|e| NormalizerError::ResourceUnavailable {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let synsets: Vec<Vec<String>> =
            serde_json::from_str(&content).map_err(|e| NormalizerError::MalformedResource {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let lexicon = Self::new(synsets, analyzer);
        info!(
            "Loaded synonym lexicon from {}: {} synsets, {} entries",
            path,
            lexicon.synset_count(),
            lexicon.index.len()
        );
        Ok(lexicon)
    }

    pub fn synset_count(&self) -> usize {
        self.synsets.len()
    }
}

impl SynonymLexicon for SynsetLexicon {
    fn synonyms(&self, lemma: &str) -> Vec<String> {
        match self.index.get(lemma) {
            Some(positions) => positions
                .iter()
                .flat_map(|&p| self.synsets[p].iter().cloned())
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_processing::{DictionaryAnalyzer, IdentityAnalyzer};

    fn synsets(groups: &[&[&str]]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_lookup_by_member() {
        let lexicon = SynsetLexicon::new(
            synsets(&[&["скидка", "акция"], &["цена", "стоимость"]]),
            &IdentityAnalyzer,
        );

        let found = lexicon.synonyms("акция");
        assert!(found.contains(&"скидка".to_string()));
        assert!(!found.contains(&"цена".to_string()));
        assert!(lexicon.synonyms("доставка").is_empty());
    }

    #[test]
    fn test_polysemous_word_gets_every_sense() {
        let lexicon = SynsetLexicon::new(
            synsets(&[&["ключ", "родник"], &["ключ", "отмычка"]]),
            &IdentityAnalyzer,
        );

        let found = lexicon.synonyms("ключ");
        assert!(found.contains(&"родник".to_string()));
        assert!(found.contains(&"отмычка".to_string()));
    }

    #[test]
    fn test_members_indexed_by_normal_form() {
        let analyzer = DictionaryAnalyzer::from_pairs([("скидки", "скидка")]);
        let lexicon = SynsetLexicon::new(synsets(&[&["скидки", "акция"]]), &analyzer);

        assert!(lexicon.synonyms("скидка").contains(&"акция".to_string()));
        assert!(lexicon.synonyms("скидки").is_empty());
    }

    #[test]
    fn test_load_missing_file_is_resource_error() {
        let result = SynsetLexicon::load("/nonexistent/synonyms.json", &IdentityAnalyzer);
        assert!(matches!(
            result,
            Err(NormalizerError::ResourceUnavailable { .. })
        ));
    }
}
