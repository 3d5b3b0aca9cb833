//! Persisted bot state: the promotion file and the published-report message ids

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, error};

use crate::errors::StateError;
use crate::promo::Promo;

/// Content of the promotion data file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromoState {
    pub admin_id: Option<u64>,
    pub promo: Option<Promo>,
}

/// Message ids of one published location report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishedReport {
    /// Text chunks in send order
    #[serde(default)]
    pub texts: Vec<i32>,
    /// First photo of the media group, the one carrying the caption
    #[serde(default)]
    pub caption: Option<i32>,
    /// Remaining photos of the media group
    #[serde(default)]
    pub photos: Vec<i32>,
}

/// Message operations bringing a published location report up to date
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSync {
    /// Captioned photo edited in place
    pub edit_caption: Option<i32>,
    /// A new media group is sent
    pub send_photos: bool,
    /// `(chunk index, message id)` pairs edited in place
    pub edit_texts: Vec<(usize, i32)>,
    /// Chunk indexes sent as new messages
    pub send_texts: Vec<usize>,
    /// Stale messages to delete
    pub delete: Vec<i32>,
}

impl PublishedReport {
    /// Every stored message id, in send order
    pub fn message_ids(&self) -> Vec<i32> {
        self.caption
            .iter()
            .chain(&self.photos)
            .chain(&self.texts)
            .copied()
            .collect()
    }

    /// Plan the update to a report with `text_count` chunks, captioned
    /// photos or not
    ///
    /// When the photo group appears or disappears the old messages are
    /// deleted and the report is sent anew, so the thread keeps photos
    /// above text. Otherwise messages are edited pairwise, missing chunks
    /// are sent and surplus chunks deleted.
    pub fn plan_update(&self, has_caption: bool, text_count: usize) -> ReportSync {
        if self.caption.is_some() != has_caption {
            return ReportSync {
                send_photos: has_caption,
                send_texts: (0..text_count).collect(),
                delete: self.message_ids(),
                ..Default::default()
            };
        }

        let edit_texts: Vec<(usize, i32)> =
            self.texts.iter().copied().take(text_count).enumerate().collect();
        ReportSync {
            edit_caption: self.caption,
            send_photos: false,
            send_texts: (edit_texts.len()..text_count).collect(),
            delete: self.texts.iter().skip(text_count).copied().collect(),
            edit_texts,
        }
    }
}

/// Content of the report data file, keyed by location slug
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportState {
    pub locations: BTreeMap<String, PublishedReport>,
}

impl ReportState {
    pub fn get(&self, slug: &str) -> Option<&PublishedReport> {
        self.locations.get(slug)
    }

    pub fn set(&mut self, slug: &str, report: PublishedReport) {
        self.locations.insert(slug.to_string(), report);
    }

    pub fn clear(&mut self) {
        self.locations.clear();
    }
}

/// Read a JSON state file; a missing file is the default state
pub fn load_json<T>(path: &Path) -> Result<T, StateError>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        debug!(path = %path.display(), "State file absent, starting empty");
        return Ok(T::default());
    }
    let content = fs::read_to_string(path).map_err(|source| StateError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StateError::Serialization {
        path: path.display().to_string(),
        source,
    })
}

/// Read a state file, falling back to the default state on any error
pub fn load_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    load_json(path).unwrap_or_else(|e| {
        error!(error = %e, "Failed to read state, loading empty state");
        T::default()
    })
}

/// Write a state file as pretty JSON with non-ASCII text kept readable
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StateError> {
    let content = serde_json::to_string_pretty(value).map_err(|source| StateError::Serialization {
        path: path.display().to_string(),
        source,
    })?;
    fs::write(path, content).map_err(|source| StateError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let state: PromoState = load_json(&dir.path().join("none.json")).unwrap();
        assert_eq!(state, PromoState::default());
    }

    #[test]
    fn test_report_state_is_a_plain_map() {
        let mut state = ReportState::default();
        state.set(
            "kazan",
            PublishedReport {
                texts: vec![10, 11],
                caption: Some(9),
                photos: vec![8],
            },
        );
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["kazan"]["texts"][1], 11);
        assert_eq!(json["kazan"]["caption"], 9);
    }

    fn published(caption: Option<i32>, photos: &[i32], texts: &[i32]) -> PublishedReport {
        PublishedReport {
            texts: texts.to_vec(),
            caption,
            photos: photos.to_vec(),
        }
    }

    #[test]
    fn test_plan_fresh_report_sends_everything() {
        let plan = PublishedReport::default().plan_update(true, 2);
        assert!(plan.send_photos);
        assert_eq!(plan.send_texts, vec![0, 1]);
        assert!(plan.delete.is_empty());

        let plan = PublishedReport::default().plan_update(false, 1);
        assert!(!plan.send_photos);
        assert_eq!(plan.send_texts, vec![0]);
    }

    #[test]
    fn test_plan_edits_in_place_and_trims_surplus() {
        let plan = published(Some(9), &[8], &[10, 11, 12]).plan_update(true, 2);
        assert_eq!(plan.edit_caption, Some(9));
        assert!(!plan.send_photos);
        assert_eq!(plan.edit_texts, vec![(0, 10), (1, 11)]);
        assert!(plan.send_texts.is_empty());
        assert_eq!(plan.delete, vec![12]);

        let plan = published(None, &[], &[10]).plan_update(false, 3);
        assert_eq!(plan.edit_texts, vec![(0, 10)]);
        assert_eq!(plan.send_texts, vec![1, 2]);
    }

    #[test]
    fn test_plan_drops_photo_group_that_disappeared() {
        let plan = published(Some(9), &[8, 7], &[10]).plan_update(false, 1);
        assert_eq!(plan.edit_caption, None);
        assert!(plan.edit_texts.is_empty());
        assert_eq!(plan.send_texts, vec![0]);
        assert_eq!(plan.delete, vec![9, 8, 7, 10]);
    }

    #[test]
    fn test_plan_republishes_when_photos_appear() {
        let plan = published(None, &[], &[10, 11]).plan_update(true, 1);
        assert!(plan.send_photos);
        assert_eq!(plan.send_texts, vec![0]);
        assert_eq!(plan.delete, vec![10, 11]);
    }
}
