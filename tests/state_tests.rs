//! # State Persistence Tests
//!
//! Promotion and report-id files survive a restart and a damaged file never
//! prevents startup.

use chrono::{TimeZone, Utc};
use std::fs;
use tempfile::tempdir;

use storefront_bot::errors::StateError;
use storefront_bot::promo::Promo;
use storefront_bot::state::{
    load_json, load_or_default, save_json, PromoState, PublishedReport, ReportState,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_promo_survives_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("promo_data.json");
        let started = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let mut promo = Promo::new("Осталось {{time}}".to_string(), 3600);
        promo.start(started);
        promo.record_message(745, 1001);
        let state = PromoState {
            admin_id: Some(123456),
            promo: Some(promo),
        };
        save_json(&path, &state).unwrap();

        let restored: PromoState = load_json(&path).unwrap();
        assert_eq!(restored, state);

        let promo = restored.promo.unwrap();
        let later = Utc.timestamp_opt(1_700_000_600, 0).unwrap();
        assert_eq!(promo.remaining(later), 3000);
        assert_eq!(promo.message_for(745), Some(1001));
    }

    #[test]
    fn test_saved_file_keeps_cyrillic_readable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("promo_data.json");
        let state = PromoState {
            admin_id: None,
            promo: Some(Promo::new("Скидка {{time}}".to_string(), 60)),
        };
        save_json(&path, &state).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Скидка {{time}}"));
        assert!(content.contains('\n'));
    }

    #[test]
    fn test_corrupt_file_loads_default_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report_data.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            load_json::<ReportState>(&path),
            Err(StateError::Serialization { .. })
        ));
        let state: ReportState = load_or_default(&path);
        assert_eq!(state, ReportState::default());
    }

    #[test]
    fn test_promo_file_without_message_map() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("promo_data.json");
        fs::write(
            &path,
            r#"{"admin_id": 7, "promo": {"template": "{{time}}", "initial": 60,
                "duration": 60, "start_time": null, "active": false}}"#,
        )
        .unwrap();

        let state: PromoState = load_json(&path).unwrap();
        assert_eq!(state.admin_id, Some(7));
        assert!(state.promo.unwrap().messages.is_empty());
    }

    #[test]
    fn test_report_ids_round_trip_and_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report_data.json");

        let mut state = ReportState::default();
        state.set(
            "kazan",
            PublishedReport {
                texts: vec![11, 12],
                caption: Some(10),
                photos: vec![9],
            },
        );
        state.set("samara", PublishedReport::default());
        save_json(&path, &state).unwrap();

        let mut restored: ReportState = load_json(&path).unwrap();
        assert_eq!(
            restored.get("kazan").map(PublishedReport::message_ids),
            Some(vec![10, 9, 11, 12])
        );
        assert_eq!(restored.get("samara"), Some(&PublishedReport::default()));
        assert!(restored.get("omsk").is_none());

        restored.clear();
        save_json(&path, &restored).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[test]
    fn test_unwritable_path_reports_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("state.json");

        assert!(matches!(
            save_json(&path, &PromoState::default()),
            Err(StateError::Io { .. })
        ));
    }
}
