//! # Promotions Module
//!
//! A single countdown promotion: a text template with one `{{time}}`
//! placeholder, published into the group thread and re-rendered every tick
//! with the remaining time.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::PromoError;

/// Placeholder replaced by the remaining time
pub const TIME_PLACEHOLDER: &str = "{{time}}";

const MAX_DURATION_HOURS: u64 = 24;

lazy_static! {
    static ref DURATION: Regex =
        Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$").expect("Duration pattern should be valid");
}

/// Format seconds as `HH:MM:SS`
///
/// # Examples
///
/// ```
/// use storefront_bot::promo::fmt_secs;
///
/// assert_eq!(fmt_secs(3725), "01:02:05");
/// assert_eq!(fmt_secs(0), "00:00:00");
/// ```
pub fn fmt_secs(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Substitute the formatted remaining time into the template
pub fn render_text(template: &str, remaining: u64) -> String {
    template.replace(TIME_PLACEHOLDER, &fmt_secs(remaining))
}

/// Accept a template with exactly one placeholder
pub fn validate_template(template: &str) -> Result<String, PromoError> {
    match template.matches(TIME_PLACEHOLDER).count() {
        1 => Ok(template.to_string()),
        n => Err(PromoError::Placeholder(n)),
    }
}

/// Parse `H:MM`, `HH:MM`, `H:MM:SS` or `HH:MM:SS` into seconds
///
/// Minutes and seconds must be below 60, the total above zero and at most
/// 24 hours' worth of hours.
pub fn parse_duration(input: &str) -> Result<u64, PromoError> {
    let trimmed = input.trim();
    let caps = DURATION
        .captures(trimmed)
        .ok_or_else(|| PromoError::DurationFormat(trimmed.to_string()))?;

    let field = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let (h, m, s) = (field(1), field(2), field(3));

    if m >= 60 || s >= 60 || (h == 0 && m == 0 && s == 0) || h > MAX_DURATION_HOURS {
        return Err(PromoError::DurationRange(trimmed.to_string()));
    }
    Ok(h * 3600 + m * 60 + s)
}

/// Persisted promotion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promo {
    pub template: String,
    /// Countdown length in seconds
    pub initial: u64,
    pub duration: u64,
    /// Unix timestamp of the last activation
    pub start_time: Option<i64>,
    pub active: bool,
    /// Published message id per thread id
    #[serde(default)]
    pub messages: BTreeMap<String, i32>,
}

impl Promo {
    /// Inactive promotion as created by the admin dialogue
    pub fn new(template: String, duration: u64) -> Self {
        Self {
            template,
            initial: duration,
            duration,
            start_time: None,
            active: false,
            messages: BTreeMap::new(),
        }
    }

    /// Seconds left at `now`; the full length while inactive
    pub fn remaining(&self, now: DateTime<Utc>) -> u64 {
        if !self.active {
            return self.initial;
        }
        let Some(start) = self.start_time else {
            return self.initial;
        };
        let elapsed = (now.timestamp() - start).max(0) as u64;
        self.initial.saturating_sub(elapsed)
    }

    pub fn render(&self, now: DateTime<Utc>) -> String {
        render_text(&self.template, self.remaining(now))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.active && self.remaining(now) == 0
    }

    /// Mark active from `now` and forget previously published messages
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.active = true;
        self.start_time = Some(now.timestamp());
        self.messages.clear();
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.messages.clear();
    }

    pub fn record_message(&mut self, thread_id: i32, message_id: i32) {
        self.messages.insert(thread_id.to_string(), message_id);
    }

    pub fn message_for(&self, thread_id: i32) -> Option<i32> {
        self.messages.get(&thread_id.to_string()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_render_text() {
        assert_eq!(
            render_text("Скидка! Осталось {{time}}", 90),
            "Скидка! Осталось 00:01:30"
        );
        assert_eq!(fmt_secs(24 * 3600), "24:00:00");
    }

    #[test]
    fn test_validate_template() {
        assert!(validate_template("До конца {{time}}").is_ok());
        assert_eq!(validate_template("нет времени"), Err(PromoError::Placeholder(0)));
        assert_eq!(
            validate_template("{{time}} и {{time}}"),
            Err(PromoError::Placeholder(2))
        );
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("02:30"), Ok(9000));
        assert_eq!(parse_duration("1:15:05"), Ok(4505));
        assert_eq!(parse_duration(" 24:00 "), Ok(86400));
        assert!(matches!(parse_duration("25:00"), Err(PromoError::DurationRange(_))));
        assert!(matches!(parse_duration("00:00"), Err(PromoError::DurationRange(_))));
        assert!(matches!(parse_duration("01:60"), Err(PromoError::DurationRange(_))));
        assert!(matches!(parse_duration("1:5"), Err(PromoError::DurationFormat(_))));
        assert!(matches!(parse_duration("abc"), Err(PromoError::DurationFormat(_))));
    }

    #[test]
    fn test_remaining() {
        let mut promo = Promo::new("{{time}}".into(), 120);
        assert_eq!(promo.remaining(at(1_000)), 120);

        promo.start(at(1_000));
        assert_eq!(promo.remaining(at(1_030)), 90);
        assert_eq!(promo.render(at(1_030)), "00:01:30");
        assert!(!promo.is_expired(at(1_119)));
        assert!(promo.is_expired(at(1_120)));
        assert_eq!(promo.remaining(at(5_000)), 0);

        promo.stop();
        assert_eq!(promo.remaining(at(5_000)), 120);
    }

    #[test]
    fn test_messages_keyed_by_thread() {
        let mut promo = Promo::new("{{time}}".into(), 60);
        promo.record_message(745, 42);
        assert_eq!(promo.message_for(745), Some(42));
        promo.start(at(0));
        assert_eq!(promo.message_for(745), None);
    }
}
