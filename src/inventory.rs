//! # Inventory Module
//!
//! Stock report data scraped from the warehouse sheet: per-location lists of
//! items in stock and on the way, plus the free-text blocks the sheet keeps
//! for publications.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::answer_matcher::ReportLookup;
use crate::errors::SheetError;
use crate::markup::{
    escape_html, escape_html_attr, split_text_safe, MarkdownV2, CAPTION_LIMIT, MESSAGE_LIMIT,
};
use crate::sheets::SheetGrid;

/// Cell holding the text published before all location reports
pub const BEGIN_PUBLICATION_CELL: &str = "N18";
/// Cell holding the text published after all location reports
pub const FINISH_PUBLICATION_CELL: &str = "N19";

pub const EMPTY_REPORT: &str = "Здесь пока пусто";
pub const UNKNOWN_CITY: &str = "Город не найден";
pub const UNKNOWN_MODE: &str = "Некорректный режим. Используйте 'Наличие' или 'В пути'.";

lazy_static! {
    static ref IMAGE_SEPARATOR: Regex =
        Regex::new(r"[,\s]+").expect("Image separator pattern should be valid");
}

/// A warehouse location and where its publication texts live in the sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub slug: &'static str,
    /// Display name
    pub name: &'static str,
    /// Lower-case fragments identifying the location in free text
    pub variants: &'static [&'static str],
    pub intro_cell: &'static str,
    pub outro_cell: &'static str,
}

pub const LOCATIONS: &[Location] = &[
    Location {
        slug: "kazan",
        name: "Казань",
        variants: &["казан", "казани"],
        intro_cell: "N2",
        outro_cell: "N3",
    },
    Location {
        slug: "novosibirsk",
        name: "Новосибирск",
        variants: &["новосиб", "новосибир", "новосибирске"],
        intro_cell: "O2",
        outro_cell: "O3",
    },
    Location {
        slug: "samara",
        name: "Самара",
        variants: &["самар", "самаре"],
        intro_cell: "P2",
        outro_cell: "P3",
    },
    Location {
        slug: "krasnodar",
        name: "Краснодар",
        variants: &["краснод", "краснодаре"],
        intro_cell: "Q2",
        outro_cell: "Q3",
    },
    Location {
        slug: "ekaterinburg",
        name: "Екатеринбург",
        variants: &["екатерен", "екатерин"],
        intro_cell: "R2",
        outro_cell: "R3",
    },
    Location {
        slug: "moscow_dzerzhinsky",
        name: "Москва (Дзержинский)",
        variants: &["москва (дзержинский)"],
        intro_cell: "S2",
        outro_cell: "S3",
    },
];

/// First location whose variant occurs anywhere in `text`
pub fn detect_location(text: &str) -> Option<&'static Location> {
    let text = text.to_lowercase();
    LOCATIONS
        .iter()
        .find(|loc| loc.variants.iter().any(|v| text.contains(v)))
}

/// Location by display name (case-insensitive), then by variant detection
pub fn find_location(city: &str) -> Option<&'static Location> {
    let wanted = city.trim().to_lowercase();
    LOCATIONS
        .iter()
        .find(|loc| loc.name.to_lowercase() == wanted)
        .or_else(|| detect_location(&wanted))
}

/// Report section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    Available,
    OnTheWay,
}

impl StockStatus {
    /// Classify a free-text status or report mode
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.to_lowercase();
        if text.contains("наличи") {
            Some(StockStatus::Available)
        } else if text.contains("пути") {
            Some(StockStatus::OnTheWay)
        } else {
            None
        }
    }

    /// Section title used in publications
    pub fn title(self) -> &'static str {
        match self {
            StockStatus::Available => "Наличие:",
            StockStatus::OnTheWay => "В пути:",
        }
    }
}

/// One sheet row describing an item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockItem {
    pub name: String,
    pub link: String,
    pub description: String,
    pub count: String,
    pub images: Vec<String>,
    pub reviews: String,
    pub price_available: String,
    pub price_order: String,
    pub link_order: String,
    pub arrival: String,
}

impl StockItem {
    /// HTML line used in chat report answers
    pub fn to_html_line(&self, status: StockStatus) -> String {
        let name = escape_html(&self.name);
        let mut text = if self.link.is_empty() {
            name
        } else {
            format!("<a href='{}'>{}</a>", escape_html_attr(&self.link), name)
        };
        if !self.description.is_empty() {
            text.push(' ');
            text.push_str(&escape_html(&self.description));
        }
        if !self.reviews.is_empty() {
            text.push_str(&format!(" <a href='{}'>Отзывы</a>", escape_html_attr(&self.reviews)));
        }
        if status == StockStatus::OnTheWay && !self.arrival.is_empty() {
            text.push_str(&format!("\nПрибытие {}", escape_html(&self.arrival)));
        }
        text
    }

    /// MarkdownV2 line used in channel publications
    pub fn to_markdown_line(&self) -> String {
        let mut line = if self.link.is_empty() {
            MarkdownV2::escape(&self.name)
        } else {
            MarkdownV2::link(&self.name, &self.link)
        };
        if !self.description.is_empty() {
            line.push(' ');
            line.push_str(&MarkdownV2::escape(&self.description));
        }
        if !self.reviews.is_empty() {
            line.push(' ');
            line.push_str(&MarkdownV2::link("Отзывы", &self.reviews));
        }
        if !self.price_available.is_empty() {
            line.push_str(&format!(" Цена {}", MarkdownV2::escape(&self.price_available)));
        }
        match (self.link_order.is_empty(), self.price_order.is_empty()) {
            (false, false) => line.push_str(&format!(
                " {}",
                MarkdownV2::link(&format!("Под заказ {}", self.price_order), &self.link_order)
            )),
            (false, true) => line.push_str(&format!(" {}", MarkdownV2::link("Под заказ", &self.link_order))),
            (true, false) => line.push_str(&format!(" Под заказ {}", MarkdownV2::escape(&self.price_order))),
            (true, true) => {}
        }
        if !self.arrival.is_empty() {
            line.push('\n');
            line.push_str(&MarkdownV2::escape(&format!("Прибытие {}", self.arrival)));
        }
        line
    }
}

/// One location report cut into Telegram-sized pieces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportMessages {
    /// Up to ten photo URLs sent as a media group
    pub photos: Vec<String>,
    /// Caption of the first photo, present only with photos
    pub caption: Option<String>,
    /// Text messages following the photos
    pub texts: Vec<String>,
}

impl ReportMessages {
    pub const MAX_PHOTOS: usize = 10;

    /// Split a rendered report: the first caption-sized chunk goes under the
    /// photos and the rest is re-split into message-sized chunks
    pub fn split(full_text: &str, images: &[String]) -> Self {
        if images.is_empty() {
            return Self {
                photos: Vec::new(),
                caption: None,
                texts: split_text_safe(full_text, MESSAGE_LIMIT),
            };
        }

        let mut chunks = split_text_safe(full_text, CAPTION_LIMIT).into_iter();
        let caption = chunks.next();
        let rest: Vec<String> = chunks.collect();
        Self {
            photos: images.iter().take(Self::MAX_PHOTOS).cloned().collect(),
            caption,
            texts: split_text_safe(&rest.join("\n"), MESSAGE_LIMIT),
        }
    }
}

/// Stock of one location
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationStock {
    pub available: Vec<StockItem>,
    pub on_the_way: Vec<StockItem>,
    pub intro: String,
    pub outro: String,
}

impl LocationStock {
    pub fn items(&self, status: StockStatus) -> &[StockItem] {
        match status {
            StockStatus::Available => &self.available,
            StockStatus::OnTheWay => &self.on_the_way,
        }
    }

    /// Photo URLs of every item, in report order
    pub fn images(&self) -> Vec<String> {
        self.available
            .iter()
            .chain(&self.on_the_way)
            .flat_map(|item| item.images.iter().cloned())
            .collect()
    }

    /// Full MarkdownV2 publication text for this location
    pub fn render_markdown(&self, location: &Location) -> String {
        let intro = if self.intro.is_empty() {
            String::new()
        } else {
            format!("\n\n{}", self.intro)
        };
        let mut parts = vec![MarkdownV2::bold(&format!(
            "Отчёт по складу ({}){}",
            location.name, intro
        ))];

        for status in [StockStatus::Available, StockStatus::OnTheWay] {
            let items = self.items(status);
            if items.is_empty() {
                continue;
            }
            parts.push(MarkdownV2::bold(status.title()));
            parts.extend(items.iter().map(StockItem::to_markdown_line));
        }

        if !self.outro.is_empty() {
            parts.push(MarkdownV2::escape(&self.outro));
        }
        parts.join("\n\n")
    }

    pub fn publication(&self, location: &Location) -> ReportMessages {
        ReportMessages::split(&self.render_markdown(location), &self.images())
    }
}

/// Parsed warehouse sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    /// Keyed by location slug; every known location is present
    pub locations: BTreeMap<&'static str, LocationStock>,
    pub begin_text: String,
    pub finish_text: String,
}

fn optional_cell(grid: &SheetGrid, address: &str) -> String {
    match grid.cell(address) {
        Ok(value) => value.to_string(),
        Err(e) => {
            debug!(cell = address, error = %e, "Publication cell unavailable");
            String::new()
        }
    }
}

impl Inventory {
    /// Parse the header-less warehouse grid
    ///
    /// The header row is the first row with both `склад` and `статус` cells.
    pub fn from_grid(grid: &SheetGrid) -> Result<Self, SheetError> {
        let header_idx = grid
            .rows()
            .iter()
            .position(|row| {
                let lower: Vec<String> = row.iter().map(|c| c.to_lowercase()).collect();
                lower.iter().any(|c| c == "склад") && lower.iter().any(|c| c == "статус")
            })
            .ok_or_else(|| SheetError::MissingHeader("Склад/Статус".to_string()))?;

        let headers = &grid.rows()[header_idx];
        let column = |name: &str| headers.iter().position(|h| h.trim() == name);
        let field = |row: &[String], name: &str| -> String {
            column(name)
                .and_then(|idx| row.get(idx))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };

        let mut locations: BTreeMap<&'static str, LocationStock> = LOCATIONS
            .iter()
            .map(|loc| {
                (
                    loc.slug,
                    LocationStock {
                        intro: optional_cell(grid, loc.intro_cell),
                        outro: optional_cell(grid, loc.outro_cell),
                        ..Default::default()
                    },
                )
            })
            .collect();

        let mut skipped = 0usize;
        for row in &grid.rows()[header_idx + 1..] {
            let location = detect_location(&field(row, "Склад"));
            let status = field(row, "Статус").to_lowercase();
            let count = field(row, "Кол");

            let (Some(location), false) = (location, status.is_empty()) else {
                skipped += 1;
                continue;
            };
            if matches!(count.as_str(), "" | "0" | "0.0") {
                skipped += 1;
                continue;
            }
            let Some(stock_status) = StockStatus::from_text(&status) else {
                skipped += 1;
                continue;
            };

            let item = StockItem {
                name: field(row, "Название"),
                link: field(row, "Ссылка"),
                description: field(row, "Описание"),
                count,
                images: IMAGE_SEPARATOR
                    .split(&field(row, "Картинки"))
                    .filter(|u| !u.is_empty())
                    .map(str::to_string)
                    .collect(),
                reviews: field(row, "Отзывы по модели"),
                price_available: field(row, "Цена из наличия"),
                price_order: field(row, "Цена под заказ"),
                link_order: field(row, "Под заказ"),
                arrival: field(row, "Прибытие"),
            };

            let stock = locations.entry(location.slug).or_default();
            match stock_status {
                StockStatus::Available => stock.available.push(item),
                StockStatus::OnTheWay => stock.on_the_way.push(item),
            }
        }

        let inventory = Self {
            locations,
            begin_text: optional_cell(grid, BEGIN_PUBLICATION_CELL),
            finish_text: optional_cell(grid, FINISH_PUBLICATION_CELL),
        };
        info!(
            items = inventory.item_count(),
            skipped, "Parsed warehouse inventory"
        );
        Ok(inventory)
    }

    pub fn item_count(&self) -> usize {
        self.locations
            .values()
            .map(|s| s.available.len() + s.on_the_way.len())
            .sum()
    }

    pub fn stock(&self, location: &Location) -> Option<&LocationStock> {
        self.locations.get(location.slug)
    }

    /// Text report for one city and mode, HTML formatted
    pub fn report(&self, city: &str, mode: &str) -> String {
        let Some(location) = find_location(city) else {
            return UNKNOWN_CITY.to_string();
        };
        let Some(status) = StockStatus::from_text(mode) else {
            return UNKNOWN_MODE.to_string();
        };

        let mut lines: Vec<String> = Vec::new();
        if let Some(stock) = self.stock(location) {
            for item in stock.items(status) {
                let line = item.to_html_line(status);
                if !lines.contains(&line) {
                    lines.push(line);
                }
            }
        }

        if lines.is_empty() {
            EMPTY_REPORT.to_string()
        } else {
            lines.join("\n\n")
        }
    }
}

/// Shared inventory snapshot answering report lookups
///
/// Refreshed by the re-sync task; lookups never touch the network.
#[derive(Default)]
pub struct InventoryReports {
    snapshot: RwLock<Arc<Inventory>>,
}

impl InventoryReports {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(inventory)),
        }
    }

    pub fn snapshot(&self) -> Arc<Inventory> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn replace(&self, inventory: Inventory) {
        let fresh = Arc::new(inventory);
        match self.snapshot.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => {
                warn!("Inventory lock was poisoned, replacing anyway");
                *poisoned.into_inner() = fresh;
            }
        }
    }
}

impl ReportLookup for InventoryReports {
    fn get_report(&self, city: &str, mode: &str) -> anyhow::Result<String> {
        Ok(self.snapshot().report(city, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_location() {
        assert_eq!(detect_location("Склад Казани").map(|l| l.slug), Some("kazan"));
        assert_eq!(detect_location("в Новосибирске").map(|l| l.slug), Some("novosibirsk"));
        assert_eq!(detect_location("Омск"), None);
    }

    #[test]
    fn test_find_location_by_name() {
        assert_eq!(find_location("казань").map(|l| l.slug), Some("kazan"));
        assert_eq!(
            find_location("Москва (Дзержинский)").map(|l| l.slug),
            Some("moscow_dzerzhinsky")
        );
        assert!(find_location("Париж").is_none());
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(StockStatus::from_text("В наличии"), Some(StockStatus::Available));
        assert_eq!(StockStatus::from_text("Наличии"), Some(StockStatus::Available));
        assert_eq!(StockStatus::from_text("в пути"), Some(StockStatus::OnTheWay));
        assert_eq!(StockStatus::from_text("продано"), None);
    }

    #[test]
    fn test_markdown_line_order_variants() {
        let mut item = StockItem {
            name: "R7".into(),
            price_available: "10.000".into(),
            price_order: "9.000".into(),
            link_order: "https://o".into(),
            ..Default::default()
        };
        assert_eq!(item.to_markdown_line(), r"R7 Цена 10\.000 [Под заказ 9\.000](https://o)");
        item.link_order.clear();
        assert_eq!(item.to_markdown_line(), r"R7 Цена 10\.000 Под заказ 9\.000");
    }

    #[test]
    fn test_render_markdown_sections() {
        let stock = LocationStock {
            on_the_way: vec![StockItem {
                name: "Стол".into(),
                arrival: "1.11".into(),
                ..Default::default()
            }],
            intro: "Привет".into(),
            ..Default::default()
        };
        let text = stock.render_markdown(&LOCATIONS[0]);
        assert_eq!(
            text,
            "*Отчёт по складу \\(Казань\\)\n\nПривет*\n\n*В пути:*\n\nСтол\nПрибытие 1\\.11"
        );
    }

    #[test]
    fn test_report_messages_with_photos() {
        let images: Vec<String> = (0..12).map(|i| format!("https://img/{i}")).collect();
        let line = "x".repeat(600);
        let text = format!("{line}\n{line}\n{line}");
        let messages = ReportMessages::split(&text, &images);

        assert_eq!(messages.photos.len(), ReportMessages::MAX_PHOTOS);
        assert_eq!(messages.caption.as_deref(), Some(line.as_str()));
        assert_eq!(messages.texts, vec![format!("{line}\n{line}")]);
    }

    #[test]
    fn test_report_messages_without_photos() {
        let messages = ReportMessages::split("a\nb", &[]);
        assert!(messages.photos.is_empty());
        assert!(messages.caption.is_none());
        assert_eq!(messages.texts, vec!["a\nb"]);
    }

    #[test]
    fn test_html_line() {
        let item = StockItem {
            name: "Кресло R7".into(),
            link: "https://shop/r7".into(),
            description: "4D".into(),
            reviews: "https://t.me/r".into(),
            arrival: "12.10".into(),
            ..Default::default()
        };
        assert_eq!(
            item.to_html_line(StockStatus::Available),
            "<a href='https://shop/r7'>Кресло R7</a> 4D <a href='https://t.me/r'>Отзывы</a>"
        );
        assert!(item
            .to_html_line(StockStatus::OnTheWay)
            .ends_with("\nПрибытие 12.10"));
    }
}
