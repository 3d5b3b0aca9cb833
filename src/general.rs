//! General catalogue publication built from the headed general sheet.

use tracing::{debug, info};

use crate::errors::SheetError;
use crate::markup::{escape_html, escape_html_attr};
use crate::sheets::{header_index, strip_bom};

/// One post of the general catalogue
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralPost {
    /// HTML caption
    pub caption: String,
    /// Photo URL; the post is plain text without it
    pub photo: Option<String>,
}

/// Everything sent by one general publication, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralPublication {
    /// Bold opening message
    pub opening: Option<String>,
    pub posts: Vec<GeneralPost>,
    /// Bold closing message
    pub closing: Option<String>,
}

impl GeneralPublication {
    /// Number of messages the publication sends
    pub fn message_count(&self) -> usize {
        self.posts.len() + usize::from(self.opening.is_some()) + usize::from(self.closing.is_some())
    }
}

/// Fields of a general sheet row used for captions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralRow {
    pub name: String,
    pub link: String,
    pub description: String,
    pub reviews: String,
    pub price_order: String,
    pub link_order: String,
    pub count: i64,
    pub photo: String,
}

/// HTML caption for a row with stock, `None` when the count is below one
pub fn build_item_caption(row: &GeneralRow) -> Option<String> {
    if row.count < 1 {
        return None;
    }

    let name = escape_html(&row.name);
    let desc = escape_html(&row.description);
    let mut text = if row.link.is_empty() {
        format!("{name} {desc}")
    } else {
        format!("<a href='{}'>{name}</a> {desc}", escape_html_attr(&row.link))
    };

    if !row.reviews.is_empty() {
        text.push_str(&format!(" <a href='{}'>Отзывы</a>", escape_html_attr(&row.reviews)));
    }

    let price = escape_html(&row.price_order);
    let link = escape_html_attr(&row.link_order);
    match (row.price_order.is_empty(), row.link_order.is_empty()) {
        (false, false) => text.push_str(&format!(" <a href='{link}'>Под заказ {price}</a>")),
        (false, true) => text.push_str(&format!(" Под заказ {price}")),
        (true, false) => text.push_str(&format!(" <a href='{link}'>Под заказ</a>")),
        (true, true) => {}
    }

    Some(text.trim_end().to_string())
}

/// Parse the general sheet export into a publication plan
pub fn parse_general(csv_text: &str) -> Result<GeneralPublication, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(strip_bom(csv_text).as_bytes());
    let headers = reader.headers()?.clone();

    let get = |record: &csv::StringRecord, name: &str| -> String {
        header_index(&headers, name)
            .and_then(|idx| record.get(idx))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };
    let bold = |text: String| (!text.is_empty()).then(|| format!("<b>{}</b>", escape_html(&text)));

    let mut publication = GeneralPublication::default();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        if row_idx == 0 {
            publication.opening = bold(get(&record, "В начале"));
            publication.closing = bold(get(&record, "В конце"));
        }

        let count_text = get(&record, "Кол");
        let row = GeneralRow {
            name: get(&record, "Название"),
            link: get(&record, "Ссылка"),
            description: get(&record, "Описание"),
            reviews: get(&record, "Отзывы по модели"),
            price_order: get(&record, "Под заказ"),
            link_order: get(&record, "Под заказ ссылка"),
            count: count_text.parse().unwrap_or(0),
            photo: get(&record, "Фото"),
        };

        match build_item_caption(&row) {
            Some(caption) => publication.posts.push(GeneralPost {
                caption,
                photo: (!row.photo.is_empty()).then(|| row.photo.clone()),
            }),
            None => debug!(row = row_idx + 2, count = %count_text, "General row skipped"),
        }
    }

    info!(posts = publication.posts.len(), "Parsed general catalogue");
    Ok(publication)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_variants() {
        let mut row = GeneralRow {
            name: "Кресло".into(),
            description: "мягкое".into(),
            count: 2,
            ..Default::default()
        };
        assert_eq!(build_item_caption(&row).unwrap(), "Кресло мягкое");

        row.link = "https://s/1".into();
        row.reviews = "https://r".into();
        row.price_order = "5 000".into();
        assert_eq!(
            build_item_caption(&row).unwrap(),
            "<a href='https://s/1'>Кресло</a> мягкое <a href='https://r'>Отзывы</a> Под заказ 5 000"
        );

        row.link_order = "https://o".into();
        assert!(build_item_caption(&row)
            .unwrap()
            .ends_with("<a href='https://o'>Под заказ 5 000</a>"));

        row.count = 0;
        assert!(build_item_caption(&row).is_none());
    }

    #[test]
    fn test_parse_general() {
        let csv = "В начале,В конце,Название,Описание,Кол,Фото\n\
                   Новинки,Пишите нам,Стол,дуб,1,https://img/1\n\
                   ,,Стул,,0,\n\
                   ,,Полка,,3,\n";
        let publication = parse_general(csv).unwrap();

        assert_eq!(publication.opening.as_deref(), Some("<b>Новинки</b>"));
        assert_eq!(publication.closing.as_deref(), Some("<b>Пишите нам</b>"));
        assert_eq!(publication.posts.len(), 2);
        assert_eq!(publication.posts[0].photo.as_deref(), Some("https://img/1"));
        assert_eq!(publication.posts[1].caption, "Полка");
        assert_eq!(publication.message_count(), 4);
    }
}
