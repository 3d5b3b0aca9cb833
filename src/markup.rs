//! Telegram markup helpers: MarkdownV2 and HTML escaping, message splitting

use lazy_static::lazy_static;
use regex::Regex;

/// Maximum length of a photo caption
pub const CAPTION_LIMIT: usize = 1024;
/// Maximum length of a text message
pub const MESSAGE_LIMIT: usize = 4096;

lazy_static! {
    static ref MARKDOWN_V2_SPECIAL: Regex =
        Regex::new(r"([_*\[\]()~`>#+=|{}.!\\-])").expect("MarkdownV2 pattern should be valid");
}

/// MarkdownV2 building blocks
pub struct MarkdownV2;

impl MarkdownV2 {
    pub fn escape(text: &str) -> String {
        MARKDOWN_V2_SPECIAL.replace_all(text, r"\$1").into_owned()
    }

    pub fn bold(text: &str) -> String {
        format!("*{}*", Self::escape(text))
    }

    /// Inline link; inside the URL only `)` and `\` need escaping
    pub fn link(text: &str, url: &str) -> String {
        let url = url.replace('\\', r"\\").replace(')', r"\)");
        format!("[{}]({})", Self::escape(text), url)
    }
}

/// Escape text for Telegram HTML parse mode
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape a value placed inside a single-quoted HTML attribute
pub fn escape_html_attr(text: &str) -> String {
    escape_html(text).replace('\'', "&#39;")
}

/// Split text into chunks of at most `limit` characters without breaking lines
///
/// A single line longer than the limit is cut at character boundaries.
pub fn split_text_safe(text: &str, limit: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit && !current.is_empty() {
            parts.push(current.trim_end().to_string());
            current.clear();
            current_len = 0;
        }
        if line_len > limit {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                let piece: String = piece.iter().collect();
                if !piece.trim().is_empty() {
                    parts.push(piece.trim_end().to_string());
                }
            }
            continue;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.trim().is_empty() {
        parts.push(current.trim_end().to_string());
    }
    parts.retain(|p| !p.is_empty());
    parts
}
