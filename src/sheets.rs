//! Spreadsheet CSV exports: fetching, header lookup and `A1`-style cell access

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::errors::SheetError;

lazy_static! {
    static ref CELL_ADDRESS: Regex =
        Regex::new(r"^([A-Za-z]+)(\d+)$").expect("Cell address pattern should be valid");
}

/// CSV export URL of one sheet tab
pub fn export_url(sheet_id: &str, gid: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{sheet_id}/export?format=csv&gid={gid}")
}

/// Download a CSV export as text
pub async fn fetch_csv(client: &reqwest::Client, url: &str) -> Result<String, SheetError> {
    debug!(url = %url, "Fetching spreadsheet export");
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SheetError::Fetch(format!("HTTP {status} for {url}")));
    }
    let body = response.text().await?;
    info!(bytes = body.len(), "Spreadsheet export downloaded");
    Ok(body)
}

pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Position of a header, compared after trimming
pub fn header_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| strip_bom(h).trim() == name)
}

/// Zero-based column index for spreadsheet column letters
pub fn column_index(name: &str) -> Option<usize> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut index = 0usize;
    for c in name.to_ascii_uppercase().bytes() {
        index = index * 26 + (c - b'A' + 1) as usize;
    }
    Some(index - 1)
}

/// Split `N18` into zero-based `(column, row)`
pub fn parse_cell_address(address: &str) -> Result<(usize, usize), SheetError> {
    let caps = CELL_ADDRESS
        .captures(address.trim())
        .ok_or_else(|| SheetError::CellAddress(address.to_string()))?;
    let column = column_index(&caps[1]).ok_or_else(|| SheetError::CellAddress(address.to_string()))?;
    let row: usize = caps[2]
        .parse()
        .map_err(|_| SheetError::CellAddress(address.to_string()))?;
    if row == 0 {
        return Err(SheetError::CellAddress(address.to_string()));
    }
    Ok((column, row - 1))
}

/// Header-less sheet: every row as read, cells trimmed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    rows: Vec<Vec<String>>,
}

impl SheetGrid {
    pub fn parse(csv_text: &str) -> Result<Self, SheetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(strip_bom(csv_text).as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|cell| cell.trim().to_string()).collect());
        }
        Ok(Self { rows })
    }

    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// Value of a cell such as `N18`; cells past a short row read as empty
    pub fn cell(&self, address: &str) -> Result<&str, SheetError> {
        let (column, row) = parse_cell_address(address)?;
        if column >= self.width() || row >= self.rows.len() {
            return Err(SheetError::OutOfRange(address.to_string()));
        }
        Ok(self.rows[row].get(column).map(String::as_str).unwrap_or(""))
    }
}
