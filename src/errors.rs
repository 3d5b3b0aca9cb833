//! # Error Types Module
//!
//! This module defines the error types used across the answer engine, the
//! spreadsheet pipeline and the persisted bot state. Application glue code
//! wraps these in `anyhow::Error`; library code returns them directly.

use thiserror::Error;

/// Errors raised while loading or applying lexical resources
#[derive(Debug, Error)]
pub enum NormalizerError {
    /// A morphology or synonym resource could not be read
    #[error("Lexical resource unavailable ({path}): {reason}")]
    ResourceUnavailable { path: String, reason: String },
    /// A resource was read but its content is not usable
    #[error("Malformed lexical resource ({path}): {reason}")]
    MalformedResource { path: String, reason: String },
}

/// Errors raised while building the question corpus
#[derive(Debug, Error)]
pub enum CorpusError {
    /// No usable record could be produced from the catalog
    #[error("Question corpus is empty")]
    Empty,
}

/// Errors raised while producing an answer
#[derive(Debug, Error)]
pub enum MatchError {
    /// A generated-report answer does not carry a usable mode and city
    #[error("Malformed report trigger: '{0}'")]
    MalformedReportTrigger(String),
    /// The report lookup collaborator failed
    #[error("Report lookup failed: {0}")]
    ReportLookup(#[source] anyhow::Error),
}

/// Errors raised while fetching or reading spreadsheet exports
#[derive(Debug, Error)]
pub enum SheetError {
    /// HTTP request failed or returned a non-success status
    #[error("Spreadsheet fetch failed: {0}")]
    Fetch(String),
    /// CSV payload could not be parsed
    #[error("Spreadsheet parse failed: {0}")]
    Parse(String),
    /// Cell address is not of the `A1` form
    #[error("Invalid cell address: {0}")]
    CellAddress(String),
    /// Cell address points outside the grid
    #[error("Cell {0} is out of range")]
    OutOfRange(String),
    /// Required header row was not found
    #[error("Header row not found: {0}")]
    MissingHeader(String),
}

/// Errors raised while validating admin input for a promotion
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromoError {
    /// Template must contain exactly one time placeholder
    #[error("Template must contain exactly one {{{{time}}}} placeholder, found {0}")]
    Placeholder(usize),
    /// Duration text is not `H:MM[:SS]`
    #[error("Invalid duration format: '{0}'")]
    DurationFormat(String),
    /// Duration fields or total are out of bounds
    #[error("Duration out of range: '{0}'")]
    DurationRange(String),
}

/// Errors raised while persisting bot state
#[derive(Debug, Error)]
pub enum StateError {
    /// File could not be read or written
    #[error("State file error ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// File content could not be (de)serialized
    #[error("State serialization error ({path}): {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<csv::Error> for SheetError {
    fn from(err: csv::Error) -> Self {
        SheetError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for SheetError {
    fn from(err: reqwest::Error) -> Self {
        SheetError::Fetch(err.to_string())
    }
}
