// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading the travel-date literal.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("travel dates are not a valid literal: {0}")]
    Literal(String),
    #[error("invalid date {value:?}")]
    Date {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("date field must be text, found {0}")]
    DateType(String),
    #[error("no dated entries found")]
    NoDatedEntries,
}

/// Failures turning one spreadsheet row into a payment record.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("malformed row: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Dates(#[from] ParseError),
}

/// Rejections from the downstream work queue.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue `{queue}` rejected reference {reference:?}: already exists")]
    Integrity { queue: String, reference: String },
    #[error("invalid queue payload: {0}")]
    InvalidPayload(String),
    #[error("queue backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no spreadsheet matching `{pattern}` found in {}", dir.display())]
    MissingFile { pattern: String, dir: PathBuf },
    #[error("row {index}: {source}")]
    Row {
        index: usize,
        #[source]
        source: RowError,
    },
    #[error(transparent)]
    Queue(#[from] QueueError),
}
