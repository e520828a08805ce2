//! Bulk guest import from an uploaded CSV file.
//!
//! Each data row is normalized and upserted on `(event, name)` on its own; a bad
//! row is recorded in the [`ImportOutcome`] and the run moves on. Only an upload
//! that cannot be decoded or tokenized at all fails as a whole.

pub mod columns;
pub mod outcome;

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use uuid::Uuid;

use crate::models::guest::GuestFields;
use crate::store::Store;

pub use columns::{Column, ColumnMap};
pub use outcome::{FlashMessage, ImportOutcome, ImportResponse, MessageLevel, RowOutcome};

/// Row number of the first data row; the header is row 1.
const FIRST_DATA_ROW: usize = 2;

#[derive(Debug, Error)]
pub enum RowError {
    #[error("{0} is required")]
    MissingRequiredField(&'static str),
    #[error("{0}")]
    Processing(String),
}

#[derive(Debug, Error)]
pub enum FileDecodeError {
    #[error("file is not valid UTF-8 text ({0})")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("file is not valid CSV ({0})")]
    Malformed(#[from] csv::Error),
}

#[derive(Debug)]
pub struct ParsedRow {
    pub number: usize,
    pub fields: Result<GuestFields, RowError>,
}

/// Decodes and tokenizes the whole upload before anything is written.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<ParsedRow>, FileDecodeError> {
    let text = std::str::from_utf8(bytes)?;

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = ColumnMap::from_headers(&headers);

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    let mut number = FIRST_DATA_ROW;
    while reader.read_record(&mut record)? {
        rows.push(ParsedRow {
            number,
            fields: columns.read_row(&record),
        });
        number += 1;
    }
    Ok(rows)
}

/// Upserts every row of `bytes` into the roster of `event_id`.
pub async fn import_guests(
    store: &Store,
    event_id: Uuid,
    bytes: &[u8],
) -> Result<ImportOutcome, FileDecodeError> {
    let rows = parse_csv(bytes)?;
    let mut outcome = ImportOutcome::default();

    for row in rows {
        let result = match row.fields {
            Ok(fields) => upsert_row(store, event_id, &fields).await,
            Err(e) => Err(e),
        };
        outcome.record(row.number, result);
    }

    tracing::info!(
        %event_id,
        created = outcome.created,
        updated = outcome.updated,
        errors = outcome.error_count(),
        "guest import finished"
    );
    Ok(outcome)
}

async fn upsert_row(
    store: &Store,
    event_id: Uuid,
    fields: &GuestFields,
) -> Result<RowOutcome, RowError> {
    let upserted = store
        .upsert_guest(event_id, fields)
        .await
        .map_err(|e| RowError::Processing(e.to_string()))?;

    Ok(if upserted.created {
        RowOutcome::Created
    } else {
        RowOutcome::Updated
    })
}
