//! Error types for fixed-width file handling.

use crate::layout::RecordKind;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fixed-width file operations
pub type Result<T> = std::result::Result<T, FixedWidthError>;

/// Errors that can occur while reading, validating or editing a file.
#[derive(Error, Debug)]
pub enum FixedWidthError {
    /// Failed to read or write the underlying file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The input file does not exist
    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// The two-character discriminator is not `01`, `02` or `03`
    #[error("Unknown record kind '{0}'")]
    UnknownRecordKind(String),

    /// A line was parsed as one kind but carries another kind's discriminator
    #[error("Expected a {expected} record, found a {found} record")]
    KindMismatch {
        expected: RecordKind,
        found: RecordKind,
    },

    /// A line is not exactly one record wide
    #[error("Invalid record length {actual}, expected {expected}")]
    InvalidRecordLength { actual: usize, expected: usize },

    /// The stored amount is not a non-negative integer of minor units
    #[error("Invalid amount format '{0}'")]
    InvalidAmountFormat(String),

    /// A caller-supplied amount is negative, too precise or too large
    #[error("Invalid amount {0}")]
    InvalidAmount(String),

    /// Currency is not in the allowed set
    #[error("Invalid currency code '{0}'")]
    InvalidCurrencyCode(String),

    /// A value cannot be encoded into its field
    #[error("Invalid value '{value}' for field '{field}': {reason}")]
    InvalidValueFormat {
        field: String,
        value: String,
        reason: String,
    },

    /// The file has no FOOTER record
    #[error("Footer not found")]
    FooterNotFound,

    /// Footer aggregates disagree with the transactions in the file
    #[error("Footer {field} is {stored}, transactions give {computed}")]
    FooterMismatch {
        field: &'static str,
        stored: String,
        computed: String,
    },

    /// Field name is not part of the record kind's layout
    #[error("Field '{field}' does not exist in {kind} records")]
    FieldNotFound { kind: RecordKind, field: String },

    /// No record matched the lookup
    #[error("{}", record_not_found(.kind, .counter))]
    RecordNotFound {
        kind: RecordKind,
        counter: Option<u32>,
    },

    /// Two transactions share the same counter
    #[error("Duplicate transaction counter {0:06}")]
    DuplicateCounter(u32),
}

fn record_not_found(kind: &RecordKind, counter: &Option<u32>) -> String {
    match counter {
        Some(counter) => format!("No {} record with counter {:06}", kind, counter),
        None => format!("No {} record", kind),
    }
}

impl FixedWidthError {
    /// Builds an [`FixedWidthError::InvalidValueFormat`] for `field`.
    pub(crate) fn invalid_value(
        field: &str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        FixedWidthError::InvalidValueFormat {
            field: field.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
