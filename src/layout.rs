//! Static record layouts.
//!
//! Every line of a file is [`RECORD_WIDTH`] characters wide and starts with a
//! two-digit `field_id` that names its [`RecordKind`]. The remaining columns are
//! split into fields by the per-kind tables below. Offsets are half-open
//! `[start, end)` character ranges.

use crate::error::{FixedWidthError, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Width of every record, in characters, excluding the line terminator.
pub const RECORD_WIDTH: usize = 120;

/// Currencies a TRANSACTION record may carry.
pub const ALLOWED_CURRENCIES: &[Currency] = &[Currency::Usd, Currency::Eur, Currency::Gbp];

/// How a field's value is stored inside its column range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEncoding {
    /// Free text: trimmed on read, space-padded on the right on write.
    Text,

    /// Unsigned integer: zero-padded on the left.
    Numeric,

    /// Opaque padding kept exactly as read.
    Verbatim,
}

/// A named column range within a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub start: usize,
    pub end: usize,
    pub encoding: FieldEncoding,
}

impl FieldSpec {
    const fn new(name: &'static str, start: usize, end: usize, encoding: FieldEncoding) -> Self {
        FieldSpec {
            name,
            start,
            end,
            encoding,
        }
    }

    /// Number of characters the field occupies.
    pub const fn width(&self) -> usize {
        self.end - self.start
    }

    /// Largest integer a numeric field of this width can hold.
    pub fn max_value(&self) -> u64 {
        10u64.saturating_pow(self.width() as u32).saturating_sub(1)
    }
}

use FieldEncoding::{Numeric, Text, Verbatim};

const HEADER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("field_id", 0, 2, Numeric),
    FieldSpec::new("name", 2, 30, Text),
    FieldSpec::new("surname", 30, 60, Text),
    FieldSpec::new("patronymic", 60, 90, Text),
    FieldSpec::new("address", 90, 118, Text),
];

const TRANSACTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("field_id", 0, 2, Numeric),
    FieldSpec::new("counter", 2, 8, Numeric),
    FieldSpec::new("amount", 8, 20, Numeric),
    FieldSpec::new("currency", 20, 23, Text),
    FieldSpec::new("reserved", 23, 118, Verbatim),
];

const FOOTER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("field_id", 0, 2, Numeric),
    FieldSpec::new("total_count", 2, 8, Numeric),
    FieldSpec::new("control_sum", 8, 20, Numeric),
    FieldSpec::new("reserved", 20, 118, Verbatim),
];

/// The three kinds of record a file may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Header,
    Transaction,
    Footer,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [RecordKind::Header, RecordKind::Transaction, RecordKind::Footer];

    /// The `field_id` value identifying this kind.
    pub fn discriminator(self) -> &'static str {
        match self {
            RecordKind::Header => "01",
            RecordKind::Transaction => "02",
            RecordKind::Footer => "03",
        }
    }

    /// Resolves a `field_id` value to its kind.
    pub fn from_discriminator(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.discriminator() == code)
    }

    /// Field layout for this kind, in column order.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            RecordKind::Header => HEADER_FIELDS,
            RecordKind::Transaction => TRANSACTION_FIELDS,
            RecordKind::Footer => FOOTER_FIELDS,
        }
    }

    /// Looks up a field by name.
    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|spec| spec.name == name)
    }

    /// Upper-case name used in messages and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Header => "HEADER",
            RecordKind::Transaction => "TRANSACTION",
            RecordKind::Footer => "FOOTER",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RecordKind {
    type Err = FixedWidthError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FixedWidthError::UnknownRecordKind(wanted.to_string()))
    }
}

/// ISO 4217 currency codes accepted in TRANSACTION records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    /// Three-letter code as written in the file.
    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = FixedWidthError;

    /// Codes are matched exactly; `usd` is not `USD`.
    fn from_str(s: &str) -> Result<Self> {
        ALLOWED_CURRENCIES
            .iter()
            .copied()
            .find(|currency| currency.code() == s)
            .ok_or_else(|| FixedWidthError::InvalidCurrencyCode(s.to_string()))
    }
}
