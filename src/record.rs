//! Typed records and name-based field access.

use crate::amount::Amount;
use crate::error::{FixedWidthError, Result};
use crate::layout::{Currency, FieldSpec, RecordKind};
use serde::Serialize;
use std::fmt;

/// Personal details carried by the HEADER record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub name: String,
    pub surname: String,
    pub patronymic: String,
    pub address: String,
}

/// A single TRANSACTION record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// 1-based sequence number, unique within a file.
    pub counter: u32,

    /// Amount in minor units.
    pub amount: Amount,

    pub currency: Currency,

    /// Opaque padding, kept exactly as read.
    #[serde(skip)]
    pub reserved: String,
}

impl Transaction {
    /// Creates a transaction with blank reserved padding.
    pub fn new(counter: u32, amount: Amount, currency: Currency) -> Self {
        Transaction {
            counter,
            amount,
            currency,
            reserved: blank(RecordKind::Transaction, "reserved"),
        }
    }
}

/// The FOOTER record holding the file's aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    /// Number of TRANSACTION records in the file.
    pub total_count: u32,

    /// Sum of all transaction amounts.
    pub control_sum: Amount,

    /// Opaque padding, kept exactly as read.
    pub reserved: String,
}

impl Footer {
    pub fn new(total_count: u32, control_sum: Amount) -> Self {
        Footer {
            total_count,
            control_sum,
            reserved: blank(RecordKind::Footer, "reserved"),
        }
    }
}

fn blank(kind: RecordKind, field: &str) -> String {
    let width = kind.field(field).map(FieldSpec::width).unwrap_or(0);
    " ".repeat(width)
}

/// A decoded record of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Header(Header),
    Transaction(Transaction),
    Footer(Footer),
}

/// The decoded value of a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(u64),
    Amount(Amount),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(number) => write!(f, "{}", number),
            FieldValue::Amount(amount) => write!(f, "{}", amount),
        }
    }
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Header(_) => RecordKind::Header,
            Record::Transaction(_) => RecordKind::Transaction,
            Record::Footer(_) => RecordKind::Footer,
        }
    }

    pub fn as_transaction(&self) -> Option<&Transaction> {
        match self {
            Record::Transaction(tx) => Some(tx),
            _ => None,
        }
    }

    pub fn as_footer(&self) -> Option<&Footer> {
        match self {
            Record::Footer(footer) => Some(footer),
            _ => None,
        }
    }

    /// Returns the value of the named field, or `None` if the field is not
    /// part of this record's layout.
    pub fn get(&self, field: &str) -> Option<FieldValue> {
        if field == "field_id" {
            return Some(FieldValue::Text(self.kind().discriminator().to_string()));
        }

        let value = match self {
            Record::Header(header) => match field {
                "name" => FieldValue::Text(header.name.clone()),
                "surname" => FieldValue::Text(header.surname.clone()),
                "patronymic" => FieldValue::Text(header.patronymic.clone()),
                "address" => FieldValue::Text(header.address.clone()),
                _ => return None,
            },
            Record::Transaction(tx) => match field {
                "counter" => FieldValue::Number(tx.counter.into()),
                "amount" => FieldValue::Amount(tx.amount),
                "currency" => FieldValue::Text(tx.currency.code().to_string()),
                "reserved" => FieldValue::Text(tx.reserved.clone()),
                _ => return None,
            },
            Record::Footer(footer) => match field {
                "total_count" => FieldValue::Number(footer.total_count.into()),
                "control_sum" => FieldValue::Amount(footer.control_sum),
                "reserved" => FieldValue::Text(footer.reserved.clone()),
                _ => return None,
            },
        };
        Some(value)
    }

    /// Assigns a user-supplied value to the named field.
    ///
    /// Money fields take a major-unit decimal (`50.00`), counts take plain
    /// digits, text is trimmed and cut to the field width, and `reserved`
    /// is stored as given, padded or cut to the field width. The record is
    /// left untouched when an error is returned.
    pub fn assign(&mut self, field: &str, value: &str) -> Result<()> {
        let kind = self.kind();
        let spec = kind.field(field).ok_or_else(|| FixedWidthError::FieldNotFound {
            kind,
            field: field.to_string(),
        })?;

        if spec.name == "field_id" {
            if value.trim() != kind.discriminator() {
                return Err(FixedWidthError::invalid_value(
                    spec.name,
                    value,
                    "the record kind cannot be changed",
                ));
            }
            return Ok(());
        }

        match self {
            Record::Header(header) => {
                let slot = match spec.name {
                    "name" => &mut header.name,
                    "surname" => &mut header.surname,
                    "patronymic" => &mut header.patronymic,
                    _ => &mut header.address,
                };
                *slot = fit_text(spec, value);
            }
            Record::Transaction(tx) => match spec.name {
                "counter" => tx.counter = parse_counter(spec, value)?,
                "amount" => tx.amount = parse_money(spec, value)?,
                "currency" => tx.currency = value.trim().parse()?,
                _ => tx.reserved = fit_verbatim(spec, value),
            },
            Record::Footer(footer) => match spec.name {
                "total_count" => footer.total_count = parse_count(spec, value)?,
                "control_sum" => footer.control_sum = parse_money(spec, value)?,
                _ => footer.reserved = fit_verbatim(spec, value),
            },
        }
        Ok(())
    }
}

/// Trims and cuts text to the field width.
fn fit_text(spec: &FieldSpec, value: &str) -> String {
    value.trim().chars().take(spec.width()).collect()
}

/// Pads or cuts a value to exactly the field width.
fn fit_verbatim(spec: &FieldSpec, value: &str) -> String {
    format!("{:<width$}", value, width = spec.width())
        .chars()
        .take(spec.width())
        .collect()
}

fn parse_count(spec: &FieldSpec, value: &str) -> Result<u32> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FixedWidthError::invalid_value(
            spec.name,
            value,
            "expected digits only",
        ));
    }
    trimmed
        .parse::<u64>()
        .ok()
        .filter(|number| *number <= spec.max_value())
        .and_then(|number| u32::try_from(number).ok())
        .ok_or_else(|| {
            FixedWidthError::invalid_value(
                spec.name,
                value,
                format!("does not fit in {} digits", spec.width()),
            )
        })
}

fn parse_counter(spec: &FieldSpec, value: &str) -> Result<u32> {
    match parse_count(spec, value)? {
        0 => Err(FixedWidthError::invalid_value(
            spec.name,
            value,
            "counters start at 1",
        )),
        counter => Ok(counter),
    }
}

fn parse_money(spec: &FieldSpec, value: &str) -> Result<Amount> {
    let amount: Amount = value.parse().map_err(|_| {
        FixedWidthError::invalid_value(spec.name, value, "expected a non-negative decimal amount")
    })?;
    if amount.minor_units() > spec.max_value() {
        return Err(FixedWidthError::invalid_value(
            spec.name,
            value,
            format!("does not fit in {} digits", spec.width()),
        ));
    }
    Ok(amount)
}
