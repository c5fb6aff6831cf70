//! Conversion between fixed-width lines and [`Record`]s.
//!
//! Offsets come from [`RecordKind::fields`]; nothing here hard-codes a column.
//! Lines are handled as characters so a multi-byte character still occupies
//! one column.

use crate::amount::Amount;
use crate::error::{FixedWidthError, Result};
use crate::layout::{Currency, FieldEncoding, FieldSpec, RecordKind, RECORD_WIDTH};
use crate::record::{FieldValue, Footer, Header, Record, Transaction};
use log::debug;

/// Determines a line's record kind from its `field_id` prefix.
pub fn classify(line: &str) -> Result<RecordKind> {
    let code: String = line.chars().take(2).collect();
    RecordKind::from_discriminator(&code).ok_or(FixedWidthError::UnknownRecordKind(code))
}

/// Decodes a line as a record of `kind`.
///
/// The line must be exactly [`RECORD_WIDTH`] characters, without its
/// terminator.
pub fn parse(line: &str, kind: RecordKind) -> Result<Record> {
    let columns: Vec<char> = line.chars().collect();
    if columns.len() != RECORD_WIDTH {
        return Err(FixedWidthError::InvalidRecordLength {
            actual: columns.len(),
            expected: RECORD_WIDTH,
        });
    }

    let found = classify(line)?;
    if found != kind {
        return Err(FixedWidthError::KindMismatch {
            expected: kind,
            found,
        });
    }

    let mut record = match kind {
        RecordKind::Header => Record::Header(Header::default()),
        RecordKind::Transaction => {
            Record::Transaction(Transaction::new(0, Amount::ZERO, Currency::Usd))
        }
        RecordKind::Footer => Record::Footer(Footer::new(0, Amount::ZERO)),
    };

    for spec in kind.fields() {
        let raw: String = columns[spec.start..spec.end].iter().collect();
        decode_field(&mut record, spec, &raw)?;
    }

    debug!("Parsed {} record: {:?}", kind, record);
    Ok(record)
}

fn decode_field(record: &mut Record, spec: &FieldSpec, raw: &str) -> Result<()> {
    let text = raw.trim();
    match record {
        Record::Header(header) => match spec.name {
            "name" => header.name = text.to_string(),
            "surname" => header.surname = text.to_string(),
            "patronymic" => header.patronymic = text.to_string(),
            "address" => header.address = text.to_string(),
            _ => {}
        },
        Record::Transaction(tx) => match spec.name {
            "counter" => tx.counter = decode_count(spec, raw)?,
            "amount" => {
                if !is_digits(text) {
                    return Err(FixedWidthError::InvalidAmountFormat(text.to_string()));
                }
                let units = text
                    .parse::<u64>()
                    .map_err(|_| FixedWidthError::InvalidAmountFormat(text.to_string()))?;
                tx.amount = Amount::from_minor_units(units);
            }
            "currency" => tx.currency = text.parse()?,
            "reserved" => tx.reserved = raw.to_string(),
            _ => {}
        },
        Record::Footer(footer) => match spec.name {
            "total_count" => footer.total_count = decode_count(spec, raw)?,
            "control_sum" => {
                footer.control_sum = Amount::from_minor_units(decode_number(spec, raw)?)
            }
            "reserved" => footer.reserved = raw.to_string(),
            _ => {}
        },
    }
    Ok(())
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

fn decode_number(spec: &FieldSpec, raw: &str) -> Result<u64> {
    let text = raw.trim();
    if !is_digits(text) {
        return Err(FixedWidthError::invalid_value(
            spec.name,
            text,
            "expected zero-padded digits",
        ));
    }
    text.parse::<u64>()
        .map_err(|_| FixedWidthError::invalid_value(spec.name, text, "not a number"))
}

fn decode_count(spec: &FieldSpec, raw: &str) -> Result<u32> {
    let number = decode_number(spec, raw)?;
    u32::try_from(number)
        .map_err(|_| FixedWidthError::invalid_value(spec.name, raw.trim(), "out of range"))
}

/// Encodes a record as a line of exactly [`RECORD_WIDTH`] characters.
///
/// Numeric fields are zero-padded on the left. Text is space-padded on the
/// right and silently cut at the field width. Columns not covered by any
/// field are blank. A numeric value wider than its field is an error.
pub fn format(record: &Record) -> Result<String> {
    let mut columns = vec![' '; RECORD_WIDTH];
    for spec in record.kind().fields() {
        write_field(&mut columns, spec, record)?;
    }
    Ok(columns.into_iter().collect())
}

/// Re-encodes the named fields of `record` into an existing `line`.
///
/// Every other column of the line, including unmapped ones, is kept as is.
pub fn splice(line: &str, record: &Record, fields: &[&str]) -> Result<String> {
    let mut columns: Vec<char> = line.chars().collect();
    if columns.len() != RECORD_WIDTH {
        return Err(FixedWidthError::InvalidRecordLength {
            actual: columns.len(),
            expected: RECORD_WIDTH,
        });
    }

    let kind = record.kind();
    for name in fields {
        let spec = kind.field(name).ok_or_else(|| FixedWidthError::FieldNotFound {
            kind,
            field: name.to_string(),
        })?;
        write_field(&mut columns, spec, record)?;
    }
    Ok(columns.into_iter().collect())
}

fn write_field(columns: &mut [char], spec: &FieldSpec, record: &Record) -> Result<()> {
    let encoded = encode_field(spec, record.get(spec.name))?;
    for (column, ch) in columns[spec.start..spec.end].iter_mut().zip(encoded.chars()) {
        *column = ch;
    }
    Ok(())
}

fn encode_field(spec: &FieldSpec, value: Option<FieldValue>) -> Result<String> {
    let width = spec.width();
    let text = match value {
        Some(FieldValue::Amount(amount)) => amount.minor_units().to_string(),
        Some(value) => value.to_string(),
        None => String::new(),
    };

    match spec.encoding {
        FieldEncoding::Numeric => {
            if text.chars().count() > width {
                return Err(FixedWidthError::invalid_value(
                    spec.name,
                    text,
                    format!("does not fit in {} digits", width),
                ));
            }
            Ok(format!("{:0>width$}", text, width = width))
        }
        FieldEncoding::Text | FieldEncoding::Verbatim => {
            let padded = format!("{:<width$}", text, width = width);
            Ok(padded.chars().take(width).collect())
        }
    }
}
