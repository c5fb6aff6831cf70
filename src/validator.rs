//! Business rules applied to decoded records.
//!
//! The codec only guarantees that a value fits its column. Rules about what
//! a value may mean live here, so new per-kind checks can be added without
//! touching the layout or codec.

use crate::error::{FixedWidthError, Result};
use crate::layout::ALLOWED_CURRENCIES;
use crate::record::{Record, Transaction};

/// Checks a record against the rules for its kind.
pub fn validate(record: &Record) -> Result<()> {
    match record {
        Record::Transaction(tx) => validate_transaction(tx),
        Record::Header(_) | Record::Footer(_) => Ok(()),
    }
}

fn validate_transaction(tx: &Transaction) -> Result<()> {
    if !ALLOWED_CURRENCIES.contains(&tx.currency) {
        return Err(FixedWidthError::InvalidCurrencyCode(
            tx.currency.code().to_string(),
        ));
    }

    if tx.counter == 0 {
        return Err(FixedWidthError::invalid_value(
            "counter",
            format!("{:06}", tx.counter),
            "counters start at 1",
        ));
    }

    Ok(())
}
