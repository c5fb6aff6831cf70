//! Aggregate-consistent edits.
//!
//! Every edit is staged on a copy of the [`Document`]. The copy's lines are
//! written to the sink, and only after the write succeeds does the copy
//! become the current document. A rejected edit changes neither the file
//! nor the in-memory state.

use crate::amount::Amount;
use crate::document::Document;
use crate::error::{FixedWidthError, Result};
use crate::layout::{Currency, FieldSpec, RecordKind};
use crate::record::{Footer, Record, Transaction};
use crate::store::{LineSink, LineSource};
use crate::validator;
use log::{debug, info};
use rust_decimal::Decimal;

/// Edits a file held by a line store.
pub struct Editor<S> {
    store: S,
    document: Document,
}

impl<S: LineSource + LineSink> Editor<S> {
    /// Loads the store's lines into a document.
    pub fn open(store: S) -> Result<Self> {
        let document = Document::load(&store)?;
        Ok(Editor { store, document })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Appends a transaction just before the footer and updates the footer's
    /// count and control sum.
    ///
    /// Returns the new transaction's counter.
    pub fn add_transaction(&mut self, amount: Decimal, currency: &str) -> Result<u32> {
        let currency: Currency = currency.trim().parse()?;
        let amount = Amount::from_decimal(amount)?;
        check_fits(&Self::spec(RecordKind::Transaction, "amount")?, amount.minor_units())
            .map_err(|_| FixedWidthError::InvalidAmount(format!("{}: too large", amount)))?;

        let counter = self.document.next_counter();
        check_fits(&Self::spec(RecordKind::Transaction, "counter")?, counter.into())?;

        let footer_index = self.document.footer_index()?;
        let footer = self
            .document
            .record(footer_index)
            .as_footer()
            .cloned()
            .ok_or(FixedWidthError::FooterNotFound)?;

        let tx = Transaction::new(counter, amount, currency);
        let record = Record::Transaction(tx);
        validator::validate(&record)?;

        let mut staged = self.document.clone();
        staged.insert(footer_index, record)?;

        let total_count = staged.transaction_count() as u64;
        check_fits(&Self::spec(RecordKind::Footer, "total_count")?, total_count)?;

        let control_sum = footer.control_sum.checked_add(amount).ok_or_else(|| {
            FixedWidthError::invalid_value("control_sum", amount.to_string(), "sum overflows")
        })?;
        check_fits(
            &Self::spec(RecordKind::Footer, "control_sum")?,
            control_sum.minor_units(),
        )?;

        debug!(
            "Footer update: total_count {} -> {}, control_sum {} -> {}",
            footer.total_count, total_count, footer.control_sum, control_sum
        );
        staged.update(
            footer_index + 1,
            Record::Footer(Footer {
                // fits in six digits, checked above
                total_count: total_count as u32,
                control_sum,
                ..footer
            }),
            &["total_count", "control_sum"],
        )?;

        self.commit(staged)?;
        info!("Added transaction {:06}: {} {}", counter, amount, currency);
        Ok(counter)
    }

    /// Sets one field of one record.
    ///
    /// The target is the transaction with `counter` when editing TRANSACTION
    /// records with a counter, and otherwise the first record of `kind`.
    /// Changing a transaction's `amount` moves the footer's control sum by the
    /// difference.
    pub fn set_field(
        &mut self,
        kind: RecordKind,
        field: &str,
        value: &str,
        counter: Option<u32>,
    ) -> Result<()> {
        let index = self
            .document
            .locate(kind, counter)
            .ok_or(FixedWidthError::RecordNotFound { kind, counter })?;

        let current = self.document.record(index);
        let mut record = current.clone();
        record.assign(field, value)?;
        validator::validate(&record)?;

        let mut staged = self.document.clone();

        if let (Record::Transaction(old), Record::Transaction(new)) = (current, &record) {
            if new.counter != old.counter && self.document.transaction(new.counter).is_some() {
                return Err(FixedWidthError::DuplicateCounter(new.counter));
            }

            if new.amount != old.amount {
                let footer_index = staged.footer_index()?;
                let footer = staged
                    .record(footer_index)
                    .as_footer()
                    .cloned()
                    .ok_or(FixedWidthError::FooterNotFound)?;
                let control_sum = rebalance(footer.control_sum, old.amount, new.amount)?;

                debug!(
                    "Footer update: control_sum {} -> {}",
                    footer.control_sum, control_sum
                );
                staged.update(
                    footer_index,
                    Record::Footer(Footer {
                        control_sum,
                        ..footer
                    }),
                    &["control_sum"],
                )?;
            }
        }

        staged.update(index, record, &[field])?;
        self.commit(staged)?;

        info!("Set {} field '{}' to '{}'", kind, field, value);
        Ok(())
    }

    fn commit(&mut self, staged: Document) -> Result<()> {
        self.store.write_lines(&staged.to_lines())?;
        self.document = staged;
        Ok(())
    }

    fn spec(kind: RecordKind, field: &str) -> Result<FieldSpec> {
        kind.field(field)
            .copied()
            .ok_or_else(|| FixedWidthError::FieldNotFound {
                kind,
                field: field.to_string(),
            })
    }
}

/// Control sum after replacing `old` with `new`.
fn rebalance(control_sum: Amount, old: Amount, new: Amount) -> Result<Amount> {
    let overflow = || {
        FixedWidthError::invalid_value(
            "control_sum",
            control_sum.to_string(),
            format!("cannot replace {} with {}", old, new),
        )
    };
    let sum = control_sum
        .checked_add(new)
        .and_then(|raised| raised.checked_sub(old))
        .ok_or_else(overflow)?;

    let spec = RecordKind::Footer
        .field("control_sum")
        .ok_or_else(overflow)?;
    check_fits(spec, sum.minor_units())?;
    Ok(sum)
}

fn check_fits(spec: &FieldSpec, value: u64) -> Result<()> {
    if value > spec.max_value() {
        return Err(FixedWidthError::invalid_value(
            spec.name,
            value.to_string(),
            format!("does not fit in {} digits", spec.width()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn header_line() -> String {
        format!("01{:<28}{:<30}{:<30}{:<28}  ", "Ann", "Lee", "", "Elm Road")
    }

    fn transaction_line(counter: u32, amount: u64, currency: &str) -> String {
        format!("02{:06}{:012}{}{:<95}  ", counter, amount, currency, "")
    }

    fn footer_line(count: u32, sum: u64) -> String {
        format!("03{:06}{:012}{:<98}  ", count, sum, "")
    }

    fn editor(lines: Vec<String>) -> Editor<MemoryStore> {
        Editor::open(MemoryStore::new(lines)).unwrap()
    }

    #[test]
    fn test_add_transaction_scenario() {
        let mut editor = editor(vec![
            header_line(),
            transaction_line(1, 12345, "USD"),
            footer_line(1, 12345),
        ]);

        let counter = editor.add_transaction(dec("50.00"), "EUR").unwrap();
        assert_eq!(counter, 2);

        let lines = editor.store().lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], transaction_line(2, 5000, "EUR"));
        assert_eq!(lines[3], footer_line(2, 17345));
        assert_eq!(editor.document().to_lines(), lines);
    }

    #[test]
    fn test_add_transaction_rejects_unknown_currency() {
        let original = vec![header_line(), footer_line(0, 0)];
        let mut editor = editor(original.clone());

        assert!(matches!(
            editor.add_transaction(dec("100.00"), "XXX"),
            Err(FixedWidthError::InvalidCurrencyCode(code)) if code == "XXX"
        ));
        assert_eq!(editor.store().writes(), 0);
        assert_eq!(editor.document().to_lines(), original);
    }

    #[test]
    fn test_add_transaction_rejects_negative_amount() {
        let mut editor = editor(vec![header_line(), footer_line(0, 0)]);
        assert!(matches!(
            editor.add_transaction(dec("-1.00"), "USD"),
            Err(FixedWidthError::InvalidAmount(_))
        ));
        assert_eq!(editor.store().writes(), 0);
    }

    #[test]
    fn test_add_transaction_needs_footer() {
        let mut editor = editor(vec![header_line()]);
        assert!(matches!(
            editor.add_transaction(dec("1"), "USD"),
            Err(FixedWidthError::FooterNotFound)
        ));
        assert_eq!(editor.store().writes(), 0);
    }

    #[test]
    fn test_add_transaction_rejects_control_sum_overflow() {
        let mut editor = editor(vec![header_line(), footer_line(0, 999_999_999_999)]);
        assert!(matches!(
            editor.add_transaction(dec("0.01"), "USD"),
            Err(FixedWidthError::InvalidValueFormat { ref field, .. }) if field == "control_sum"
        ));
        assert_eq!(editor.store().writes(), 0);
    }

    #[test]
    fn test_set_currency_by_counter_touches_one_field() {
        let original = vec![
            header_line(),
            transaction_line(1, 12345, "USD"),
            transaction_line(2, 100, "USD"),
            footer_line(2, 12445),
        ];
        let mut editor = editor(original.clone());

        editor
            .set_field(RecordKind::Transaction, "currency", "GBP", Some(1))
            .unwrap();

        let lines = editor.store().lines();
        assert_eq!(lines[1], transaction_line(1, 12345, "GBP"));
        assert_eq!(lines[0], original[0]);
        assert_eq!(lines[2], original[2]);
        assert_eq!(lines[3], original[3]);
    }

    #[test]
    fn test_set_amount_rebalances_control_sum() {
        let mut editor = editor(vec![
            header_line(),
            transaction_line(1, 12345, "USD"),
            transaction_line(2, 100, "USD"),
            footer_line(2, 12445),
        ]);

        editor
            .set_field(RecordKind::Transaction, "amount", "200.00", Some(2))
            .unwrap();

        let lines = editor.store().lines();
        assert_eq!(lines[2], transaction_line(2, 20000, "USD"));
        assert_eq!(lines[3], footer_line(2, 32345));
        assert!(editor.document().verify_footer().is_ok());
    }

    #[test]
    fn test_set_without_counter_targets_first_record() {
        let mut editor = editor(vec![
            header_line(),
            transaction_line(1, 10, "USD"),
            transaction_line(2, 20, "USD"),
            footer_line(2, 30),
        ]);

        editor
            .set_field(RecordKind::Transaction, "currency", "EUR", None)
            .unwrap();
        assert_eq!(editor.document().transaction(1).unwrap().currency, Currency::Eur);
        assert_eq!(editor.document().transaction(2).unwrap().currency, Currency::Usd);
    }

    #[test]
    fn test_set_header_name() {
        let mut editor = editor(vec![header_line(), footer_line(0, 0)]);
        editor
            .set_field(RecordKind::Header, "name", "Beatrice", None)
            .unwrap();
        assert!(editor.store().lines()[0].starts_with("01Beatrice   "));
    }

    #[test]
    fn test_set_failures_do_not_write() {
        let mut editor = editor(vec![
            header_line(),
            transaction_line(1, 10, "USD"),
            transaction_line(2, 20, "USD"),
            footer_line(2, 30),
        ]);

        assert!(matches!(
            editor.set_field(RecordKind::Transaction, "currency", "GBP", Some(9)),
            Err(FixedWidthError::RecordNotFound { counter: Some(9), .. })
        ));
        assert!(matches!(
            editor.set_field(RecordKind::Transaction, "colour", "red", Some(1)),
            Err(FixedWidthError::FieldNotFound { .. })
        ));
        assert!(matches!(
            editor.set_field(RecordKind::Transaction, "amount", "abc", Some(1)),
            Err(FixedWidthError::InvalidValueFormat { .. })
        ));
        assert!(matches!(
            editor.set_field(RecordKind::Transaction, "counter", "2", Some(1)),
            Err(FixedWidthError::DuplicateCounter(2))
        ));
        assert_eq!(editor.store().writes(), 0);
    }

    #[test]
    fn test_set_on_missing_kind_is_not_found() {
        let mut editor = editor(vec![header_line(), footer_line(0, 0)]);
        assert!(matches!(
            editor.set_field(RecordKind::Transaction, "currency", "GBP", None),
            Err(FixedWidthError::RecordNotFound { kind: RecordKind::Transaction, counter: None })
        ));
    }

    #[test]
    fn test_rebalance() {
        let sum = rebalance(
            Amount::from_minor_units(300),
            Amount::from_minor_units(100),
            Amount::from_minor_units(50),
        )
        .unwrap();
        assert_eq!(sum.minor_units(), 250);

        assert!(rebalance(
            Amount::from_minor_units(10),
            Amount::from_minor_units(100),
            Amount::from_minor_units(50),
        )
        .is_err());

        // a sum below the old amount still works when the new one covers it
        let sum = rebalance(
            Amount::from_minor_units(10),
            Amount::from_minor_units(100),
            Amount::from_minor_units(200),
        )
        .unwrap();
        assert_eq!(sum.minor_units(), 110);
    }

    #[test]
    fn test_set_amount_with_stale_footer_sum() {
        let mut editor = editor(vec![
            header_line(),
            transaction_line(1, 10000, "USD"),
            footer_line(1, 1000),
        ]);

        editor
            .set_field(RecordKind::Transaction, "amount", "200.00", Some(1))
            .unwrap();

        let footer = editor.document().footer().unwrap();
        assert_eq!(footer.control_sum.minor_units(), 11000);
        assert_eq!(editor.store().lines()[2], footer_line(1, 11000));
    }

    #[test]
    fn test_set_keeps_unmapped_columns() {
        let tx = format!("02{:06}{:012}USD{:<95}ZZ", 1, 12345, "");
        let footer = format!("03{:06}{:012}{:<98}YY", 1, 12345, "");
        let mut editor = editor(vec![header_line(), tx, footer]);

        editor
            .set_field(RecordKind::Transaction, "currency", "GBP", Some(1))
            .unwrap();
        editor
            .set_field(RecordKind::Transaction, "amount", "1.00", Some(1))
            .unwrap();

        let lines = editor.store().lines();
        assert_eq!(lines[1], format!("02{:06}{:012}GBP{:<95}ZZ", 1, 100, ""));
        assert_eq!(lines[2], format!("03{:06}{:012}{:<98}YY", 1, 100, ""));
    }

    #[test]
    fn test_set_keeps_other_text_fields_as_stored() {
        let header = format!("01{:<28}{:<30}{:<30}{:<28}  ", "  Ann", "Lee", "", "Elm Road");
        let mut editor = editor(vec![header.clone(), footer_line(0, 0)]);

        editor
            .set_field(RecordKind::Header, "surname", "Moss", None)
            .unwrap();

        let line = &editor.store().lines()[0];
        assert_eq!(&line[..30], &header[..30]);
        assert_eq!(&line[30..60], format!("{:<30}", "Moss"));
        assert_eq!(&line[60..], &header[60..]);
    }
}
