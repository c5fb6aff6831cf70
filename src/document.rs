//! In-memory view of a whole file.
//!
//! A [`Document`] is built by running every line through
//! `classify -> parse -> validate`. Any failure rejects the whole file; there
//! is no partially loaded state.
//!
//! Each record keeps the line it came from. Serializing emits those lines
//! as stored. An edit rewrites only the columns of the fields it changed,
//! and only inserted records are encoded from scratch.

use crate::amount::Amount;
use crate::codec;
use crate::error::{FixedWidthError, Result};
use crate::layout::{FieldSpec, RecordKind};
use crate::record::{FieldValue, Footer, Record, Transaction};
use crate::store::LineSource;
use crate::validator;
use log::{debug, warn};
use std::collections::HashSet;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    record: Record,
    line: String,
}

impl Entry {
    fn encode(record: Record) -> Result<Self> {
        let line = codec::format(&record)?;
        Ok(Entry { record, line })
    }
}

/// The ordered records of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    entries: Vec<Entry>,
}

impl Document {
    /// Parses and validates every line.
    ///
    /// Fails on the first malformed line or on a repeated transaction
    /// counter.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = Vec::new();
        let mut counters = HashSet::new();

        for (idx, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            let line_num = idx + 1;

            let record = Self::decode_line(line).map_err(|e| {
                warn!("Line {}: {}", line_num, e);
                e
            })?;

            if let Record::Transaction(tx) = &record {
                if !counters.insert(tx.counter) {
                    warn!("Line {}: duplicate transaction counter {:06}", line_num, tx.counter);
                    return Err(FixedWidthError::DuplicateCounter(tx.counter));
                }
            }

            entries.push(Entry {
                record,
                line: line.to_string(),
            });
        }

        debug!("Loaded document with {} records", entries.len());
        Ok(Document { entries })
    }

    /// Reads all lines from `source` and builds a document from them.
    pub fn load<S: LineSource + ?Sized>(source: &S) -> Result<Self> {
        Self::from_lines(source.read_lines()?)
    }

    fn decode_line(line: &str) -> Result<Record> {
        let kind = codec::classify(line)?;
        let record = codec::parse(line, kind)?;
        validator::validate(&record)?;
        Ok(record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All records in file order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|entry| &entry.record)
    }

    /// Records of one kind, in file order.
    pub fn records_of_kind(&self, kind: RecordKind) -> impl Iterator<Item = &Record> {
        self.records().filter(move |record| record.kind() == kind)
    }

    /// All transactions, in file order.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.records().filter_map(Record::as_transaction)
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions().count()
    }

    /// The transaction with the given counter, if any.
    pub fn transaction(&self, counter: u32) -> Option<&Transaction> {
        self.transactions().find(|tx| tx.counter == counter)
    }

    /// The last FOOTER record in the file.
    pub fn footer(&self) -> Result<&Footer> {
        let index = self.footer_index()?;
        self.entries[index]
            .record
            .as_footer()
            .ok_or(FixedWidthError::FooterNotFound)
    }

    /// Counter for the next transaction: one past the highest counter in
    /// the file, or 1 if there are no transactions.
    ///
    /// Always derived from the current records rather than cached.
    pub fn next_counter(&self) -> u32 {
        self.transactions()
            .map(|tx| tx.counter)
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    /// Sum of all transaction amounts, or `None` on overflow.
    pub fn transaction_total(&self) -> Option<Amount> {
        Amount::checked_sum(self.transactions().map(|tx| tx.amount))
    }

    /// Checks that the footer's count and control sum match the
    /// transactions.
    pub fn verify_footer(&self) -> Result<()> {
        let footer = self.footer()?;

        let count = self.transaction_count();
        if footer.total_count as usize != count {
            return Err(FixedWidthError::FooterMismatch {
                field: "total_count",
                stored: footer.total_count.to_string(),
                computed: count.to_string(),
            });
        }

        let total = self.transaction_total();
        if total != Some(footer.control_sum) {
            return Err(FixedWidthError::FooterMismatch {
                field: "control_sum",
                stored: footer.control_sum.to_string(),
                computed: total.map_or_else(|| "overflow".to_string(), |sum| sum.to_string()),
            });
        }

        Ok(())
    }

    /// Reads a field by name.
    ///
    /// For TRANSACTION with a counter, the matching transaction is used;
    /// otherwise the first record of `kind`. A missing record is `Ok(None)`.
    pub fn field(
        &self,
        kind: RecordKind,
        field: &str,
        counter: Option<u32>,
    ) -> Result<Option<FieldValue>> {
        Self::check_field(kind, field)?;
        Ok(self
            .locate(kind, counter)
            .and_then(|index| self.entries[index].record.get(field)))
    }

    /// Like [`Document::field`], but returns the field's columns exactly as
    /// stored in the line.
    pub fn encoded_field(
        &self,
        kind: RecordKind,
        field: &str,
        counter: Option<u32>,
    ) -> Result<Option<String>> {
        let spec = Self::check_field(kind, field)?;
        Ok(self.locate(kind, counter).map(|index| {
            self.entries[index]
                .line
                .chars()
                .skip(spec.start)
                .take(spec.width())
                .collect()
        }))
    }

    fn check_field(kind: RecordKind, field: &str) -> Result<&'static FieldSpec> {
        kind.field(field).ok_or_else(|| FixedWidthError::FieldNotFound {
            kind,
            field: field.to_string(),
        })
    }

    /// The file's lines, one per record.
    pub fn to_lines(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.line.clone()).collect()
    }

    /// Writes transactions as CSV with `counter,amount,currency` columns.
    pub fn write_transactions_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for tx in self.transactions() {
            csv_writer.serialize(tx)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Index of the record an edit of `kind` should target.
    pub(crate) fn locate(&self, kind: RecordKind, counter: Option<u32>) -> Option<usize> {
        match (kind, counter) {
            (RecordKind::Transaction, Some(counter)) => self.entries.iter().position(|entry| {
                entry
                    .record
                    .as_transaction()
                    .is_some_and(|tx| tx.counter == counter)
            }),
            (_, counter) => {
                if let Some(counter) = counter {
                    warn!("Ignoring counter {:06} for {} records", counter, kind);
                }
                self.entries
                    .iter()
                    .position(|entry| entry.record.kind() == kind)
            }
        }
    }

    /// Index of the last FOOTER, scanning from the end.
    pub(crate) fn footer_index(&self) -> Result<usize> {
        self.entries
            .iter()
            .rposition(|entry| entry.record.kind() == RecordKind::Footer)
            .ok_or(FixedWidthError::FooterNotFound)
    }

    pub(crate) fn record(&self, index: usize) -> &Record {
        &self.entries[index].record
    }

    /// Replaces the record at `index`, rewriting only the columns of
    /// `fields` in its stored line.
    pub(crate) fn update(&mut self, index: usize, record: Record, fields: &[&str]) -> Result<()> {
        let entry = &mut self.entries[index];
        entry.line = codec::splice(&entry.line, &record, fields)?;
        entry.record = record;
        Ok(())
    }

    /// Inserts a record before `index` and encodes its line.
    pub(crate) fn insert(&mut self, index: usize, record: Record) -> Result<()> {
        self.entries.insert(index, Entry::encode(record)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Currency;

    fn header_line() -> String {
        format!("01{:<28}{:<30}{:<30}{:<28}  ", "Ann", "Lee", "", "Elm Road")
    }

    fn transaction_line(counter: u32, amount: u64, currency: &str) -> String {
        format!("02{:06}{:012}{}{:<95}  ", counter, amount, currency, "")
    }

    fn footer_line(count: u32, sum: u64) -> String {
        format!("03{:06}{:012}{:<98}  ", count, sum, "")
    }

    fn sample() -> Vec<String> {
        vec![
            header_line(),
            transaction_line(1, 12345, "USD"),
            transaction_line(4, 500, "GBP"),
            footer_line(2, 12845),
        ]
    }

    #[test]
    fn test_build_and_lookup() {
        let doc = Document::from_lines(sample()).unwrap();
        assert_eq!(doc.len(), 4);
        assert_eq!(doc.records_of_kind(RecordKind::Header).count(), 1);
        assert_eq!(doc.transaction_count(), 2);

        let tx = doc.transaction(4).unwrap();
        assert_eq!(tx.currency, Currency::Gbp);
        assert!(doc.transaction(2).is_none());

        assert_eq!(doc.footer().unwrap().total_count, 2);
    }

    #[test]
    fn test_next_counter_uses_highest_counter() {
        let doc = Document::from_lines(sample()).unwrap();
        assert_eq!(doc.next_counter(), 5);

        let empty = Document::from_lines([header_line(), footer_line(0, 0)]).unwrap();
        assert_eq!(empty.next_counter(), 1);
    }

    #[test]
    fn test_build_fails_on_first_bad_line() {
        let mut lines = sample();
        lines.insert(2, "99".repeat(60));
        assert!(matches!(
            Document::from_lines(lines),
            Err(FixedWidthError::UnknownRecordKind(code)) if code == "99"
        ));
    }

    #[test]
    fn test_build_rejects_short_line() {
        let mut lines = sample();
        lines[1].pop();
        assert!(matches!(
            Document::from_lines(lines),
            Err(FixedWidthError::InvalidRecordLength { actual: 119, expected: 120 })
        ));
    }

    #[test]
    fn test_build_rejects_duplicate_counters() {
        let mut lines = sample();
        lines[2] = transaction_line(1, 500, "GBP");
        assert!(matches!(
            Document::from_lines(lines),
            Err(FixedWidthError::DuplicateCounter(1))
        ));
    }

    #[test]
    fn test_footer_missing() {
        let doc = Document::from_lines([header_line(), transaction_line(1, 1, "USD")]).unwrap();
        assert!(matches!(doc.footer(), Err(FixedWidthError::FooterNotFound)));
    }

    #[test]
    fn test_footer_found_from_the_end() {
        let lines = vec![
            header_line(),
            footer_line(9, 9),
            transaction_line(1, 1, "USD"),
            footer_line(1, 1),
            header_line(),
        ];
        let doc = Document::from_lines(lines).unwrap();
        assert_eq!(doc.footer().unwrap().total_count, 1);
    }

    #[test]
    fn test_field_lookup() {
        let doc = Document::from_lines(sample()).unwrap();

        let value = doc.field(RecordKind::Transaction, "amount", Some(1)).unwrap();
        assert_eq!(value.unwrap().to_string(), "123.45");

        let raw = doc
            .encoded_field(RecordKind::Transaction, "amount", Some(1))
            .unwrap();
        assert_eq!(raw.as_deref(), Some("000000012345"));

        let first = doc.field(RecordKind::Transaction, "counter", None).unwrap();
        assert_eq!(first, Some(FieldValue::Number(1)));

        let name = doc.field(RecordKind::Header, "name", None).unwrap();
        assert_eq!(name, Some(FieldValue::Text("Ann".into())));
    }

    #[test]
    fn test_field_lookup_misses() {
        let doc = Document::from_lines(sample()).unwrap();
        assert_eq!(doc.field(RecordKind::Transaction, "amount", Some(9)).unwrap(), None);
        assert!(matches!(
            doc.field(RecordKind::Footer, "amount", None),
            Err(FixedWidthError::FieldNotFound { kind: RecordKind::Footer, .. })
        ));
    }

    #[test]
    fn test_verify_footer() {
        let doc = Document::from_lines(sample()).unwrap();
        assert!(doc.verify_footer().is_ok());

        let mut lines = sample();
        lines[3] = footer_line(2, 12846);
        let doc = Document::from_lines(lines).unwrap();
        assert!(matches!(
            doc.verify_footer(),
            Err(FixedWidthError::FooterMismatch { field: "control_sum", .. })
        ));

        let mut lines = sample();
        lines[3] = footer_line(3, 12845);
        let doc = Document::from_lines(lines).unwrap();
        assert!(matches!(
            doc.verify_footer(),
            Err(FixedWidthError::FooterMismatch { field: "total_count", .. })
        ));
    }

    #[test]
    fn test_untouched_lines_are_emitted_verbatim() {
        let mut lines = sample();
        // non-canonical: text not where format would put it
        lines[0] = format!("01  Ann{:<113}", "");
        let doc = Document::from_lines(lines.clone()).unwrap();
        assert_eq!(doc.to_lines(), lines);
    }

    #[test]
    fn test_write_transactions_csv() {
        let doc = Document::from_lines(sample()).unwrap();
        let mut output = Vec::new();
        doc.write_transactions_csv(&mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert_eq!(
            output_str,
            "counter,amount,currency\n1,123.45,USD\n4,5.00,GBP\n"
        );
    }
}
