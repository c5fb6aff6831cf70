//! # Fixed-Width File
//!
//! Reads and edits files made of 120-character records. Each line is a
//! HEADER, TRANSACTION or FOOTER record, told apart by its first two
//! characters, with fields at fixed column ranges.
//!
//! ## Design Principles
//!
//! - **One layout table**: every column offset lives in [`layout`]
//! - **Lossless round-trip**: untouched lines are written back byte-for-byte
//! - **Consistent aggregates**: the footer's count and control sum are updated
//!   with every edit that affects them
//! - **All or nothing**: a file with one bad line is rejected, and an edit
//!   that fails validation writes nothing
//!
//! ## Example
//!
//! ```no_run
//! use fixed_width_file::{Editor, FileStore};
//! use rust_decimal::Decimal;
//!
//! let mut editor = Editor::open(FileStore::new("records.txt")).unwrap();
//! let counter = editor.add_transaction(Decimal::new(5000, 2), "EUR").unwrap();
//! println!("added transaction {:06}", counter);
//! ```

pub mod amount;
pub mod codec;
pub mod document;
pub mod editor;
pub mod error;
pub mod layout;
pub mod record;
pub mod store;
pub mod validator;

pub use amount::Amount;
pub use document::Document;
pub use editor::Editor;
pub use error::{FixedWidthError, Result};
pub use layout::{Currency, FieldEncoding, FieldSpec, RecordKind, ALLOWED_CURRENCIES, RECORD_WIDTH};
pub use record::{FieldValue, Footer, Header, Record, Transaction};
pub use store::{FileStore, LineSink, LineSource, MemoryStore};
