//! Fixed-Width File CLI
//!
//! Reads fields from, edits, and appends transactions to 120-column
//! fixed-width record files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- get records.txt TRANSACTION amount --transaction-counter 1
//! cargo run -- set records.txt TRANSACTION currency GBP --transaction-counter 1
//! cargo run -- add records.txt 50.00 EUR
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `info` to control logging verbosity

use clap::{Parser, Subcommand};
use fixed_width_file::{Document, Editor, FileStore, FixedWidthError, RecordKind, Result};
use log::debug;
use rust_decimal::Decimal;
use std::io;
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

/// Manage and edit fixed-width record files.
#[derive(Parser)]
#[command(name = "fixed-width-file")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value of a field
    Get {
        /// Path to the fixed-width file
        file: PathBuf,

        /// Record kind: HEADER, TRANSACTION or FOOTER
        kind: RecordKind,

        /// Name of the field to read
        field: String,

        /// Counter of the transaction to read
        #[arg(long)]
        transaction_counter: Option<u32>,

        /// Print the field's columns exactly as stored
        #[arg(long)]
        raw: bool,
    },

    /// Set a new value for a field
    Set {
        /// Path to the fixed-width file
        file: PathBuf,

        /// Record kind: HEADER, TRANSACTION or FOOTER
        kind: RecordKind,

        /// Name of the field to set
        field: String,

        /// New value; amounts are given in major units (e.g. 12.50)
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Counter of the transaction to edit
        #[arg(long)]
        transaction_counter: Option<u32>,
    },

    /// Add a transaction before the footer
    Add {
        /// Path to the fixed-width file
        file: PathBuf,

        /// Amount in major units (e.g. 1234.56)
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Currency code (USD, EUR or GBP)
        currency: String,
    },

    /// Print all transactions as CSV
    List {
        /// Path to the fixed-width file
        file: PathBuf,
    },

    /// Check that the footer matches the transactions
    Verify {
        /// Path to the fixed-width file
        file: PathBuf,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Get {
            file,
            kind,
            field,
            transaction_counter,
            raw,
        } => {
            let document = Document::load(&FileStore::new(file))?;
            let value = if raw {
                document.encoded_field(kind, &field, transaction_counter)?
            } else {
                document
                    .field(kind, &field, transaction_counter)?
                    .map(|value| value.to_string())
            };
            let value = value.ok_or(FixedWidthError::RecordNotFound {
                kind,
                counter: transaction_counter,
            })?;
            println!("{}", value);
        }
        Commands::Set {
            file,
            kind,
            field,
            value,
            transaction_counter,
        } => {
            let mut editor = Editor::open(FileStore::new(file))?;
            editor.set_field(kind, &field, &value, transaction_counter)?;
            println!("Set {} field '{}' to '{}'", kind, field, value);
        }
        Commands::Add {
            file,
            amount,
            currency,
        } => {
            let amount = Decimal::from_str(amount.trim())
                .map_err(|_| FixedWidthError::InvalidAmountFormat(amount.clone()))?;
            let mut editor = Editor::open(FileStore::new(file))?;
            let counter = editor.add_transaction(amount, &currency)?;
            println!("Added transaction {:06}", counter);
        }
        Commands::List { file } => {
            let document = Document::load(&FileStore::new(file))?;
            let stdout = io::stdout();
            let handle = stdout.lock();
            document.write_transactions_csv(handle)?;
        }
        Commands::Verify { file } => {
            let store = FileStore::new(file);
            let document = Document::load(&store)?;
            document.verify_footer()?;
            debug!("{} is consistent", store.path().display());
            println!(
                "OK: {} transactions, control sum {}",
                document.transaction_count(),
                document.footer()?.control_sum
            );
        }
    }

    Ok(())
}
