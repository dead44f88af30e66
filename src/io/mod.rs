//! I/O module
//!
//! Handles replay script parsing and report output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (row conversion, report serialization)
//! - `sync_reader` - Synchronous script reader with iterator interface
//! - `async_reader` - Asynchronous script reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_record, write_accounts_csv, write_journal_csv, write_summaries_csv, OperationRecord,
};
pub use sync_reader::SyncReader;
