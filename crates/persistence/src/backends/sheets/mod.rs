//! Spreadsheet backend.
//!
//! Each entity is one sheet of a spreadsheet reached through a web-app
//! endpoint. Every cell is a string, so numbers, booleans, timestamps and
//! lists are parsed leniently on the way out. Rows added by hand often carry
//! a numeric id in an `ID` or `Id` column; those resolve like any other id.
//!
//! The sheet tool cannot delete rows: `delete_*` logs a warning and returns
//! `false`.

mod backend;
mod client;
mod storage;

pub use backend::SheetsBackend;
pub use client::{HttpSheetsClient, SheetsApi};
pub use storage::RowKey;
