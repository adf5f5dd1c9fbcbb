//! # Rusty Table
//!
//! Decodes named table regions of Excel workbooks into strongly typed records,
//! collecting per-cell and per-row diagnostics instead of failing on the first
//! bad value. Aimed at batch import pipelines that must tolerate partially
//! malformed input and report exactly which row, column and field went wrong.
//!
//! ## Features
//!
//! - **Workbook reader**: XLSX/XLSM packages with shared strings, inline strings,
//!   date number formats (1900 and 1904 systems) and table parts
//! - **Declared schemas**: records list their fields once through [`Record`], with
//!   column name overrides and constraints (`required`, lengths, ranges, patterns)
//! - **Typed coercion**: text, integers, decimals, booleans, dates, times,
//!   enumerations and their nullable forms
//! - **Partial success**: every non-blank row is kept with a validity flag, and
//!   every problem becomes a [`Diagnostic`]
//!
//! ## Example
//!
//! ```
//! use rusty_table::{decode_table, field, Record, Schema, Workbook};
//!
//! #[derive(Debug, Default)]
//! struct Item {
//!     name: String,
//!     qty: i64,
//! }
//!
//! impl Record for Item {
//!     fn schema() -> Schema<Self> {
//!         Schema::new()
//!             .field(field!(Item, name).column("Name").required())
//!             .field(field!(Item, qty).column("Qty"))
//!     }
//! }
//!
//! let workbook = Workbook::builder()
//!     .sheet("Items", |sheet| {
//!         sheet
//!             .row(1, ["Name", "Qty"])
//!             .row(2, ["Widget", "5"])
//!             .row(3, ["Gadget", "abc"])
//!             .table("t_items", "A1:B3")
//!     })
//!     .build();
//!
//! let result = decode_table::<Item, _>(&workbook, "Items", Some("t_items"), None);
//! assert_eq!(result.rows().len(), 2);
//! assert_eq!(result.valid_rows().count(), 1);
//! assert_eq!(result.diagnostics()[0].message, "Cannot convert 'abc' to i64");
//! ```
mod error;
mod helpers;
pub mod spreadsheet;
pub mod table;

pub use error::RustyTableError;
pub use spreadsheet::Document;
pub use spreadsheet::SheetId;
pub use spreadsheet::TableDefinition;
pub use spreadsheet::Workbook;
pub use table::decode_table;
pub use table::decode_table_with_options;
pub use table::DecodeOptions;
pub use table::Diagnostic;
pub use table::Field;
pub use table::ParsedRow;
pub use table::Record;
pub use table::RowValidator;
pub use table::Schema;
pub use table::TableResult;
pub use table::Violation;
