//! # Spreadsheet Module
//!
//! The document side of table decoding. [`Document`] is the read-only interface the
//! decoder consumes: sheet lookup, table lookup, resolved cell text and row presence.
//! [`Workbook`] implements it over a fully materialised workbook, loaded either from an
//! XLSX/XLSM package or assembled in memory through [`WorkbookBuilder`].
pub(crate) mod cell;
pub(crate) mod excel;
pub mod reference;
pub(crate) mod sheet;
pub mod workbook;
pub(crate) mod xlsx;

pub use workbook::SheetBuilder;
pub use workbook::Workbook;
pub use workbook::WorkbookBuilder;

use thiserror::Error;

/// Errors raised while loading a spreadsheet package.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Missing package part '{0}'")]
    FileError(String),

    #[error("Workbook '{0}' contains no sheets")]
    SpreadsheetEmptyError(String),

    #[error("Shared string index {1} at '{0}' is out of bounds")]
    SharedStringIndexError(String, usize),
}

/// Handle of a sheet inside a [`Document`], valid for the document that produced it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SheetId(pub usize);

/// A named table region declared on a sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDefinition {
    /// Internal table name
    pub name: String,
    /// Name shown to users and used in structured references
    pub display_name: String,
    /// Range reference such as `A1:D20`, header row included
    pub reference: String,
    /// Number of totals rows at the bottom of the range
    pub totals_row_count: usize,
}

impl TableDefinition {
    /// Creates a table whose internal and display names are the same.
    pub fn new(name: &str, reference: &str) -> Self {
        Self {
            name: name.to_owned(),
            display_name: name.to_owned(),
            reference: reference.to_owned(),
            totals_row_count: 0,
        }
    }

    pub fn with_totals_row_count(mut self, count: usize) -> Self {
        self.totals_row_count = count;
        self
    }

    fn matches(&self, name: &str) -> bool {
        self.display_name == name || self.name == name
    }
}

/// Read-only access to a spreadsheet document.
///
/// Rows and columns are 1-based. Implementations only need to be safe for
/// sequential use from one thread; the decoder never mutates the document.
pub trait Document {
    /// Looks up a sheet by exact name.
    fn find_sheet(&self, name: &str) -> Option<SheetId>;

    /// Table regions declared on the sheet, in declaration order.
    fn tables(&self, sheet: SheetId) -> &[TableDefinition];

    /// Resolved text of a cell, shared strings dereferenced; empty when the cell is absent.
    fn cell_text(&self, sheet: SheetId, row: usize, column: usize) -> String;

    /// Returns true if the row is present in the sheet's storage.
    fn row_exists(&self, sheet: SheetId, row: usize) -> bool;

    /// Picks the table named `name` (display name first, then internal name), or the
    /// first declared table when no name is given.
    fn find_table(&self, sheet: SheetId, name: Option<&str>) -> Option<&TableDefinition> {
        let tables = self.tables(sheet);
        match name {
            Some(name) => tables
                .iter()
                .find(|table| table.display_name == name)
                .or_else(|| tables.iter().find(|table| table.matches(name))),
            None => {
                if tables.len() > 1 {
                    tracing::warn!(
                        tables = tables.len(),
                        selected = %tables[0].display_name,
                        "no table name given and sheet declares several tables; using the first"
                    );
                }
                tables.first()
            }
        }
    }
}
