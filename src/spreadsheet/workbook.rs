use crate::error::RustyTableError;
use crate::helpers::reader::UnifiedReader;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx;
use crate::spreadsheet::Document;
use crate::spreadsheet::SheetId;
use crate::spreadsheet::TableDefinition;
use std::path::Path;

/// An in-memory workbook: every sheet, cell and table definition is loaded up front,
/// after which the workbook is only read.
#[derive(Clone, Debug)]
pub struct Workbook {
    /// Source name (file path, or a label for in-memory workbooks)
    name: String,
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Opens an XLSX/XLSM package from a local path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Workbook, RustyTableError> {
        let name = path.as_ref().to_string_lossy().to_string();
        let reader = UnifiedReader::open(path)?;
        let sheets = xlsx::load(&name, reader)?;
        Ok(Workbook { name, sheets })
    }

    /// Loads an XLSX/XLSM package held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Workbook, RustyTableError> {
        let name = String::from("<memory>");
        let sheets = xlsx::load(&name, UnifiedReader::from_bytes(bytes))?;
        Ok(Workbook { name, sheets })
    }

    /// Starts an in-memory workbook.
    pub fn builder() -> WorkbookBuilder {
        WorkbookBuilder { sheets: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }

    fn sheet(&self, sheet: SheetId) -> Option<&Sheet> {
        self.sheets.get(sheet.0)
    }
}

impl Document for Workbook {
    fn find_sheet(&self, name: &str) -> Option<SheetId> {
        self.sheets
            .iter()
            .position(|sheet| sheet.name == name)
            .map(SheetId)
    }

    fn tables(&self, sheet: SheetId) -> &[TableDefinition] {
        self.sheet(sheet)
            .map(|sheet| sheet.tables.as_slice())
            .unwrap_or_default()
    }

    fn cell_text(&self, sheet: SheetId, row: usize, column: usize) -> String {
        match (self.sheet(sheet), row.checked_sub(1), column.checked_sub(1)) {
            (Some(sheet), Some(row), Some(col)) => sheet.text(row, col),
            _ => String::new(),
        }
    }

    fn row_exists(&self, sheet: SheetId, row: usize) -> bool {
        match (self.sheet(sheet), row.checked_sub(1)) {
            (Some(sheet), Some(row)) => sheet.has_row(row),
            _ => false,
        }
    }
}

/// Builder for in-memory workbooks holding plain text cells.
pub struct WorkbookBuilder {
    sheets: Vec<Sheet>,
}

impl WorkbookBuilder {
    /// Appends a sheet, filled in by `build`.
    pub fn sheet<F>(mut self, name: &str, build: F) -> Self
    where
        F: FnOnce(SheetBuilder) -> SheetBuilder,
    {
        let builder = build(SheetBuilder { sheet: Sheet::new(name) });
        self.sheets.push(builder.sheet);
        self
    }

    pub fn build(self) -> Workbook {
        Workbook {
            name: String::from("<memory>"),
            sheets: self.sheets,
        }
    }
}

/// Builder for one in-memory sheet. Rows and columns are 1-based.
pub struct SheetBuilder {
    sheet: Sheet,
}

impl SheetBuilder {
    /// Stores a row with values placed from column A onwards. The row exists even
    /// when `values` is empty.
    pub fn row<I, S>(mut self, row: usize, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(row) = row.checked_sub(1) {
            self.sheet.mark_row(row);
            for (col, value) in values.into_iter().enumerate() {
                self.sheet.push(text_cell(row, col, value.into()));
            }
        }
        self
    }

    /// Stores a single cell.
    pub fn cell<S: Into<String>>(mut self, row: usize, column: usize, value: S) -> Self {
        if let (Some(row), Some(col)) = (row.checked_sub(1), column.checked_sub(1)) {
            self.sheet.push(text_cell(row, col, value.into()));
        }
        self
    }

    /// Declares a table region whose internal and display names are `name`.
    pub fn table(self, name: &str, reference: &str) -> Self {
        self.add_table(TableDefinition::new(name, reference))
    }

    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.sheet.tables.push(table);
        self
    }
}

fn text_cell(row: usize, col: usize, value: String) -> Cell {
    Cell {
        row,
        col,
        kind: CellType::InlineString,
        value,
    }
}
