use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::TableDefinition;
use std::collections::BTreeSet;
use std::collections::HashMap;

/// A fully materialised worksheet: stored cells, stored rows and declared tables.
#[derive(Clone, Debug, Default)]
pub(crate) struct Sheet {
    /// Sheet name
    pub(crate) name: String,
    /// All stored cells in document order
    pub(crate) cells: Vec<Cell>,
    /// Index mapping from 0-based (row, col) to cell vector position
    indexes: HashMap<(usize, usize), usize>,
    /// 0-based indexes of rows present in storage
    rows: BTreeSet<usize>,
    /// Table regions declared on this sheet, in declaration order
    pub(crate) tables: Vec<TableDefinition>,
}

impl Sheet {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// Records that a row exists in storage, even if it holds no cells.
    pub(crate) fn mark_row(&mut self, row: usize) {
        self.rows.insert(row);
    }

    /// Adds a cell; a later cell at the same position replaces the earlier one.
    pub(crate) fn push(&mut self, cell: Cell) {
        self.rows.insert(cell.row);
        if let Some(index) = self.indexes.get(&(cell.row, cell.col)) {
            tracing::trace!(sheet = %self.name, cell = %cell.reference(), "duplicate cell replaced");
            self.cells[*index] = cell;
        } else {
            self.indexes.insert((cell.row, cell.col), self.cells.len());
            self.cells.push(cell);
        }
    }

    /// Gets the cell at 0-based (row, col), if stored.
    pub(crate) fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.indexes
            .get(&(row, col))
            .and_then(|index| self.cells.get(*index))
    }

    /// Returns true if the 0-based row is present in storage.
    pub(crate) fn has_row(&self, row: usize) -> bool {
        self.rows.contains(&row)
    }

    /// Resolved text of the cell at 0-based (row, col); empty when not stored.
    pub(crate) fn text(&self, row: usize, col: usize) -> String {
        self.get(row, col)
            .map(|cell| cell.to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellType;

    fn push(sheet: &mut Sheet, row: usize, col: usize, value: &str) {
        sheet.push(Cell {
            row,
            col,
            kind: CellType::InlineString,
            value: value.to_owned(),
        });
    }

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("Items");
        assert_eq!(sheet.name, "Items");
        assert!(sheet.cells.is_empty());
        assert!(!sheet.has_row(0));
        assert_eq!(sheet.text(0, 0), "");
    }

    #[test]
    fn sheet_push_and_lookup() {
        let mut sheet = Sheet::new("Items");
        push(&mut sheet, 1, 1, "a");
        push(&mut sheet, 1, 3, "b");
        push(&mut sheet, 3, 1, "c");

        assert_eq!(sheet.cells.len(), 3);
        assert_eq!(sheet.text(1, 3), "b");
        assert_eq!(sheet.text(1, 2), "");
        assert!(sheet.has_row(1));
        assert!(!sheet.has_row(2));
        assert!(sheet.has_row(3));
    }

    #[test]
    fn sheet_duplicate_cell_replaced() {
        let mut sheet = Sheet::new("Items");
        push(&mut sheet, 0, 0, "old");
        push(&mut sheet, 0, 0, "new");
        assert_eq!(sheet.cells.len(), 1);
        assert_eq!(sheet.text(0, 0), "new");
    }

    #[test]
    fn sheet_marked_row_without_cells() {
        let mut sheet = Sheet::new("Items");
        sheet.mark_row(4);
        assert!(sheet.has_row(4));
        assert!(sheet.get(4, 0).is_none());
    }
}
