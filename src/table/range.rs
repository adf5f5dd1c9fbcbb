use crate::spreadsheet::reference::column_name_to_number;
use crate::spreadsheet::reference::row_to_number;
use crate::spreadsheet::reference::split_reference;
use thiserror::Error;

/// Errors related to range reference parsing.
#[derive(Error, Debug, PartialEq)]
pub enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),
}

/// A rectangular cell range with 1-based, inclusive bounds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TableRange {
    pub col_start: usize,
    pub col_end: usize,
    pub row_start: usize,
    pub row_end: usize,
}

impl TableRange {
    /// Number of columns covered by the range.
    pub fn width(&self) -> usize {
        self.col_end - self.col_start + 1
    }
}

/// Parses a range reference of the form `<col><row>:<col><row>` such as `B2:D10`.
///
/// Column letters are case-insensitive and `$` anchors are ignored. Both halves
/// must be present, each with a letter run and a digit run, and the first corner
/// must not lie after the second.
pub fn parse_range(reference: &str) -> Result<TableRange, RangeError> {
    let error = || RangeError::FormatError(reference.to_owned());
    let cleaned = reference.trim().replace('$', "");
    let (first, last) = cleaned.split_once(':').ok_or_else(error)?;
    let (col_start, row_start) = parse_corner(first).ok_or_else(error)?;
    let (col_end, row_end) = parse_corner(last).ok_or_else(error)?;
    if col_start > col_end || row_start > row_end {
        return Err(error());
    }
    Ok(TableRange {
        col_start,
        col_end,
        row_start,
        row_end,
    })
}

/// Splits one corner into its column and row numbers.
fn parse_corner(corner: &str) -> Option<(usize, usize)> {
    let (letters, digits) = split_reference(corner);
    Some((column_name_to_number(letters)?, row_to_number(digits)?))
}

impl TryFrom<&str> for TableRange {
    type Error = RangeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        parse_range(value)
    }
}
