use std::fmt::Display;

/// One problem found while decoding a table.
///
/// Sheet and table level failures carry no row number. Conversion failures
/// carry the row, column header, field name and raw text; constraint
/// violations carry the row and field; custom validator messages only the row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based sheet row number
    pub row: Option<usize>,
    /// Header text of the offending column
    pub column: Option<String>,
    pub field: Option<String>,
    /// Cell text that failed to convert
    pub raw_value: Option<String>,
    pub message: String,
}

impl Diagnostic {
    /// A diagnostic about the whole table, without row context.
    pub fn table<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// A diagnostic about one row.
    pub fn row<S: Into<String>>(row: usize, message: S) -> Self {
        Self {
            row: Some(row),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_column(mut self, column: &str) -> Self {
        self.column = Some(column.to_owned());
        self
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_owned());
        self
    }

    pub fn with_raw_value(mut self, raw_value: &str) -> Self {
        self.raw_value = Some(raw_value.to_owned());
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(row) = self.row {
            write!(f, "Row {}", row)?;
            if let Some(column) = &self.column {
                write!(f, ", column '{}'", column)?;
            }
            if let Some(field) = &self.field {
                write!(f, ", field '{}'", field)?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{}", self.message)
    }
}

/// The outcome of one decoded row.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedRow<R> {
    /// 1-based sheet row number
    pub row_number: usize,
    pub record: R,
    /// True when decoding and validation raised no diagnostic for this row
    pub is_valid: bool,
}

/// Every decoded row in sheet order, with all diagnostics in the order they were raised.
#[derive(Clone, Debug)]
pub struct TableResult<R> {
    rows: Vec<ParsedRow<R>>,
    diagnostics: Vec<Diagnostic>,
}

impl<R> TableResult<R> {
    pub(crate) fn new() -> Self {
        Self {
            rows: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// A result holding no rows and a single table level diagnostic.
    pub(crate) fn failed(diagnostic: Diagnostic) -> Self {
        Self {
            rows: Vec::new(),
            diagnostics: vec![diagnostic],
        }
    }

    /// Stores a row together with the diagnostics it raised.
    pub(crate) fn push(&mut self, row_number: usize, record: R, diagnostics: Vec<Diagnostic>) {
        self.rows.push(ParsedRow {
            row_number,
            record,
            is_valid: diagnostics.is_empty(),
        });
        self.diagnostics.extend(diagnostics);
    }

    pub fn rows(&self) -> &[ParsedRow<R>] {
        &self.rows
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn valid_rows(&self) -> impl Iterator<Item = &ParsedRow<R>> + '_ {
        self.rows.iter().filter(|row| row.is_valid)
    }

    pub fn invalid_rows(&self) -> impl Iterator<Item = &ParsedRow<R>> + '_ {
        self.rows.iter().filter(|row| !row.is_valid)
    }

    /// Records of every decoded row, valid or not.
    pub fn records(&self) -> impl Iterator<Item = &R> + '_ {
        self.rows.iter().map(|row| &row.record)
    }

    pub fn into_records(self) -> Vec<R> {
        self.rows.into_iter().map(|row| row.record).collect()
    }

    pub fn diagnostics_for_row(&self, row_number: usize) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics
            .iter()
            .filter(move |diagnostic| diagnostic.row == Some(row_number))
    }

    /// True when nothing at all was reported.
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
