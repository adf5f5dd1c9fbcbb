use std::collections::HashSet;

/// Options controlling how table rows are scanned.
///
/// The defaults skip blank rows anywhere in the range, decode every row and
/// treat only empty or whitespace text as blank.
#[derive(Clone, Debug, Default)]
pub struct DecodeOptions {
    /// Cell texts treated as blank, in addition to empty or whitespace text
    pub nulls: HashSet<String>,
    /// Maximum number of non-blank data rows to decode
    pub rows_limit: Option<usize>,
    /// Stop at the first blank or absent data row instead of skipping it
    pub end_at_blank_row: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nulls<I, S>(mut self, nulls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nulls = nulls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rows_limit(mut self, limit: usize) -> Self {
        self.rows_limit = Some(limit);
        self
    }

    pub fn with_end_at_blank_row(mut self, end_at_blank_row: bool) -> Self {
        self.end_at_blank_row = end_at_blank_row;
        self
    }

    /// Returns true if the text counts as a blank cell.
    pub fn is_blank(&self, text: &str) -> bool {
        text.trim().is_empty() || self.nulls.contains(text.trim())
    }
}
