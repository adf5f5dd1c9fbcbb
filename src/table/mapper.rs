//! Header to field mapping.
use crate::table::field::Field;
use std::collections::HashMap;

/// Case-insensitive lookup from declared column names to field positions in a schema.
#[derive(Clone, Debug, Default)]
pub struct FieldMap {
    columns: HashMap<String, usize>,
}

impl FieldMap {
    /// Builds the map from schema fields in declaration order. When two fields
    /// declare the same column name the later one wins.
    pub fn new<R>(fields: &[Field<R>]) -> Self {
        let mut columns = HashMap::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            if let Some(previous) = columns.insert(field.column_name().to_lowercase(), index) {
                tracing::debug!(
                    column = field.column_name(),
                    replaced = fields[previous].name(),
                    field = field.name(),
                    "column declared by several fields; the later field wins"
                );
            }
        }
        FieldMap { columns }
    }

    /// Field position for a header, exact match ignoring case.
    pub fn lookup(&self, header: &str) -> Option<usize> {
        self.columns.get(&header.to_lowercase()).copied()
    }

    /// Resolves header texts (already trimmed) into a plan. `first_column` is the
    /// 1-based column number of the first header.
    pub fn plan(&self, first_column: usize, headers: Vec<String>) -> HeaderPlan {
        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(offset, header)| PlannedColumn {
                column: first_column + offset,
                field: self.lookup(&header),
                header,
            })
            .collect();
        HeaderPlan { columns }
    }
}

/// One column of a table region and the field it feeds, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedColumn {
    /// 1-based column number in the sheet
    pub column: usize,
    pub header: String,
    /// Position of the bound field in the schema
    pub field: Option<usize>,
}

/// The column-to-field plan for one table, one entry per column of the range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderPlan {
    columns: Vec<PlannedColumn>,
}

impl HeaderPlan {
    pub fn columns(&self) -> &[PlannedColumn] {
        &self.columns
    }

    /// Number of columns bound to a field.
    pub fn mapped(&self) -> usize {
        self.columns.iter().filter(|column| column.field.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
