//! # Table Module
//!
//! Decodes a named table region of a [`Document`](crate::spreadsheet::Document) into
//! typed records. The pipeline resolves the table's range, maps header text to
//! schema fields, coerces every cell to its field type and validates each row,
//! collecting problems as [`Diagnostic`]s instead of failing.
mod coerce;
mod decoder;
mod field;
mod mapper;
mod options;
pub(crate) mod range;
mod result;
mod validator;

pub use coerce::coerce;
pub use decoder::decode_table;
pub use decoder::decode_table_with_options;
pub use decoder::DecodeError;
pub use field::Constraint;
pub use field::EnumType;
pub use field::Field;
pub use field::FieldType;
pub use field::FieldValue;
pub use field::Record;
pub use field::Schema;
pub use field::Value;
pub use field::ValueKind;
pub use field::Violation;
pub use mapper::FieldMap;
pub use mapper::HeaderPlan;
pub use mapper::PlannedColumn;
pub use options::DecodeOptions;
pub use range::parse_range;
pub use range::RangeError;
pub use range::TableRange;
pub use result::Diagnostic;
pub use result::ParsedRow;
pub use result::TableResult;
pub use validator::RowValidator;
