use crate::spreadsheet::Document;
use crate::spreadsheet::SheetId;
use crate::table::coerce::coerce;
use crate::table::field::Record;
use crate::table::mapper::FieldMap;
use crate::table::mapper::HeaderPlan;
use crate::table::options::DecodeOptions;
use crate::table::range::parse_range;
use crate::table::range::RangeError;
use crate::table::range::TableRange;
use crate::table::result::Diagnostic;
use crate::table::result::TableResult;
use crate::table::validator::validate;
use crate::table::validator::RowValidator;
use thiserror::Error;

/// Failures that end a decode call before any row is read. They are reported
/// as a single diagnostic without row number.
#[derive(Error, Debug, PartialEq)]
pub enum DecodeError {
    #[error("Sheet '{0}' was not found in the workbook.")]
    SheetNotFound(String),

    #[error("No table was found in sheet '{0}'.")]
    NoTable(String),

    #[error("Table '{table}' was not found in sheet '{sheet}'.")]
    TableNotFound { table: String, sheet: String },

    #[error("Table '{table}' in sheet '{sheet}' has an invalid range: {source}")]
    InvalidRange {
        table: String,
        sheet: String,
        source: RangeError,
    },
}

/// The table region a decode call works on.
struct Region {
    sheet: SheetId,
    range: TableRange,
    /// Last data row, totals rows excluded
    last_row: usize,
}

/// Decodes the rows of a table region into records of type `R`.
///
/// `table_name` selects the table by display name (or internal name); without
/// it the first table declared on the sheet is used. The optional `validator`
/// is called for every decoded row after the built-in checks.
///
/// Never fails: a missing sheet or table, or a malformed range, yields a result
/// with no rows and one diagnostic. Calls against the same document must be
/// issued sequentially unless the document supports concurrent reads.
pub fn decode_table<R, D>(
    document: &D,
    sheet_name: &str,
    table_name: Option<&str>,
    validator: Option<RowValidator<'_, R>>,
) -> TableResult<R>
where
    R: Record,
    D: Document + ?Sized,
{
    decode_table_with_options(document, sheet_name, table_name, validator, &DecodeOptions::default())
}

/// [`decode_table`] with explicit scan options.
pub fn decode_table_with_options<R, D>(
    document: &D,
    sheet_name: &str,
    table_name: Option<&str>,
    validator: Option<RowValidator<'_, R>>,
    options: &DecodeOptions,
) -> TableResult<R>
where
    R: Record,
    D: Document + ?Sized,
{
    match locate(document, sheet_name, table_name) {
        Ok(region) => decode_rows(document, &region, validator, options),
        Err(error) => {
            tracing::warn!(sheet = sheet_name, table = ?table_name, %error, "table decoding aborted");
            TableResult::failed(Diagnostic::table(error.to_string()))
        }
    }
}

/// Resolves sheet, table and range.
fn locate<D: Document + ?Sized>(document: &D, sheet_name: &str, table_name: Option<&str>) -> Result<Region, DecodeError> {
    let sheet = document
        .find_sheet(sheet_name)
        .ok_or_else(|| DecodeError::SheetNotFound(sheet_name.to_owned()))?;
    let table = document.find_table(sheet, table_name).ok_or_else(|| match table_name {
        Some(table) => DecodeError::TableNotFound {
            table: table.to_owned(),
            sheet: sheet_name.to_owned(),
        },
        None => DecodeError::NoTable(sheet_name.to_owned()),
    })?;
    let range = parse_range(&table.reference).map_err(|source| DecodeError::InvalidRange {
        table: table.display_name.clone(),
        sheet: sheet_name.to_owned(),
        source,
    })?;
    tracing::debug!(
        sheet = sheet_name,
        table = %table.display_name,
        reference = %table.reference,
        totals = table.totals_row_count,
        "table located"
    );
    Ok(Region {
        sheet,
        range,
        last_row: range.row_end.saturating_sub(table.totals_row_count),
    })
}

/// Reads the header row and resolves it against the schema.
fn read_headers<D: Document + ?Sized>(document: &D, region: &Region, map: &FieldMap) -> HeaderPlan {
    let TableRange { col_start, col_end, row_start, .. } = region.range;
    if !document.row_exists(region.sheet, row_start) {
        tracing::warn!(row = row_start, "header row is absent; no column will be mapped");
    }
    let headers = (col_start..=col_end)
        .map(|column| document.cell_text(region.sheet, row_start, column).trim().to_owned())
        .collect();
    let plan = map.plan(col_start, headers);
    tracing::debug!(columns = plan.len(), mapped = plan.mapped(), "header plan built");
    plan
}

fn decode_rows<R: Record, D: Document + ?Sized>(
    document: &D,
    region: &Region,
    validator: Option<RowValidator<'_, R>>,
    options: &DecodeOptions,
) -> TableResult<R> {
    let schema = R::schema();
    let fields = schema.fields();
    let plan = read_headers(document, region, &FieldMap::new(fields));

    let mut result = TableResult::new();
    let mut decoded = 0usize;
    for row in (region.range.row_start + 1)..=region.last_row {
        if options.rows_limit.is_some_and(|limit| decoded >= limit) {
            tracing::debug!(row, "rows limit reached");
            break;
        }
        let texts: Vec<String> = if document.row_exists(region.sheet, row) {
            plan.columns()
                .iter()
                .map(|planned| document.cell_text(region.sheet, row, planned.column))
                .collect()
        } else {
            Vec::new()
        };
        if texts.iter().all(|text| options.is_blank(text)) {
            if options.end_at_blank_row {
                tracing::debug!(row, "blank row ends the table");
                break;
            }
            tracing::debug!(row, "skipping blank row");
            continue;
        }
        decoded += 1;

        let mut record = R::default();
        let mut diagnostics = Vec::new();
        for (planned, text) in plan.columns().iter().zip(&texts) {
            let Some(index) = planned.field else {
                continue;
            };
            let field = &fields[index];
            let text = if options.is_blank(text) { "" } else { text.as_str() };
            let (value, error) = coerce(text, &field.field_type());
            let value = if error.is_some() || text.trim().is_empty() {
                field.zero_value()
            } else {
                value
            };
            field.assign(&mut record, value);
            if let Some(message) = error {
                diagnostics.push(
                    Diagnostic::row(row, message)
                        .with_column(&planned.header)
                        .with_field(field.name())
                        .with_raw_value(text),
                );
            }
        }
        diagnostics.extend(validate(&schema, &record, row, validator));
        result.push(row, record, diagnostics);
    }

    tracing::info!(
        rows = result.rows().len(),
        valid = result.valid_rows().count(),
        diagnostics = result.diagnostics().len(),
        "table decoded"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::TableDefinition;
    use crate::spreadsheet::Workbook;
    use crate::table::field::Schema;
    use crate::table::field::Violation;

    #[derive(Debug, Default, PartialEq)]
    struct Item {
        name: String,
        qty: i64,
    }

    impl Record for Item {
        fn schema() -> Schema<Self> {
            Schema::new()
                .field(crate::field!(Item, name).column("Name").required())
                .field(crate::field!(Item, qty).column("Qty"))
        }
    }

    fn items() -> Workbook {
        Workbook::builder()
            .sheet("Items", |sheet| {
                sheet
                    .row(1, ["Name", "Qty"])
                    .row(2, ["Widget", "5"])
                    .row(3, ["", ""])
                    .row(4, ["Gadget", "abc"])
                    .table("t_items", "A1:B4")
            })
            .build()
    }

    #[test]
    fn decode_items_table() {
        let result = decode_table::<Item, _>(&items(), "Items", Some("t_items"), None);

        assert_eq!(result.rows().len(), 2);
        let widget = &result.rows()[0];
        assert_eq!(widget.row_number, 2);
        assert!(widget.is_valid);
        assert_eq!(
            widget.record,
            Item {
                name: "Widget".to_owned(),
                qty: 5
            }
        );

        let gadget = &result.rows()[1];
        assert_eq!(gadget.row_number, 4);
        assert!(!gadget.is_valid);
        assert_eq!(gadget.record.qty, 0);
        assert_eq!(
            result.diagnostics(),
            &[Diagnostic::row(4, "Cannot convert 'abc' to i64")
                .with_column("Qty")
                .with_field("qty")
                .with_raw_value("abc")]
        );
    }

    #[test]
    fn missing_sheet_is_a_single_rowless_diagnostic() {
        let result = decode_table::<Item, _>(&items(), "Stock", Some("t_items"), None);
        assert!(result.rows().is_empty());
        assert_eq!(result.diagnostics().len(), 1);
        assert_eq!(result.diagnostics()[0].row, None);
        assert_eq!(result.diagnostics()[0].message, "Sheet 'Stock' was not found in the workbook.");
    }

    #[test]
    fn missing_table_messages() {
        let workbook = items();
        let result = decode_table::<Item, _>(&workbook, "Items", Some("t_orders"), None);
        assert_eq!(
            result.diagnostics(),
            &[Diagnostic::table("Table 't_orders' was not found in sheet 'Items'.")]
        );

        let bare = Workbook::builder().sheet("Items", |sheet| sheet.row(1, ["Name"])).build();
        let result = decode_table::<Item, _>(&bare, "Items", None, None);
        assert_eq!(result.diagnostics(), &[Diagnostic::table("No table was found in sheet 'Items'.")]);
    }

    #[test]
    fn malformed_range_is_a_single_rowless_diagnostic() {
        let workbook = Workbook::builder()
            .sheet("Items", |sheet| sheet.row(1, ["Name"]).table("t_items", "A1"))
            .build();
        let result = decode_table::<Item, _>(&workbook, "Items", None, None);
        assert!(result.rows().is_empty());
        assert_eq!(
            result.diagnostics()[0].message,
            "Table 't_items' in sheet 'Items' has an invalid range: Invalid range format 'A1'"
        );
    }

    #[test]
    fn required_field_is_reported() {
        let workbook = Workbook::builder()
            .sheet("Items", |sheet| {
                sheet
                    .row(1, ["Name", "Qty"])
                    .row(2, ["", "7"])
                    .table("t_items", "A1:B2")
            })
            .build();
        let result = decode_table::<Item, _>(&workbook, "Items", None, None);
        assert_eq!(result.rows().len(), 1);
        assert_eq!(result.rows()[0].record.qty, 7);
        assert_eq!(
            result.diagnostics(),
            &[Diagnostic::row(2, "The name field is required.").with_field("name")]
        );
    }

    #[test]
    fn absent_rows_and_unmapped_columns_are_ignored() {
        let workbook = Workbook::builder()
            .sheet("Items", |sheet| {
                sheet
                    .row(2, ["notes", "name", "QTY"])
                    .row(3, ["only a note", "", ""])
                    .row(6, ["", "Bolt", "12"])
                    .table("t_items", "A2:C7")
            })
            .build();
        let result = decode_table::<Item, _>(&workbook, "Items", None, None);

        assert_eq!(result.rows().iter().map(|row| row.row_number).collect::<Vec<_>>(), vec![3, 6]);
        assert_eq!(result.rows()[1].record, Item { name: "Bolt".to_owned(), qty: 12 });
        // Row 3 carries text only in the unmapped column, so the name is missing.
        assert_eq!(result.diagnostics_for_row(3).count(), 1);
        assert!(result.rows()[1].is_valid);
    }

    #[test]
    fn custom_validator_messages_carry_row_only() {
        let validator = |item: &Item, _row: usize| {
            if item.qty > 3 {
                vec![format!("Quantity {} exceeds stock.", item.qty)]
            } else {
                Vec::new()
            }
        };
        let result = decode_table::<Item, _>(&items(), "Items", Some("t_items"), Some(&validator));
        assert_eq!(result.diagnostics()[0], Diagnostic::row(2, "Quantity 5 exceeds stock."));
        assert_eq!(result.valid_rows().count(), 0);
    }

    #[test]
    fn totals_rows_are_excluded() {
        let workbook = Workbook::builder()
            .sheet("Items", |sheet| {
                sheet
                    .row(1, ["Name", "Qty"])
                    .row(2, ["Widget", "5"])
                    .row(3, ["Total", "5"])
                    .add_table(TableDefinition::new("t_items", "A1:B3").with_totals_row_count(1))
            })
            .build();
        let result = decode_table::<Item, _>(&workbook, "Items", None, None);
        assert_eq!(result.into_records(), vec![Item { name: "Widget".to_owned(), qty: 5 }]);
    }

    #[test]
    fn options_control_the_scan() {
        let workbook = Workbook::builder()
            .sheet("Items", |sheet| {
                sheet
                    .row(1, ["Name", "Qty"])
                    .row(2, ["Widget", "N/A"])
                    .row(3, ["N/A", "N/A"])
                    .row(4, ["Gadget", "2"])
                    .row(5, ["Gizmo", "3"])
                    .table("t_items", "A1:B5")
            })
            .build();

        let options = DecodeOptions::new().with_nulls(["N/A"]);
        let result = decode_table_with_options::<Item, _>(&workbook, "Items", None, None, &options);
        assert_eq!(result.rows().iter().map(|row| row.row_number).collect::<Vec<_>>(), vec![2, 4, 5]);
        assert!(result.is_success());

        let options = DecodeOptions::new().with_nulls(["N/A"]).with_end_at_blank_row(true);
        let result = decode_table_with_options::<Item, _>(&workbook, "Items", None, None, &options);
        assert_eq!(result.rows().len(), 1);

        let options = DecodeOptions::new().with_rows_limit(2);
        let result = decode_table_with_options::<Item, _>(&workbook, "Items", None, None, &options);
        assert_eq!(result.rows().iter().map(|row| row.row_number).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[derive(Debug, Default, PartialEq)]
    enum Priority {
        Low,
        #[default]
        Normal,
        High,
    }

    crate::enum_field!(Priority { Low, Normal, High });

    #[derive(Debug, Default)]
    struct Ticket {
        title: String,
        priority: Priority,
    }

    impl Record for Ticket {
        fn schema() -> Schema<Self> {
            Schema::new()
                .field(crate::field!(Ticket, title).column("Title"))
                .field(crate::field!(Ticket, priority).column("Priority"))
        }
    }

    #[test]
    fn blank_and_unconvertible_enum_cells_take_the_default_member() {
        let workbook = Workbook::builder()
            .sheet("Tickets", |sheet| {
                sheet
                    .row(1, ["Title", "Priority"])
                    .row(2, ["Printer jam", "high"])
                    .row(3, ["Login fails", ""])
                    .row(4, ["Slow VPN", "Urgent"])
                    .table("tickets", "A1:B4")
            })
            .build();
        let result = decode_table::<Ticket, _>(&workbook, "Tickets", Some("tickets"), None);

        let priorities: Vec<&Priority> = result.records().map(|ticket| &ticket.priority).collect();
        assert_eq!(priorities, vec![&Priority::High, &Priority::Normal, &Priority::Normal]);
        assert_eq!(
            result.diagnostics(),
            &[Diagnostic::row(4, "Cannot convert 'Urgent' to Priority")
                .with_column("Priority")
                .with_field("priority")
                .with_raw_value("Urgent")]
        );
        assert_eq!(result.valid_rows().count(), 2);
    }

    #[derive(Debug, Default)]
    struct Shipment {
        origin: String,
        destination: String,
    }

    impl Record for Shipment {
        fn schema() -> Schema<Self> {
            Schema::new()
                .field(crate::field!(Shipment, origin).column("From"))
                .field(crate::field!(Shipment, destination).column("To"))
        }

        fn validate(&self) -> Vec<Violation> {
            if self.origin.eq_ignore_ascii_case(&self.destination) {
                vec![Violation::record("Origin and destination must differ.")]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn record_rules_are_reported() {
        let workbook = Workbook::builder()
            .sheet("Routes", |sheet| {
                sheet
                    .row(1, ["From", "To"])
                    .row(2, ["Leeds", "York"])
                    .row(3, ["Hull", "hull"])
                    .table("routes", "A1:B3")
            })
            .build();
        let result = decode_table::<Shipment, _>(&workbook, "Routes", Some("routes"), None);
        assert_eq!(
            result.diagnostics(),
            &[Diagnostic::row(3, "Origin and destination must differ.")]
        );
    }
}
