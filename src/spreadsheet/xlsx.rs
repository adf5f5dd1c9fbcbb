use crate::error::ResultMessage;
use crate::error::RustyTableError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::helpers::xml::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::TableDefinition;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

// XML local tag names for parsing SpreadsheetML parts
const TAG_CUSTOM_FORMATS: &[u8] = b"numFmts"; // Custom number formats container
const TAG_CUSTOM_FORMAT: &[u8] = b"numFmt"; // Individual custom number format
const TAG_FORMAT_INDEXES: &[u8] = b"cellXfs"; // Cell format indexes container
const TAG_FORMAT_INDEX: &[u8] = b"xf"; // Individual cell format index
const TAG_SHARED_STRING_ITEM: &[u8] = b"si"; // Shared string table item
const TAG_PHONETIC_TEXT: &[u8] = b"rPh"; // Phonetic text for Asian languages
const TAG_TEXT: &[u8] = b"t"; // Text content within strings
const TAG_WORKBOOK_PROPERTIES: &[u8] = b"workbookPr"; // Workbook properties
const TAG_SHEET: &[u8] = b"sheet"; // Worksheet definition
const TAG_ROW: &[u8] = b"row"; // Row in worksheet
const TAG_CELL: &[u8] = b"c"; // Cell in worksheet
const TAG_INLINE_STRING: &[u8] = b"is"; // Inline string value
const TAG_VALUE: &[u8] = b"v"; // Cell value content
const TAG_TABLE_PART: &[u8] = b"tablePart"; // Reference to a table definition part
const TAG_TABLE: &[u8] = b"table"; // Table definition root

/// Lookup tables shared by every worksheet of a package
struct PackageContext {
    /// Cell type of each style index
    number_formats: Vec<CellType>,
    /// Shared string table, in index order
    shared_strings: Vec<String>,
}

/// Loads every worksheet of an XLSX/XLSM package, with its cells and table definitions
///
/// # Arguments
/// * `file_name` - Name of the package, used in error messages
/// * `reader` - Package source
///
/// # Returns
/// Sheets in workbook order
pub(crate) fn load(file_name: &str, reader: UnifiedReader) -> Result<Vec<Sheet>, RustyTableError> {
    let mut zip = ZipArchive::new(reader)?;
    let (sheet_parts, is_1904) = load_workbook(&mut zip).with_prefix("Load workbook")?;
    if sheet_parts.is_empty() {
        Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?
    }

    let context = PackageContext {
        number_formats: load_number_formats(&mut zip, is_1904).with_prefix("Load styles")?,
        shared_strings: load_shared_strings(&mut zip).with_prefix("Load shared strings")?,
    };
    tracing::debug!(
        file = file_name,
        sheets = sheet_parts.len(),
        shared_strings = context.shared_strings.len(),
        styles = context.number_formats.len(),
        is_1904,
        "workbook parts loaded"
    );

    let mut sheets = Vec::with_capacity(sheet_parts.len());
    for (sheet_name, zip_path) in &sheet_parts {
        let prefix = format!("Load sheet '{sheet_name}'");
        let (mut sheet, table_ids) = read_sheet(&mut zip, &context, sheet_name, zip_path).with_prefix(&prefix)?;
        sheet.tables = load_tables(&mut zip, zip_path, &table_ids).with_prefix(&prefix)?;
        tracing::debug!(
            sheet = %sheet.name,
            cells = sheet.cells.len(),
            tables = sheet.tables.len(),
            "worksheet loaded"
        );
        sheets.push(sheet);
    }
    Ok(sheets)
}

/// Loads workbook structure and worksheet information
///
/// Parses `xl/workbook.xml` to extract worksheet names and their part paths, and
/// determines the date system (1900 vs 1904) used in the file.
///
/// # Returns
/// Tuple of (worksheets, is_1904_date_system) where worksheets are (name, zip_path) pairs
fn load_workbook<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<(Vec<(String, String)>, bool), RustyTableError> {
    let relationships = load_relationships(zip, "xl/workbook.xml", excel::WORKSHEET_RELATIONSHIP)?
        .ok_or_else(|| SpreadsheetError::FileError("xl/_rels/workbook.xml.rels".to_string()))?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq_ignore_ascii_case("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads number formats and cell styles from `xl/styles.xml`
///
/// Parses custom number formats and cell style indexes to determine
/// which numeric cells hold dates, times or date-times.
///
/// # Returns
/// Vector of CellType values indexed by style ID
fn load_number_formats<RS: Read + Seek>(zip: &mut ZipArchive<RS>, is_1904: bool) -> Result<Vec<CellType>, RustyTableError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut has_custom_formats = false;
    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();

    let mut has_format_indexes = false;
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if !custom_formats_context && event.local_name().as_ref() == TAG_CUSTOM_FORMATS => {
            has_custom_formats = true;
            custom_formats_context = true;
        }
        Event::End(event) if custom_formats_context && event.local_name().as_ref() == TAG_CUSTOM_FORMATS => {
            custom_formats_context = false;
            if has_custom_formats && has_format_indexes {
                break;
            }
        }
        Event::Start(event) if custom_formats_context && event.local_name().as_ref() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                let style = CellType::parse_custom_number_format(&format, is_1904);
                custom_formats.insert(id.to_string(), style);
            }
        }

        Event::Start(event) if !format_indexes_context && event.local_name().as_ref() == TAG_FORMAT_INDEXES => {
            has_format_indexes = true;
            format_indexes_context = true;
        }
        Event::End(event) if format_indexes_context && event.local_name().as_ref() == TAG_FORMAT_INDEXES => {
            format_indexes_context = false;
            if has_custom_formats && has_format_indexes {
                break;
            }
        }
        Event::Start(event) if format_indexes_context && event.local_name().as_ref() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?
                .map(|id| id.to_string())
                .unwrap_or_else(|| String::from("0"));
            format_indexes.push(id);
        }
    });

    Ok(excel::load_number_formats(format_indexes, custom_formats, is_1904))
}

/// Loads the shared string table; a package without one has no shared strings
fn load_shared_strings<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Vec<String>, RustyTableError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_SHARED_STRING_ITEM => {
            let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
            shared_strings.push(string);
        }
    });
    Ok(shared_strings)
}

/// Reads every stored row and cell of a worksheet
///
/// Shared string references are resolved while reading, so stored cells carry
/// their final text. Rows are recorded even when they hold no cells.
///
/// # Returns
/// The sheet and the relationship ids of its table parts, in declaration order
fn read_sheet<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    context: &PackageContext,
    sheet_name: &str,
    zip_path: &str,
) -> Result<(Sheet, Vec<String>), RustyTableError> {
    let mut sheet = Sheet::new(sheet_name);
    let mut table_ids = Vec::<String>::new();
    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut kind = CellType::default();
    let mut value = String::new();
    let mut reader = zip.xml_reader(zip_path)?
        .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_ROW => {
            row_count = event.parse_attribute_value::<usize>("r")?
                .and_then(|row| row.checked_sub(1))
                .unwrap_or(row_count);
            col_count = 0;
            sheet.mark_row(row_count);
        }
        Event::End(event) if event.local_name().as_ref() == TAG_ROW => {
            row_count += 1;
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_CELL => {
            (row, col) = event.get_attribute_value("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row_count, col_count));
            col_count = col + 1;
            value.clear();
            kind = event.get_attribute_value("t")?.map(|t| {
                match t.as_ref() {
                    "inlineStr" | "str" => CellType::InlineString,
                    "s" => CellType::SharedString,
                    "d" => CellType::IsoDateTime,
                    "b" => CellType::Boolean,
                    "e" => CellType::Error,
                    _ => CellType::Number,
                }
            }).unwrap_or(CellType::Number);
            if kind == CellType::Number {
                if let Some(format_id) = event.get_attribute_value("s")? {
                    if !format_id.is_empty() {
                        let index = format_id.parse::<usize>()?;
                        kind = context.number_formats.get(index).copied().unwrap_or(CellType::Number);
                    }
                }
            }
        }
        Event::Start(event) if kind != CellType::Empty && event.local_name().as_ref() == TAG_INLINE_STRING => {
            value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
        }
        Event::Start(event) if kind != CellType::Empty && event.local_name().as_ref() == TAG_VALUE => {
            value = read_string_value(&mut reader, TAG_VALUE, true)?;
        }
        Event::End(event) if event.local_name().as_ref() == TAG_CELL => {
            if kind != CellType::Empty && !value.is_empty() {
                if kind == CellType::SharedString {
                    let index = value.trim().parse::<usize>()?;
                    value = context.shared_strings
                        .get(index)
                        .cloned()
                        .ok_or_else(|| SpreadsheetError::SharedStringIndexError(index_to_reference(row, col), index))?;
                }
                sheet.push(Cell {
                    row,
                    col,
                    kind,
                    value: std::mem::take(&mut value),
                });
            }
            kind = CellType::Empty;
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_TABLE_PART => {
            for result in event.attributes() {
                let attribute = result?;
                if attribute.key.local_name().as_ref() == b"id" {
                    table_ids.push(attribute.get_value()?.to_string());
                }
            }
        }
    });
    Ok((sheet, table_ids))
}

/// Loads the table definitions attached to a worksheet, in `tableParts` order
fn load_tables<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    zip_path: &str,
    table_ids: &[String],
) -> Result<Vec<TableDefinition>, RustyTableError> {
    if table_ids.is_empty() {
        return Ok(Vec::new());
    }
    let relationships = load_relationships(zip, zip_path, excel::TABLE_RELATIONSHIP)?.unwrap_or_default();
    let mut tables = Vec::with_capacity(table_ids.len());
    for id in table_ids {
        match relationships.get(id) {
            Some(path) => tables.extend(read_table(zip, path)?),
            None => tracing::warn!(sheet_part = zip_path, id = %id, "table part relationship not found"),
        }
    }
    Ok(tables)
}

/// Reads the root element of a table definition part
fn read_table<RS: Read + Seek>(zip: &mut ZipArchive<RS>, path: &str) -> Result<Option<TableDefinition>, RustyTableError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_owned()))?;
    let mut table = None::<TableDefinition>;
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_TABLE => {
            let name = event.get_attribute_value("name")?.map(|name| name.to_string());
            let display_name = event.get_attribute_value("displayName")?.map(|name| name.to_string());
            let reference = event.get_attribute_value("ref")?.map(|reference| reference.to_string());
            let totals_row_count = event.parse_attribute_value::<usize>("totalsRowCount")?.unwrap_or(0);
            if let Some(reference) = reference {
                let display_name = display_name.or_else(|| name.clone()).unwrap_or_default();
                table = Some(TableDefinition {
                    name: name.unwrap_or_else(|| display_name.clone()),
                    display_name,
                    reference,
                    totals_row_count,
                });
            }
            break;
        }
    });
    Ok(table)
}

/// Reads string value from XML content, handling text and CDATA sections
///
/// Extracts string content up to `end_tag`, skipping phonetic text annotations.
/// Rich text runs are concatenated.
///
/// # Arguments
/// * `reader` - XML reader positioned just after the start tag
/// * `end_tag` - Local name of the element that ends the string content
/// * `is_text_content` - Whether text directly inside the element counts
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: &[u8],
    is_text_content: bool,
) -> Result<String, RustyTableError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.local_name().as_ref() == end_tag => break,
        Event::Start(event) if event.local_name().as_ref() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.local_name().as_ref() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.local_name().as_ref() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.local_name().as_ref() == TAG_TEXT => is_text = is_text_content,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
