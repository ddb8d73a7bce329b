use rust_xlsxwriter::{Format, Workbook};
use rusqlite::types::Value;

use crate::models::VisitRecord;
use crate::schema::{export_columns, record_values};

use super::ExportError;

pub const SHEET_NAME: &str = "GBV Records";

/// Most characters an XLSX cell can hold.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Cut `text` to what fits in one cell. Rows written before length checks
/// existed may hold longer values; those are truncated rather than failing
/// the whole export.
fn fit_cell(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

/// Render records as an XLSX workbook with a single `GBV Records` sheet.
///
/// Integer and decimal columns are written as numbers; blank cells stay
/// empty. Text longer than a cell allows is truncated. The header row is
/// bold and frozen.
pub fn to_spreadsheet(records: &[VisitRecord]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, name) in (0u16..).zip(export_columns().iter()) {
        worksheet.write_string_with_format(0, col, name, &header_format)?;
    }

    for (row, record) in (1u32..).zip(records) {
        for (col, value) in (0u16..).zip(record_values(record).iter()) {
            match value {
                Value::Null | Value::Blob(_) => {}
                Value::Integer(i) => {
                    worksheet.write_number(row, col, *i as f64)?;
                }
                Value::Real(r) => {
                    worksheet.write_number(row, col, *r)?;
                }
                Value::Text(s) => {
                    worksheet.write_string(row, col, fit_cell(s))?;
                }
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();

    let bytes = workbook.save_to_buffer()?;
    Ok(bytes)
}
