use crate::models::VisitRecord;
use crate::schema::{display_value, export_columns, record_values};

use super::ExportError;

/// Render records as CSV: one header row, then one row per record in order.
pub fn to_csv(records: &[VisitRecord]) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(export_columns())?;
    for record in records {
        wtr.write_record(record_values(record).iter().map(display_value))?;
    }
    wtr.flush()?;
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(bytes)
}
