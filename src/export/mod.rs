//! Report exports: CSV, XLSX spreadsheet and print-formatted HTML.
//!
//! All renderers are pure functions over a slice of records. An empty slice
//! produces a header-only file, never an error.

mod csv_writer;
mod print;
mod spreadsheet;

pub use csv_writer::to_csv;
pub use print::{escape_html, to_print_document, PrintContext};
pub use spreadsheet::{to_spreadsheet, SHEET_NAME};

use chrono::NaiveDate;
use thiserror::Error;

use crate::report::ReportPeriod;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet export failed: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("Export I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Downloadable export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Spreadsheet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Spreadsheet => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// `gbv_report_<period>_<YYYYMMDD>.<ext>`
pub fn export_file_name(format: ExportFormat, period: ReportPeriod, date: NaiveDate) -> String {
    format!(
        "gbv_report_{}_{}.{}",
        period.as_str(),
        date.format("%Y%m%d"),
        format.extension()
    )
}
