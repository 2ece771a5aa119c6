use std::io::Read;
use std::path::Path;

use crate::error::ImportError;
use crate::row::RowRecord;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// How an uploaded file is tokenized, decided by its extension. Anything
/// that is not a known workbook format is read as CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
}

impl SourceFormat {
    pub fn from_file_name(name: &str) -> Self {
        let is_workbook = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SPREADSHEET_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)));
        if is_workbook {
            SourceFormat::Spreadsheet
        } else {
            SourceFormat::Csv
        }
    }

    pub fn read_rows<R: Read>(self, data: R) -> Result<Vec<RowRecord>, ImportError> {
        match self {
            SourceFormat::Csv => crate::csv::read_rows(data),
            SourceFormat::Spreadsheet => crate::xlsx::read_rows(data),
        }
    }
}
