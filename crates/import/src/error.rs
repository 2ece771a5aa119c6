use thiserror::Error;

/// Failures that reject a whole import call.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("Workbook has no worksheets")]
    NoWorksheet,
    #[error("No data rows")]
    EmptyInput,
    #[error("Expected the two party share columns at positions 6 and 7, found {found} columns")]
    MissingShareColumns { found: usize },
    #[error("No valid statement items")]
    NoValidStatementItems,
}

/// Why a single row was skipped. Never escapes the row loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("Invalid cost: {0}")]
    InvalidCost(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Empty description")]
    EmptyDescription,
    #[error("Missing statement label")]
    MissingLabel,
    #[error("Invalid share in column {column}: {value}")]
    InvalidShare { column: usize, value: String },
    #[error("Already recorded")]
    Duplicate,
}
