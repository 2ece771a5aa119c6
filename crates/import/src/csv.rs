//! Tokenizes headered CSV exports into [`RowRecord`]s.

use std::io::Read;
use std::sync::Arc;

use crate::error::ImportError;
use crate::row::{Cell, RowRecord};

/// Picks `;` when the header line has more semicolons than commas.
pub fn detect_delimiter(data: &[u8]) -> u8 {
    let header = data.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = header.iter().filter(|b| **b == b';').count();
    let commas = header.iter().filter(|b| **b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// Reads every data row. Rows may be shorter or longer than the header;
/// blank lines are dropped.
pub fn read_rows<R: Read>(mut data: R) -> Result<Vec<RowRecord>, ImportError> {
    let mut buf = Vec::new();
    data.read_to_end(&mut buf)?;
    let delimiter = detect_delimiter(&buf);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(buf.as_slice());

    let headers: Arc<[String]> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect::<Vec<_>>()
        .into();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cells: Vec<Cell> = record.iter().map(Cell::text).collect();
        let row = RowRecord::new(Arc::clone(&headers), cells);
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(rows)
}
