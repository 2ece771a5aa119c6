//! Reads the first worksheet of a spreadsheet workbook (xlsx, xls, xlsb,
//! ods) into [`RowRecord`]s. The first row holds the headers.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::error::ImportError;
use crate::row::{Cell, RowRecord};

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        // Date-formatted cells keep their serial; the date parsers decode it.
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
    }
}

pub fn read_rows<R: Read>(mut data: R) -> Result<Vec<RowRecord>, ImportError> {
    let mut buf = Vec::new();
    data.read_to_end(&mut buf)?;

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(buf))?;
    let range = workbook.worksheet_range_at(0).ok_or(ImportError::NoWorksheet)??;

    let mut lines = range.rows();
    let Some(header_line) = lines.next() else {
        return Ok(Vec::new());
    };
    let headers: Arc<[String]> = header_line
        .iter()
        .map(|h| h.to_string().trim().to_string())
        .collect::<Vec<_>>()
        .into();

    let rows = lines
        .map(|line| RowRecord::new(Arc::clone(&headers), line.iter().map(to_cell).collect()))
        .filter(|row| !row.is_empty())
        .collect();

    Ok(rows)
}
