//! Credit-card statement rows (`Date`, `Lançamento`, `Categoria`, `Tipo`,
//! `Valor`) normalized into statement item drafts.

use tally_core::{Money, StatementItemDraft};

use crate::error::{ImportError, RowError};
use crate::normalize::{normalize_amount, normalize_date};
use crate::row::{Cell, RowRecord};

const DATE_FIELDS: &[&str] = &["Date", "Data"];
const LABEL_FIELDS: &[&str] = &["Lançamento", "Lancamento"];
const CATEGORY_FIELDS: &[&str] = &["Categoria"];
const KIND_FIELDS: &[&str] = &["Tipo"];
const AMOUNT_FIELDS: &[&str] = &["Valor"];

pub fn normalize_statement_row(row: &RowRecord) -> Result<StatementItemDraft, RowError> {
    let label = row
        .get_any(LABEL_FIELDS)
        .map(|c| c.as_text().into_owned())
        .ok_or(RowError::MissingLabel)?;

    let date_cell = row.get_any(DATE_FIELDS).unwrap_or(&Cell::Empty);
    let date = normalize_date(date_cell)
        .ok_or_else(|| RowError::InvalidDate(date_cell.as_text().into_owned()))?;

    let amount_cell = row.get_any(AMOUNT_FIELDS).unwrap_or(&Cell::Empty);
    let amount = match amount_cell {
        Cell::Number(n) => Money::from_f64(*n),
        Cell::Text(s) => normalize_amount(s).map(Money::from_decimal),
        Cell::Empty => None,
    }
    .ok_or_else(|| RowError::InvalidAmount(amount_cell.as_text().into_owned()))?;

    let text_of = |names: &[&str]| {
        row.get_any(names)
            .map(|c| c.as_text().into_owned())
            .unwrap_or_default()
    };

    Ok(StatementItemDraft {
        date,
        label,
        category: text_of(CATEGORY_FIELDS),
        kind: text_of(KIND_FIELDS),
        amount,
    })
}

/// Normalizes every row, discarding the ones that do not resolve. Fails only
/// when nothing usable is left.
pub fn normalize_statement_rows(rows: &[RowRecord]) -> Result<Vec<StatementItemDraft>, ImportError> {
    let drafts: Vec<StatementItemDraft> = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| match normalize_statement_row(row) {
            Ok(draft) => Some(draft),
            Err(reason) => {
                tracing::debug!(row = index + 1, %reason, "discarding statement row");
                None
            }
        })
        .collect();

    if drafts.is_empty() {
        return Err(ImportError::NoValidStatementItems);
    }

    Ok(drafts)
}
