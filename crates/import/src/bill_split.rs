//! Bill-splitting exports: one row per shared cost, with a signed column per
//! participant saying who paid and who owes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;
use tally_core::{DateRange, Expense, Money, NewExpense, Origin, UploadId};

use crate::error::{ImportError, RowError};
use crate::normalize::normalize_date;
use crate::row::{Cell, RowRecord};

pub const DATE_COLUMN: usize = 0;
pub const DESCRIPTION_COLUMN: usize = 1;
pub const CATEGORY_COLUMN: usize = 2;
pub const COST_COLUMN: usize = 3;
pub const CURRENCY_COLUMN: usize = 4;
/// Party share columns are identified by position; their headers are the
/// participants' names and differ from file to file.
pub const PARTY_A_COLUMN: usize = 5;
pub const PARTY_B_COLUMN: usize = 6;

pub const DEFAULT_SUMMARY_SENTINEL: &str = "Total balance";

/// Typed view over a bill-split row.
#[derive(Debug, Clone, Copy)]
pub struct BillSplitRow<'a>(&'a RowRecord);

impl<'a> BillSplitRow<'a> {
    pub fn new(row: &'a RowRecord) -> Self {
        BillSplitRow(row)
    }

    fn cell(&self, index: usize) -> &'a Cell {
        self.0.get(index).unwrap_or(&Cell::Empty)
    }

    pub fn date(&self) -> &'a Cell {
        self.cell(DATE_COLUMN)
    }

    pub fn description(&self) -> String {
        self.cell(DESCRIPTION_COLUMN).as_text().into_owned()
    }

    pub fn category(&self) -> Option<String> {
        let c = self.cell(CATEGORY_COLUMN).as_text();
        (!c.is_empty()).then(|| c.into_owned())
    }

    pub fn cost(&self) -> &'a Cell {
        self.cell(COST_COLUMN)
    }

    pub fn currency(&self) -> Option<String> {
        let c = self.cell(CURRENCY_COLUMN).as_text();
        (!c.is_empty()).then(|| c.into_owned())
    }

    pub fn party_a_raw(&self) -> &'a Cell {
        self.cell(PARTY_A_COLUMN)
    }

    pub fn party_b_raw(&self) -> &'a Cell {
        self.cell(PARTY_B_COLUMN)
    }
}

/// Each party's canonical share of one expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareSplit {
    pub party_a: Money,
    pub party_b: Money,
}

/// Resolves the signed per-party columns into two shares.
///
/// A party whose column is exactly minus the total paid for everything.
/// Party A is checked before party B. Otherwise both shares are the absolute
/// values of their columns, with no check that they add up to the total.
pub fn resolve_shares(total_cost: Money, party_a_raw: Money, party_b_raw: Money) -> ShareSplit {
    if party_a_raw.is_negative() && party_a_raw.abs() == total_cost {
        ShareSplit {
            party_a: total_cost,
            party_b: Money::zero(),
        }
    } else if party_b_raw.is_negative() && party_b_raw.abs() == total_cost {
        ShareSplit {
            party_a: Money::zero(),
            party_b: total_cost,
        }
    } else {
        ShareSplit {
            party_a: party_a_raw.abs(),
            party_b: party_b_raw.abs(),
        }
    }
}

/// Identity used to recognize an expense that was already imported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub date: NaiveDate,
    pub description: String,
    pub total_cost: Money,
}

impl From<&Expense> for DedupKey {
    fn from(e: &Expense) -> Self {
        DedupKey {
            date: e.date,
            description: e.description.clone(),
            total_cost: e.total_cost,
        }
    }
}

/// What an import should write, plus how many rows were turned away.
#[derive(Debug, Clone, Default)]
pub struct BillSplitPlan {
    pub new_expenses: Vec<NewExpense>,
    pub skipped: usize,
}

pub struct BillSplitImporter {
    pub summary_sentinel: String,
    pub default_currency: String,
}

impl Default for BillSplitImporter {
    fn default() -> Self {
        Self {
            summary_sentinel: DEFAULT_SUMMARY_SENTINEL.to_string(),
            default_currency: "BRL".to_string(),
        }
    }
}

impl BillSplitImporter {
    pub fn new(summary_sentinel: &str, default_currency: &str) -> Self {
        Self {
            summary_sentinel: summary_sentinel.to_string(),
            default_currency: default_currency.to_string(),
        }
    }

    /// Drops a trailing summary row and checks the file has both share
    /// columns.
    pub fn prepare(&self, mut rows: Vec<RowRecord>) -> Result<Vec<RowRecord>, ImportError> {
        if rows.last().is_some_and(|r| self.is_summary_row(r)) {
            rows.pop();
        }

        let first = rows.first().ok_or(ImportError::EmptyInput)?;
        if first.len() <= PARTY_B_COLUMN {
            return Err(ImportError::MissingShareColumns { found: first.len() });
        }

        Ok(rows)
    }

    pub fn is_summary_row(&self, row: &RowRecord) -> bool {
        BillSplitRow::new(row)
            .description()
            .eq_ignore_ascii_case(self.summary_sentinel.trim())
    }

    /// Dates covered by the rows, so the caller can load existing expenses
    /// for the duplicate check in one query.
    pub fn date_span(&self, rows: &[RowRecord]) -> Option<DateRange> {
        DateRange::spanning(rows.iter().filter_map(|r| parse_date(BillSplitRow::new(r).date())))
    }

    /// Plans the import of `rows` against the dedup keys of expenses already
    /// in the store. Rows are handled in order, and each planned expense
    /// counts as existing for the rows after it.
    pub fn plan(
        &self,
        rows: &[RowRecord],
        mut existing: HashSet<DedupKey>,
        upload_id: UploadId,
    ) -> BillSplitPlan {
        let mut plan = BillSplitPlan::default();

        for (index, row) in rows.iter().enumerate() {
            match self.plan_row(row, &existing, upload_id) {
                Ok((key, expense)) => {
                    existing.insert(key);
                    plan.new_expenses.push(expense);
                }
                Err(reason) => {
                    tracing::debug!(row = index + 1, %reason, "skipping bill-split row");
                    plan.skipped += 1;
                }
            }
        }

        plan
    }

    fn plan_row(
        &self,
        row: &RowRecord,
        existing: &HashSet<DedupKey>,
        upload_id: UploadId,
    ) -> Result<(DedupKey, NewExpense), RowError> {
        let row = BillSplitRow::new(row);

        let total_cost = parse_money(row.cost())
            .ok_or_else(|| RowError::InvalidCost(row.cost().as_text().into_owned()))?;
        let description = row.description();
        if description.is_empty() {
            return Err(RowError::EmptyDescription);
        }
        let date = parse_date(row.date())
            .ok_or_else(|| RowError::InvalidDate(row.date().as_text().into_owned()))?;

        let key = DedupKey {
            date,
            description: description.clone(),
            total_cost,
        };
        if existing.contains(&key) {
            return Err(RowError::Duplicate);
        }

        let party_a_raw = parse_money(row.party_a_raw()).ok_or_else(|| RowError::InvalidShare {
            column: PARTY_A_COLUMN,
            value: row.party_a_raw().as_text().into_owned(),
        })?;
        let party_b_raw = parse_money(row.party_b_raw()).ok_or_else(|| RowError::InvalidShare {
            column: PARTY_B_COLUMN,
            value: row.party_b_raw().as_text().into_owned(),
        })?;
        let shares = resolve_shares(total_cost, party_a_raw, party_b_raw);

        let expense = NewExpense {
            date,
            description,
            category: row.category(),
            total_cost,
            currency: row.currency().unwrap_or_else(|| self.default_currency.clone()),
            party_a_share: shares.party_a,
            party_b_share: shares.party_b,
            origin: Origin::Imported,
            source_upload_id: Some(upload_id),
        };

        Ok((key, expense))
    }
}

/// Bill-split exports write plain decimals with a dot (`12.50`).
fn parse_money(cell: &Cell) -> Option<Money> {
    match cell {
        Cell::Number(n) => Money::from_f64(*n),
        Cell::Text(s) => Decimal::from_str(s.trim()).ok().map(Money::from_decimal),
        Cell::Empty => None,
    }
}

/// ISO dates first, then the spreadsheet encodings.
fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    if let Cell::Text(s) = cell {
        let s = s.trim();
        let day = s.get(..10).unwrap_or(s);
        if let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") {
            return Some(date);
        }
    }
    normalize_date(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn m(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    fn headers() -> Arc<[String]> {
        ["Date", "Description", "Category", "Cost", "Currency", "Ana", "Bruno"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into()
    }

    fn row(fields: &[&str]) -> RowRecord {
        RowRecord::new(headers(), fields.iter().map(|f| Cell::text(f)).collect())
    }

    fn sample_rows() -> Vec<RowRecord> {
        vec![
            row(&["2024-03-10", "Mercado", "Groceries", "100.00", "BRL", "-100.00", "0.00"]),
            row(&["2024-03-11", "Jantar", "Dining out", "80.00", "BRL", "40.00", "-40.00"]),
            row(&["2024-03-12", "Luz", "Utilities", "60.00", "BRL", "30.00", "-60.00"]),
        ]
    }

    // ── resolve_shares ────────────────────────────────────────────────────────

    #[test]
    fn party_a_paid_in_full() {
        let s = resolve_shares(m(10000), m(-10000), m(0));
        assert_eq!(s, ShareSplit { party_a: m(10000), party_b: m(0) });
    }

    #[test]
    fn party_a_rule_wins_over_fallback() {
        let s = resolve_shares(m(10000), m(-10000), m(10000));
        assert_eq!(s, ShareSplit { party_a: m(10000), party_b: m(0) });
    }

    #[test]
    fn party_a_rule_wins_when_both_paid_in_full() {
        let s = resolve_shares(m(10000), m(-10000), m(-10000));
        assert_eq!(s, ShareSplit { party_a: m(10000), party_b: m(0) });
    }

    #[test]
    fn party_b_paid_in_full() {
        let s = resolve_shares(m(6000), m(3000), m(-6000));
        assert_eq!(s, ShareSplit { party_a: m(0), party_b: m(6000) });
    }

    #[test]
    fn general_split_uses_absolute_values() {
        let s = resolve_shares(m(8000), m(4000), m(-4000));
        assert_eq!(s, ShareSplit { party_a: m(4000), party_b: m(4000) });
    }

    #[test]
    fn general_split_does_not_force_sum() {
        let s = resolve_shares(m(8000), m(1000), m(-2500));
        assert_eq!(s, ShareSplit { party_a: m(1000), party_b: m(2500) });
    }

    #[test]
    fn positive_full_amount_is_not_full_payment() {
        let s = resolve_shares(m(10000), m(10000), m(0));
        assert_eq!(s, ShareSplit { party_a: m(10000), party_b: m(0) });
        let s = resolve_shares(m(10000), m(0), m(10000));
        assert_eq!(s, ShareSplit { party_a: m(0), party_b: m(10000) });
    }

    // ── prepare ───────────────────────────────────────────────────────────────

    #[test]
    fn prepare_drops_trailing_summary_row() {
        let mut rows = sample_rows();
        rows.push(row(&["", "Total balance", "", "", "BRL", "-130.00", "130.00"]));
        let prepared = BillSplitImporter::default().prepare(rows).unwrap();
        assert_eq!(prepared.len(), 3);
    }

    #[test]
    fn prepare_matches_sentinel_case_insensitively() {
        let mut rows = sample_rows();
        rows.push(row(&["", "TOTAL BALANCE", "", "", "", "", ""]));
        assert_eq!(BillSplitImporter::default().prepare(rows).unwrap().len(), 3);
    }

    #[test]
    fn prepare_rejects_empty_input() {
        let importer = BillSplitImporter::default();
        assert!(matches!(importer.prepare(vec![]), Err(ImportError::EmptyInput)));
        let only_summary = vec![row(&["", "Total balance", "", "", "", "", ""])];
        assert!(matches!(importer.prepare(only_summary), Err(ImportError::EmptyInput)));
    }

    #[test]
    fn prepare_rejects_missing_share_columns() {
        let narrow = RowRecord::from_pairs([
            ("Date", Cell::text("2024-03-10")),
            ("Description", Cell::text("Mercado")),
            ("Category", Cell::text("Groceries")),
            ("Cost", Cell::text("10.00")),
            ("Currency", Cell::text("BRL")),
            ("Ana", Cell::text("-10.00")),
        ]);
        assert!(matches!(
            BillSplitImporter::default().prepare(vec![narrow]),
            Err(ImportError::MissingShareColumns { found: 6 })
        ));
    }

    // ── plan ──────────────────────────────────────────────────────────────────

    #[test]
    fn plan_resolves_every_valid_row() {
        let plan = BillSplitImporter::default().plan(&sample_rows(), HashSet::new(), UploadId(1));
        assert_eq!(plan.skipped, 0);
        assert_eq!(plan.new_expenses.len(), 3);

        let first = &plan.new_expenses[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(first.total_cost, m(10000));
        assert_eq!((first.party_a_share, first.party_b_share), (m(10000), m(0)));
        assert_eq!(first.origin, Origin::Imported);
        assert_eq!(first.source_upload_id, Some(UploadId(1)));
        assert_eq!(first.category.as_deref(), Some("Groceries"));

        let third = &plan.new_expenses[2];
        assert_eq!((third.party_a_share, third.party_b_share), (m(0), m(6000)));
    }

    #[test]
    fn digit_only_descriptions_are_kept_verbatim() {
        let data = "Date,Description,Category,Cost,Currency,Ana,Bruno\n\
                    2024-03-10,0042,Groceries,10.00,BRL,-10.00,10.00\n\
                    2024-03-11,12345678901234567891,Groceries,20.00,BRL,-20.00,20.00\n";
        let rows = crate::csv::read_rows(data.as_bytes()).unwrap();
        assert_eq!(BillSplitRow::new(&rows[0]).description(), "0042");

        let plan = BillSplitImporter::default().plan(&rows, HashSet::new(), UploadId(1));
        let descriptions: Vec<_> = plan.new_expenses.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, ["0042", "12345678901234567891"]);
        assert_eq!(plan.new_expenses[1].total_cost, m(2000));
    }

    #[test]
    fn plan_skips_non_numeric_cost() {
        let rows = vec![row(&["2024-03-10", "Mercado", "", "abc", "BRL", "-1", "1"])];
        let plan = BillSplitImporter::default().plan(&rows, HashSet::new(), UploadId(1));
        assert_eq!(plan.skipped, 1);
        assert!(plan.new_expenses.is_empty());
    }

    #[test]
    fn plan_skips_empty_description_and_bad_date() {
        let rows = vec![
            row(&["2024-03-10", "", "", "10.00", "BRL", "-10", "0"]),
            row(&["someday", "Cinema", "", "10.00", "BRL", "-10", "0"]),
            row(&["2024-03-10", "Cinema", "", "10.00", "BRL", "-10", "0"]),
        ];
        let plan = BillSplitImporter::default().plan(&rows, HashSet::new(), UploadId(1));
        assert_eq!(plan.skipped, 2);
        assert_eq!(plan.new_expenses.len(), 1);
    }

    #[test]
    fn plan_skips_unparseable_share() {
        let rows = vec![row(&["2024-03-10", "Cinema", "", "10.00", "BRL", "n/a", "0"])];
        let plan = BillSplitImporter::default().plan(&rows, HashSet::new(), UploadId(1));
        assert_eq!(plan.skipped, 1);
    }

    #[test]
    fn plan_skips_existing_and_repeated_rows() {
        let mut rows = sample_rows();
        rows.push(rows[1].clone());
        let existing: HashSet<DedupKey> = [DedupKey {
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            description: "Mercado".to_string(),
            total_cost: m(10000),
        }]
        .into_iter()
        .collect();

        let plan = BillSplitImporter::default().plan(&rows, existing, UploadId(2));
        assert_eq!(plan.new_expenses.len(), 2);
        assert_eq!(plan.skipped, 2);
    }

    #[test]
    fn plan_uses_default_currency_when_blank() {
        let rows = vec![row(&["2024-03-10", "Cinema", "", "10.00", "", "-10", "0"])];
        let plan = BillSplitImporter::new("Total balance", "EUR").plan(&rows, HashSet::new(), UploadId(1));
        assert_eq!(plan.new_expenses[0].currency, "EUR");
    }

    #[test]
    fn plan_accepts_day_month_year_dates() {
        let rows = vec![row(&["10/03/2024", "Cinema", "", "10.00", "BRL", "-10", "0"])];
        let plan = BillSplitImporter::default().plan(&rows, HashSet::new(), UploadId(1));
        assert_eq!(
            plan.new_expenses[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }

    #[test]
    fn date_span_covers_parseable_rows() {
        let mut rows = sample_rows();
        rows.push(row(&["garbage", "x", "", "1", "BRL", "0", "0"]));
        let span = BillSplitImporter::default().date_span(&rows).unwrap();
        assert_eq!(span.start, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(span.end, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
    }
}
