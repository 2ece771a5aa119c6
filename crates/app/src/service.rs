//! Import, reconciliation and bookkeeping operations over one ledger
//! database.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use std::collections::HashSet;
use std::io::Read;
use tally_core::{
    DomainError, Expense, ExpenseId, ExpenseUpdate, FileKind, Income, IncomeId, IncomeUpdate,
    Money, MonthRange, NewExpense, NewIncome, Origin, StatementItem, StatementItemDraft,
    StatementItemId, Upload, UploadId, ValidatedExpense,
};
use tally_import::{
    normalize_statement_rows, BillSplitImporter, DedupKey, MatchableExpense, MatchableItem,
    ReconciliationEngine, RowRecord, SourceFormat,
};
use tally_storage::{self as store, DbPool, ExpenseQuery, MonthlySummary, Page};

use crate::config::Config;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImportSummary {
    pub added: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    pub items_saved: usize,
    pub links_found: usize,
}

/// A manually entered expense. Date defaults to today, currency to the
/// configured default and shares to zero.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseInput {
    pub date: Option<NaiveDate>,
    pub description: String,
    pub category: Option<String>,
    pub total_cost: Money,
    pub currency: Option<String>,
    pub party_a_share: Option<Money>,
    pub party_b_share: Option<Money>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomeInput {
    pub date: Option<NaiveDate>,
    pub description: String,
    pub amount: Money,
    pub origin: Option<String>,
}

pub struct Ledger {
    pool: DbPool,
    importer: BillSplitImporter,
    engine: ReconciliationEngine,
    default_currency: String,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl Ledger {
    pub fn new(pool: DbPool, config: &Config) -> Self {
        Self {
            pool,
            importer: config.importer(),
            engine: config.engine(),
            default_currency: config.default_currency.clone(),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    // ── Bill-split import ─────────────────────────────────────────────────────

    /// Imports bill-split `rows` under an existing bill-split upload.
    ///
    /// Rejects the call when there are no data rows or the share columns are
    /// missing. Otherwise every row is either added or counted as skipped.
    pub async fn import_bill_split(
        &self,
        rows: Vec<RowRecord>,
        upload: &Upload,
    ) -> Result<ImportSummary, Error> {
        if upload.kind != FileKind::BillSplit {
            return Err(Error::Validation(format!(
                "upload {} is a {} file, not a bill split",
                upload.id, upload.kind
            )));
        }
        let rows = self.importer.prepare(rows)?;

        let mut tx = self.pool.begin().await?;
        let summary = self.import_prepared(&mut *tx, &rows, upload).await?;
        tx.commit().await?;
        Ok(summary)
    }

    /// Reads a bill-split export and imports it as a new upload. The upload
    /// is only recorded when the file passes validation.
    pub async fn import_bill_split_file<R: Read>(
        &self,
        file_name: &str,
        data: R,
    ) -> Result<ImportSummary, Error> {
        let rows = SourceFormat::from_file_name(file_name).read_rows(data)?;
        let rows = self.importer.prepare(rows)?;

        let mut tx = self.pool.begin().await?;
        let upload = store::create_upload(&mut *tx, file_name, FileKind::BillSplit).await?;
        let summary = self.import_prepared(&mut *tx, &rows, &upload).await?;
        tx.commit().await?;
        Ok(summary)
    }

    async fn import_prepared(
        &self,
        conn: &mut SqliteConnection,
        rows: &[RowRecord],
        upload: &Upload,
    ) -> Result<ImportSummary, Error> {
        let existing: HashSet<DedupKey> = match self.importer.date_span(rows) {
            Some(span) => store::find_expenses_in_range(&mut *conn, span)
                .await?
                .iter()
                .map(DedupKey::from)
                .collect(),
            None => HashSet::new(),
        };

        let plan = self.importer.plan(rows, existing, upload.id);
        let mut summary = ImportSummary {
            added: 0,
            skipped: plan.skipped,
        };

        for expense in plan.new_expenses {
            match insert_planned(&mut *conn, expense).await {
                Ok(created) => {
                    tracing::debug!(expense = %created.id, "imported bill-split row");
                    summary.added += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to store bill-split row");
                    summary.skipped += 1;
                }
            }
        }

        tracing::info!(
            file = %upload.file_name,
            added = summary.added,
            skipped = summary.skipped,
            "bill-split import finished"
        );
        Ok(summary)
    }

    // ── Statement reconciliation ──────────────────────────────────────────────

    /// Stores the statement lines in `rows` under `upload` and links every
    /// line that exactly matches an unreconciled expense.
    pub async fn reconcile(&self, rows: &[RowRecord], upload: &Upload) -> Result<ReconcileSummary, Error> {
        if upload.kind != FileKind::Statement {
            return Err(Error::Validation(format!(
                "upload {} is a {} file, not a statement",
                upload.id, upload.kind
            )));
        }
        let drafts = normalize_statement_rows(rows)?;

        let mut tx = self.pool.begin().await?;
        let summary = self.reconcile_drafts(&mut *tx, upload, &drafts).await?;
        tx.commit().await?;
        Ok(summary)
    }

    /// Reads a statement (CSV or spreadsheet workbook, by extension) and
    /// reconciles it as a new upload. Nothing is stored when no line is
    /// usable.
    pub async fn reconcile_file<R: Read>(&self, file_name: &str, data: R) -> Result<ReconcileSummary, Error> {
        let rows = SourceFormat::from_file_name(file_name).read_rows(data)?;
        let drafts = normalize_statement_rows(&rows)?;

        let mut tx = self.pool.begin().await?;
        let upload = store::create_upload(&mut *tx, file_name, FileKind::Statement).await?;
        let summary = self.reconcile_drafts(&mut *tx, &upload, &drafts).await?;
        tx.commit().await?;
        Ok(summary)
    }

    async fn reconcile_drafts(
        &self,
        conn: &mut SqliteConnection,
        upload: &Upload,
        drafts: &[StatementItemDraft],
    ) -> Result<ReconcileSummary, Error> {
        let items = store::insert_statement_items(&mut *conn, upload, drafts).await?;
        let expenses = store::get_unreconciled_expenses(&mut *conn).await?;

        let matchable_items: Vec<MatchableItem> = items.iter().map(MatchableItem::from).collect();
        let matchable_expenses: Vec<MatchableExpense> =
            expenses.iter().map(MatchableExpense::from).collect();
        let links = self.engine.links(&matchable_items, &matchable_expenses);

        let applied = store::apply_links(&mut *conn, &links, &upload.file_name).await?;
        if applied.len() < links.len() {
            tracing::warn!(
                planned = links.len(),
                applied = applied.len(),
                "some links were taken by a concurrent reconciliation"
            );
        }

        let summary = ReconcileSummary {
            items_saved: items.len(),
            links_found: applied.len(),
        };
        tracing::info!(
            file = %upload.file_name,
            items_saved = summary.items_saved,
            links_found = summary.links_found,
            unreconciled = expenses.len() - summary.links_found,
            "statement reconciled"
        );
        Ok(summary)
    }

    /// Unlinked statement lines of exactly `amount` within the candidate
    /// window around `date`, earliest first.
    pub async fn find_candidates(&self, amount: Money, date: NaiveDate) -> Result<Vec<StatementItem>, Error> {
        let window = self.engine.candidate_range(date);
        Ok(store::find_link_candidates(&self.pool, amount, window).await?)
    }

    /// Links one expense to one statement line. The label defaults to the
    /// statement's file name.
    pub async fn link_manually(
        &self,
        expense_id: ExpenseId,
        item_id: StatementItemId,
        label: Option<&str>,
    ) -> Result<Expense, Error> {
        let expense = store::link_expense(&self.pool, expense_id, item_id, label).await?;
        tracing::info!(expense = %expense_id, item = %item_id, "expense linked manually");
        Ok(expense)
    }

    // ── Expenses ──────────────────────────────────────────────────────────────

    pub async fn create_expense(&self, input: ExpenseInput) -> Result<Expense, Error> {
        let expense = ValidatedExpense::validate(NewExpense {
            date: input.date.unwrap_or_else(today),
            description: input.description,
            category: input.category,
            total_cost: input.total_cost,
            currency: input.currency.unwrap_or_else(|| self.default_currency.clone()),
            party_a_share: input.party_a_share.unwrap_or_else(Money::zero),
            party_b_share: input.party_b_share.unwrap_or_else(Money::zero),
            origin: Origin::Manual,
            source_upload_id: None,
        })?;
        Ok(store::insert_expense(&self.pool, &expense).await?)
    }

    pub async fn get_expense(&self, id: ExpenseId) -> Result<Expense, Error> {
        Ok(store::get_expense(&self.pool, id).await?)
    }

    pub async fn list_expenses(&self, query: &ExpenseQuery) -> Result<Page<Expense>, Error> {
        Ok(store::list_expenses(&self.pool, query).await?)
    }

    pub async fn update_expense(&self, id: ExpenseId, update: &ExpenseUpdate) -> Result<Expense, Error> {
        update.validate()?;
        Ok(store::update_expense(&self.pool, id, update).await?)
    }

    pub async fn delete_expense(&self, id: ExpenseId) -> Result<(), Error> {
        Ok(store::delete_expense(&self.pool, id).await?)
    }

    // ── Incomes ───────────────────────────────────────────────────────────────

    pub async fn create_income(&self, input: IncomeInput) -> Result<Income, Error> {
        let income = NewIncome {
            date: input.date.unwrap_or_else(today),
            description: input.description,
            amount: input.amount,
            origin: input.origin,
        };
        income.validate()?;
        Ok(store::insert_income(&self.pool, &income).await?)
    }

    pub async fn list_incomes(&self, month: Option<MonthRange>) -> Result<Vec<Income>, Error> {
        Ok(store::list_incomes(&self.pool, month).await?)
    }

    pub async fn update_income(&self, id: IncomeId, update: &IncomeUpdate) -> Result<Income, Error> {
        if update.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(DomainError::EmptyDescription.into());
        }
        Ok(store::update_income(&self.pool, id, update).await?)
    }

    pub async fn delete_income(&self, id: IncomeId) -> Result<(), Error> {
        Ok(store::delete_income(&self.pool, id).await?)
    }

    // ── Uploads and reports ───────────────────────────────────────────────────

    pub async fn create_upload(&self, file_name: &str, kind: FileKind) -> Result<Upload, Error> {
        Ok(store::create_upload(&self.pool, file_name, kind).await?)
    }

    pub async fn list_uploads(&self, kind: FileKind) -> Result<Vec<Upload>, Error> {
        Ok(store::list_uploads(&self.pool, kind).await?)
    }

    pub async fn statement_items(&self, upload_id: UploadId) -> Result<Vec<StatementItem>, Error> {
        Ok(store::list_statement_items(&self.pool, upload_id).await?)
    }

    pub async fn monthly_summary(&self, month: MonthRange) -> Result<MonthlySummary, Error> {
        Ok(store::monthly_summary(&self.pool, month).await?)
    }
}

async fn insert_planned(conn: &mut SqliteConnection, expense: NewExpense) -> Result<Expense, Error> {
    let expense = ValidatedExpense::validate(expense)?;
    Ok(store::insert_expense(conn, &expense).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tally_import::csv::read_rows;
    use tally_storage::create_db;
    use tempfile::TempDir;

    const SPLIT_CSV: &str = "\
Date,Description,Category,Cost,Currency,Ana,Bruno
2024-03-10,Mercado,Food,100.00,BRL,-100.00,100.00
2024-03-11,Cinema,Fun,60.00,BRL,30.00,-30.00
2024-03-12,Padaria,Food,abc,BRL,-10.00,10.00
2024-03-13,Uber,Transport,25.50,BRL,25.50,-25.50
2024-03-31,Total balance,,,BRL,-45.50,45.50
";

    const STATEMENT_CSV: &str = "\
Data;Lançamento;Categoria;Tipo;Valor
10/03/2024;MERCADO PAO;Alimentação;Compra à vista;R$ 50,00
12/03/2024;POSTO;Transporte;Compra à vista;30
15/03/2024;LIVRARIA;Lazer;Compra à vista;R$ 99,99
;SEM DATA;Lazer;Compra à vista;R$ 1,00
";

    async fn ledger() -> (Ledger, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = create_db(&dir.path().join("ledger.db")).await.unwrap();
        (Ledger::new(pool, &Config::default()), dir)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(description: &str, d: NaiveDate, cents: i64) -> ExpenseInput {
        ExpenseInput {
            date: Some(d),
            description: description.to_string(),
            category: None,
            total_cost: Money::from_cents(cents),
            currency: None,
            party_a_share: None,
            party_b_share: None,
        }
    }

    #[tokio::test]
    async fn bill_split_import_counts_and_resolves_shares() {
        let (ledger, _dir) = ledger().await;
        let summary = ledger.import_bill_split_file("split.csv", SPLIT_CSV.as_bytes()).await.unwrap();
        assert_eq!(summary, ImportSummary { added: 3, skipped: 1 });

        let page = ledger.list_expenses(&ExpenseQuery::default()).await.unwrap();
        let mercado = page.data.iter().find(|e| e.description == "Mercado").unwrap();
        assert_eq!(mercado.party_a_share, Money::from_cents(10000));
        assert_eq!(mercado.party_b_share, Money::zero());
        assert_eq!(mercado.origin, Origin::Imported);

        let uber = page.data.iter().find(|e| e.description == "Uber").unwrap();
        assert_eq!(uber.party_a_share, Money::zero());
        assert_eq!(uber.party_b_share, Money::from_cents(2550));

        let cinema = page.data.iter().find(|e| e.description == "Cinema").unwrap();
        assert_eq!((cinema.party_a_share, cinema.party_b_share), (Money::from_cents(3000), Money::from_cents(3000)));

        assert!(page.data.iter().all(|e| e.description != "Total balance"));
        assert_eq!(ledger.list_uploads(FileKind::BillSplit).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reimporting_a_bill_split_adds_nothing() {
        let (ledger, _dir) = ledger().await;
        let first = ledger.import_bill_split_file("split.csv", SPLIT_CSV.as_bytes()).await.unwrap();
        let second = ledger.import_bill_split_file("split.csv", SPLIT_CSV.as_bytes()).await.unwrap();

        assert_eq!(second.added, 0);
        assert_eq!(second.skipped, first.added + first.skipped);
        assert_eq!(ledger.list_expenses(&ExpenseQuery::default()).await.unwrap().total, 3);
    }

    #[tokio::test]
    async fn bill_split_without_share_columns_is_rejected_before_recording() {
        let (ledger, _dir) = ledger().await;
        let csv = "Date,Description,Category,Cost,Currency,Ana\n2024-03-10,Mercado,Food,100.00,BRL,-100.00\n";
        assert!(matches!(
            ledger.import_bill_split_file("short.csv", csv.as_bytes()).await,
            Err(Error::Validation(_))
        ));
        assert!(ledger.list_uploads(FileKind::BillSplit).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn summary_row_alone_is_empty_input() {
        let (ledger, _dir) = ledger().await;
        let rows = read_rows(
            "Date,Description,Category,Cost,Currency,Ana,Bruno\n2024-03-31,TOTAL BALANCE,,,BRL,-1,1\n".as_bytes(),
        )
        .unwrap();
        let upload = ledger.create_upload("split.csv", FileKind::BillSplit).await.unwrap();
        assert!(matches!(
            ledger.import_bill_split(rows, &upload).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn bill_split_import_requires_a_bill_split_upload() {
        let (ledger, _dir) = ledger().await;
        let upload = ledger.create_upload("fatura.csv", FileKind::Statement).await.unwrap();
        let rows = read_rows(SPLIT_CSV.as_bytes()).unwrap();
        assert!(matches!(
            ledger.import_bill_split(rows, &upload).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(ledger.list_expenses(&ExpenseQuery::default()).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn failed_bill_split_import_leaves_no_upload() {
        let (ledger, _dir) = ledger().await;
        sqlx::query("DROP TABLE expenses").execute(ledger.pool()).await.unwrap();

        assert!(matches!(
            ledger.import_bill_split_file("split.csv", SPLIT_CSV.as_bytes()).await,
            Err(Error::Store(_))
        ));
        assert!(ledger.list_uploads(FileKind::BillSplit).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reconcile_links_exact_matches_once() {
        let (ledger, _dir) = ledger().await;
        let a = ledger.create_expense(input("A", date(2024, 3, 10), 5000)).await.unwrap();
        let b = ledger.create_expense(input("B", date(2024, 3, 10), 5000)).await.unwrap();
        let c = ledger.create_expense(input("C", date(2024, 3, 12), 3000)).await.unwrap();

        let summary = ledger.reconcile_file("fatura.csv", STATEMENT_CSV.as_bytes()).await.unwrap();
        assert_eq!(summary, ReconcileSummary { items_saved: 3, links_found: 2 });

        let a = ledger.get_expense(a.id).await.unwrap();
        assert!(a.is_reconciled());
        assert_eq!(a.link.unwrap().label.as_deref(), Some("fatura.csv"));
        assert!(!ledger.get_expense(b.id).await.unwrap().is_reconciled());
        assert!(ledger.get_expense(c.id).await.unwrap().is_reconciled());

        // Same statement again: only B is left to take the 50.00 line.
        let again = ledger.reconcile_file("fatura.csv", STATEMENT_CSV.as_bytes()).await.unwrap();
        assert_eq!(again, ReconcileSummary { items_saved: 3, links_found: 1 });
        assert!(ledger.get_expense(b.id).await.unwrap().is_reconciled());
    }

    #[tokio::test]
    async fn reconcile_reads_spreadsheet_statements() {
        let (ledger, _dir) = ledger().await;
        let expense = ledger.create_expense(input("Padaria", date(2023, 3, 15), 2390)).await.unwrap();

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in ["Data", "Lançamento", "Categoria", "Tipo", "Valor"].iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        sheet.write_number(1, 0, 45000.0).unwrap();
        sheet.write_string(1, 1, "PADARIA").unwrap();
        sheet.write_number(1, 4, 23.9).unwrap();
        sheet.write_string(2, 0, "16/03/2023").unwrap();
        sheet.write_string(2, 1, "POSTO").unwrap();
        sheet.write_string(2, 4, "R$ 80,00").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let summary = ledger.reconcile_file("fatura.xlsx", bytes.as_slice()).await.unwrap();
        assert_eq!(summary, ReconcileSummary { items_saved: 2, links_found: 1 });

        let linked = ledger.get_expense(expense.id).await.unwrap();
        assert_eq!(linked.link.unwrap().label.as_deref(), Some("fatura.xlsx"));
    }

    #[tokio::test]
    async fn reconcile_never_links_twice() {
        let (ledger, _dir) = ledger().await;
        for n in 0..6 {
            ledger
                .create_expense(input(&format!("E{n}"), date(2024, 3, 10 + n % 2), 5000))
                .await
                .unwrap();
        }
        let statement = "Data;Lançamento;Valor\n\
            10/03/2024;X;50,00\n10/03/2024;Y;50,00\n11/03/2024;Z;50,00\n\
            10/03/2024;W;50,00\n10/03/2024;V;50,00\n11/03/2024;U;50,00\n11/03/2024;T;50,00\n";
        let summary = ledger.reconcile_file("f.csv", statement.as_bytes()).await.unwrap();
        assert_eq!(summary.items_saved, 7);
        assert_eq!(summary.links_found, 6);

        let page = ledger.list_expenses(&ExpenseQuery::default()).await.unwrap();
        let items: Vec<_> = page.data.iter().filter_map(|e| e.linked_item()).collect();
        let distinct: HashSet<_> = items.iter().collect();
        assert_eq!(items.len(), 6);
        assert_eq!(distinct.len(), 6);
    }

    #[tokio::test]
    async fn statement_without_usable_lines_stores_nothing() {
        let (ledger, _dir) = ledger().await;
        let statement = "Data;Lançamento;Valor\nontem;X;abc\n";
        assert!(matches!(
            ledger.reconcile_file("f.csv", statement.as_bytes()).await,
            Err(Error::Validation(_))
        ));
        assert!(ledger.list_uploads(FileKind::Statement).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reconcile_requires_a_statement_upload() {
        let (ledger, _dir) = ledger().await;
        let upload = ledger.create_upload("split.csv", FileKind::BillSplit).await.unwrap();
        let rows = read_rows(STATEMENT_CSV.as_bytes()).unwrap();
        assert!(matches!(ledger.reconcile(&rows, &upload).await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn candidates_and_manual_link() {
        let (ledger, _dir) = ledger().await;
        let a = ledger.create_expense(input("A", date(2024, 3, 10), 5000)).await.unwrap();
        let b = ledger.create_expense(input("B", date(2024, 3, 1), 1234)).await.unwrap();
        let statement = "Data;Lançamento;Valor\n14/03/2024;LAG;50,00\n20/03/2024;LATE;50,00\n";
        ledger.reconcile_file("f.csv", statement.as_bytes()).await.unwrap();

        let found = ledger.find_candidates(Money::from_cents(5000), date(2024, 3, 10)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "LAG");

        let linked = ledger.link_manually(a.id, found[0].id, Some("by hand")).await.unwrap();
        assert_eq!(linked.linked_item(), Some(found[0].id));
        assert!(ledger
            .find_candidates(Money::from_cents(5000), date(2024, 3, 10))
            .await
            .unwrap()
            .is_empty());

        assert!(matches!(
            ledger.link_manually(b.id, found[0].id, None).await,
            Err(Error::Conflict(_))
        ));
        assert_eq!(ledger.get_expense(a.id).await.unwrap().linked_item(), Some(found[0].id));
        assert!(matches!(
            ledger.link_manually(ExpenseId(999), found[0].id, None).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn candidate_window_follows_config() {
        let dir = TempDir::new().unwrap();
        let pool = create_db(&dir.path().join("ledger.db")).await.unwrap();
        let config = Config {
            candidate_window_days: 10,
            ..Config::default()
        };
        let ledger = Ledger::new(pool, &config);
        let statement = "Data;Lançamento;Valor\n14/03/2024;LAG;50,00\n20/03/2024;LATE;50,00\n21/03/2024;TOO LATE;50,00\n";
        ledger.reconcile_file("f.csv", statement.as_bytes()).await.unwrap();

        let found = ledger.find_candidates(Money::from_cents(5000), date(2024, 3, 10)).await.unwrap();
        let labels: Vec<_> = found.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["LAG", "LATE"]);
    }

    #[tokio::test]
    async fn manual_expense_defaults_and_origin_guard() {
        let (ledger, _dir) = ledger().await;
        let mut manual = input("Farmácia", date(2024, 3, 2), 4200);
        manual.date = None;
        let created = ledger.create_expense(manual).await.unwrap();
        assert_eq!(created.currency, "BRL");
        assert_eq!(created.date, today());
        assert_eq!(created.origin, Origin::Manual);

        assert!(matches!(
            ledger.create_expense(input("  ", date(2024, 3, 2), 1)).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            ledger
                .update_expense(
                    created.id,
                    &ExpenseUpdate {
                        description: Some(String::new()),
                        ..Default::default()
                    }
                )
                .await,
            Err(Error::Validation(_))
        ));

        ledger.import_bill_split_file("split.csv", SPLIT_CSV.as_bytes()).await.unwrap();
        let imported = ledger
            .list_expenses(&ExpenseQuery {
                search: Some("Mercado".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .data
            .remove(0);
        assert!(matches!(ledger.delete_expense(imported.id).await, Err(Error::Conflict(_))));
        ledger.delete_expense(created.id).await.unwrap();
        assert!(matches!(ledger.get_expense(created.id).await, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn incomes_feed_the_monthly_summary() {
        let (ledger, _dir) = ledger().await;
        ledger.import_bill_split_file("split.csv", SPLIT_CSV.as_bytes()).await.unwrap();
        let income = ledger
            .create_income(IncomeInput {
                date: Some(date(2024, 3, 5)),
                description: "Salário".to_string(),
                amount: Money::from_cents(500000),
                origin: None,
            })
            .await
            .unwrap();
        assert_eq!(income.origin, "OTHER");

        let summary = ledger.monthly_summary(MonthRange::new(2024, 3).unwrap()).await.unwrap();
        assert_eq!(summary.total_expenses, Money::from_cents(18550));
        assert_eq!(summary.balance, Money::from_cents(500000 - 18550));

        ledger.delete_income(income.id).await.unwrap();
        assert!(ledger.list_incomes(None).await.unwrap().is_empty());
    }
}
