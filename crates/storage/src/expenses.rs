use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Executor, QueryBuilder, Sqlite, SqliteConnection};
use tally_core::{
    DateRange, Expense, ExpenseId, ExpenseUpdate, Money, MonthRange, Origin, StatementItemId,
    StatementLink, UploadId, ValidatedExpense,
};

use crate::db::DbPool;
use crate::error::StoreError;
use crate::statement_items::get_statement_item;

const EXPENSE_COLUMNS: &str = "id, date, description, category, total_cents, currency, \
     party_a_cents, party_b_cents, origin, statement_item_id, statement_label, upload_id";

#[derive(sqlx::FromRow)]
struct ExpenseRow {
    id: i64,
    date: NaiveDate,
    description: String,
    category: Option<String>,
    total_cents: i64,
    currency: String,
    party_a_cents: i64,
    party_b_cents: i64,
    origin: String,
    statement_item_id: Option<i64>,
    statement_label: Option<String>,
    upload_id: Option<i64>,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = StoreError;

    fn try_from(r: ExpenseRow) -> Result<Self, Self::Error> {
        Ok(Expense {
            id: ExpenseId(r.id),
            date: r.date,
            description: r.description,
            category: r.category,
            total_cost: Money::from_cents(r.total_cents),
            currency: r.currency,
            party_a_share: Money::from_cents(r.party_a_cents),
            party_b_share: Money::from_cents(r.party_b_cents),
            origin: r.origin.parse()?,
            link: r.statement_item_id.map(|item| StatementLink {
                item_id: StatementItemId(item),
                label: r.statement_label,
            }),
            source_upload_id: r.upload_id.map(UploadId),
        })
    }
}

fn to_expenses(rows: Vec<ExpenseRow>) -> Result<Vec<Expense>, StoreError> {
    rows.into_iter().map(Expense::try_from).collect()
}

fn not_found(id: ExpenseId) -> StoreError {
    StoreError::NotFound {
        entity: "expense",
        id: id.0,
    }
}

pub async fn insert_expense<'c, E>(db: E, expense: &ValidatedExpense) -> Result<Expense, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, ExpenseRow>(&format!(
        "INSERT INTO expenses (date, description, category, total_cents, currency, party_a_cents, party_b_cents, origin, upload_id) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {EXPENSE_COLUMNS}"
    ))
    .bind(expense.date)
    .bind(&expense.description)
    .bind(&expense.category)
    .bind(expense.total_cost.to_cents())
    .bind(&expense.currency)
    .bind(expense.party_a_share.to_cents())
    .bind(expense.party_b_share.to_cents())
    .bind(expense.origin.as_str())
    .bind(expense.source_upload_id.map(|u| u.0))
    .fetch_one(db)
    .await?;

    row.try_into()
}

pub async fn get_expense<'c, E>(db: E, id: ExpenseId) -> Result<Expense, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, ExpenseRow>(&format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?"))
        .bind(id.0)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| not_found(id))?
        .try_into()
}

/// Every expense dated inside `range`, for in-memory duplicate checks.
pub async fn find_expenses_in_range<'c, E>(db: E, range: DateRange) -> Result<Vec<Expense>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, ExpenseRow>(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE date >= ? AND date <= ? ORDER BY id"
    ))
    .bind(range.start)
    .bind(range.end)
    .fetch_all(db)
    .await?;

    to_expenses(rows)
}

/// Expenses still waiting for a statement line, in insertion order. That
/// order is the tie-break when several expenses share a match key.
pub async fn get_unreconciled_expenses<'c, E>(db: E) -> Result<Vec<Expense>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, ExpenseRow>(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE reconciled = 0 ORDER BY id"
    ))
    .fetch_all(db)
    .await?;

    to_expenses(rows)
}

/// Links each `(expense, item)` pair, skipping expenses that were reconciled
/// in the meantime and items some other expense already holds. Returns the
/// expenses actually linked.
pub async fn apply_links(
    conn: &mut SqliteConnection,
    links: &[(ExpenseId, StatementItemId)],
    label: &str,
) -> Result<Vec<ExpenseId>, StoreError> {
    let mut applied = Vec::with_capacity(links.len());

    for (expense_id, item_id) in links {
        let result = sqlx::query(
            "UPDATE expenses SET reconciled = 1, statement_item_id = ?, statement_label = ? \
             WHERE id = ? AND reconciled = 0",
        )
        .bind(item_id.0)
        .bind(label)
        .bind(expense_id.0)
        .execute(&mut *conn)
        .await
        .map_err(StoreError::from);

        match result {
            Ok(r) if r.rows_affected() == 1 => applied.push(*expense_id),
            Ok(_) => {
                tracing::warn!(expense = %expense_id, item = %item_id, "expense was reconciled concurrently, link dropped");
            }
            Err(StoreError::Conflict(msg)) => {
                tracing::warn!(expense = %expense_id, item = %item_id, %msg, "statement item already linked, link dropped");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(applied)
}

/// Links one expense to one statement item by hand.
///
/// Fails with `Conflict` when the item belongs to another expense or the
/// expense is linked to another item. Linking an existing pair again is a
/// no-op.
pub async fn link_expense(
    pool: &DbPool,
    expense_id: ExpenseId,
    item_id: StatementItemId,
    label: Option<&str>,
) -> Result<Expense, StoreError> {
    let mut tx = pool.begin().await?;

    let expense = get_expense(&mut *tx, expense_id).await?;
    let item = get_statement_item(&mut *tx, item_id).await?;

    match expense.linked_item() {
        Some(current) if current == item.id => return Ok(expense),
        Some(current) => {
            return Err(StoreError::Conflict(format!(
                "expense {expense_id} is already linked to statement item {current}"
            )))
        }
        None => {}
    }

    let holder: Option<(i64,)> = sqlx::query_as("SELECT id FROM expenses WHERE statement_item_id = ?")
        .bind(item.id.0)
        .fetch_optional(&mut *tx)
        .await?;
    if let Some((holder,)) = holder {
        return Err(StoreError::Conflict(format!(
            "statement item {item_id} is already linked to expense {holder}"
        )));
    }

    let label = label.unwrap_or(&item.file_name);
    let linked = sqlx::query_as::<_, ExpenseRow>(&format!(
        "UPDATE expenses SET reconciled = 1, statement_item_id = ?, statement_label = ? \
         WHERE id = ? AND statement_item_id IS NULL RETURNING {EXPENSE_COLUMNS}"
    ))
    .bind(item.id.0)
    .bind(label)
    .bind(expense_id.0)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| StoreError::Conflict(format!("expense {expense_id} was linked concurrently")))?;

    tx.commit().await?;
    linked.try_into()
}

/// Edits a manual expense. Imported expenses are refused with `Conflict`.
/// Callers validate `update` first.
pub async fn update_expense(
    pool: &DbPool,
    id: ExpenseId,
    update: &ExpenseUpdate,
) -> Result<Expense, StoreError> {
    let row = sqlx::query_as::<_, ExpenseRow>(&format!(
        "UPDATE expenses SET \
            date = COALESCE(?, date), \
            description = COALESCE(?, description), \
            category = COALESCE(?, category), \
            total_cents = COALESCE(?, total_cents), \
            party_a_cents = COALESCE(?, party_a_cents), \
            party_b_cents = COALESCE(?, party_b_cents) \
         WHERE id = ? AND origin = 'manual' RETURNING {EXPENSE_COLUMNS}"
    ))
    .bind(update.date)
    .bind(update.description.as_deref().map(str::trim))
    .bind(update.category.as_deref().map(str::trim))
    .bind(update.total_cost.map(Money::to_cents))
    .bind(update.party_a_share.map(Money::to_cents))
    .bind(update.party_b_share.map(Money::to_cents))
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => row.try_into(),
        None => Err(refusal(pool, id, "edited").await),
    }
}

/// Deletes a manual expense. Imported expenses are refused with `Conflict`.
pub async fn delete_expense(pool: &DbPool, id: ExpenseId) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND origin = 'manual'")
        .bind(id.0)
        .execute(pool)
        .await?;

    if result.rows_affected() == 1 {
        Ok(())
    } else {
        Err(refusal(pool, id, "deleted").await)
    }
}

/// Explains why a guarded write touched no row.
async fn refusal(pool: &DbPool, id: ExpenseId, action: &str) -> StoreError {
    match get_expense(pool, id).await {
        Ok(e) if e.origin == Origin::Imported => {
            StoreError::Conflict(format!("imported expense {id} cannot be {action}"))
        }
        Ok(_) => StoreError::Conflict(format!("expense {id} could not be {action}")),
        Err(e) => e,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    #[default]
    Date,
    Description,
    Category,
    Total,
    Reconciled,
}

impl SortColumn {
    fn column(self) -> &'static str {
        match self {
            SortColumn::Date => "date",
            SortColumn::Description => "description",
            SortColumn::Category => "category",
            SortColumn::Total => "total_cents",
            SortColumn::Reconciled => "reconciled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseQuery {
    pub search: Option<String>,
    pub reconciled: Option<bool>,
    pub month: Option<MonthRange>,
    pub page: u32,
    pub page_size: u32,
    pub sort: SortColumn,
    pub direction: SortDirection,
}

impl Default for ExpenseQuery {
    fn default() -> Self {
        Self {
            search: None,
            reconciled: None,
            month: None,
            page: 1,
            page_size: ExpenseQuery::DEFAULT_PAGE_SIZE,
            sort: SortColumn::default(),
            direction: SortDirection::default(),
        }
    }
}

impl ExpenseQuery {
    pub const DEFAULT_PAGE_SIZE: u32 = 50;
    pub const MAX_PAGE_SIZE: u32 = 500;

    fn page(&self) -> u32 {
        self.page.max(1)
    }

    fn page_size(&self) -> u32 {
        self.page_size.clamp(1, Self::MAX_PAGE_SIZE)
    }

    fn push_filters(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            qb.push(" AND description LIKE ")
                .push_bind(format!("%{}%", escape_like(search)))
                .push(" ESCAPE '\\'");
        }
        if let Some(reconciled) = self.reconciled {
            qb.push(" AND reconciled = ").push_bind(reconciled);
        }
        if let Some(month) = self.month {
            qb.push(" AND date >= ")
                .push_bind(month.first_day())
                .push(" AND date <= ")
                .push_bind(month.last_day());
        }
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub total_pages: u32,
}

pub async fn list_expenses(pool: &DbPool, query: &ExpenseQuery) -> Result<Page<Expense>, StoreError> {
    let page = query.page();
    let page_size = query.page_size();

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM expenses");
    query.push_filters(&mut count);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {EXPENSE_COLUMNS} FROM expenses"));
    query.push_filters(&mut select);
    let direction = query.direction.keyword();
    select
        .push(format!(" ORDER BY {} {direction}, id {direction}", query.sort.column()))
        .push(" LIMIT ")
        .push_bind(i64::from(page_size))
        .push(" OFFSET ")
        .push_bind(i64::from(page - 1) * i64::from(page_size));
    let rows: Vec<ExpenseRow> = select.build_query_as().fetch_all(pool).await?;

    let total_pages = u32::try_from((total + i64::from(page_size) - 1) / i64::from(page_size)).unwrap_or(u32::MAX);

    Ok(Page {
        data: to_expenses(rows)?,
        total,
        page,
        total_pages,
    })
}
