use chrono::NaiveDate;
use sqlx::{Executor, Sqlite, SqliteConnection};
use tally_core::{DateRange, Money, StatementItem, StatementItemDraft, StatementItemId, Upload, UploadId};

use crate::error::StoreError;

type ItemRow = (i64, NaiveDate, String, String, String, i64, String, i64);

const ITEM_COLUMNS: &str = "id, date, label, category, kind, amount_cents, file_name, upload_id";

fn to_item(r: ItemRow) -> StatementItem {
    StatementItem {
        id: StatementItemId(r.0),
        date: r.1,
        label: r.2,
        category: r.3,
        kind: r.4,
        amount: Money::from_cents(r.5),
        file_name: r.6,
        upload_id: UploadId(r.7),
    }
}

/// Stores every draft under `upload`, in order. Returned items keep the
/// draft order.
pub async fn insert_statement_items(
    conn: &mut SqliteConnection,
    upload: &Upload,
    drafts: &[StatementItemDraft],
) -> Result<Vec<StatementItem>, StoreError> {
    let sql = format!(
        "INSERT INTO statement_items (date, label, category, kind, amount_cents, file_name, upload_id) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {ITEM_COLUMNS}"
    );

    let mut items = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(draft.date)
            .bind(&draft.label)
            .bind(&draft.category)
            .bind(&draft.kind)
            .bind(draft.amount.to_cents())
            .bind(&upload.file_name)
            .bind(upload.id.0)
            .fetch_one(&mut *conn)
            .await?;
        items.push(to_item(row));
    }

    Ok(items)
}

pub async fn get_statement_item<'c, E>(db: E, id: StatementItemId) -> Result<StatementItem, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, ItemRow>(&format!("SELECT {ITEM_COLUMNS} FROM statement_items WHERE id = ?"))
        .bind(id.0)
        .fetch_optional(db)
        .await?
        .map(to_item)
        .ok_or(StoreError::NotFound {
            entity: "statement item",
            id: id.0,
        })
}

pub async fn list_statement_items<'c, E>(db: E, upload_id: UploadId) -> Result<Vec<StatementItem>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM statement_items WHERE upload_id = ? ORDER BY id"
    ))
    .bind(upload_id.0)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(to_item).collect())
}

/// Unlinked items of exactly `amount` dated inside `window`, earliest first.
pub async fn find_link_candidates<'c, E>(
    db: E,
    amount: Money,
    window: DateRange,
) -> Result<Vec<StatementItem>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM statement_items s \
         WHERE s.amount_cents = ? AND s.date >= ? AND s.date <= ? \
         AND NOT EXISTS (SELECT 1 FROM expenses e WHERE e.statement_item_id = s.id) \
         ORDER BY s.date ASC, s.id ASC"
    ))
    .bind(amount.to_cents())
    .bind(window.start)
    .bind(window.end)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(to_item).collect())
}
