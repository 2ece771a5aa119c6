use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

/// Opens (creating if needed) the ledger database and brings its schema up
/// to date.
///
/// The pool holds a single connection, so writers are serialized. Two
/// reconciliation passes or manual links can never interleave.
pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS uploads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('statement', 'bill-split')),
            uploaded_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS statement_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            label TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            kind TEXT NOT NULL DEFAULT '',
            amount_cents INTEGER NOT NULL,
            file_name TEXT NOT NULL,
            upload_id INTEGER NOT NULL,
            FOREIGN KEY (upload_id) REFERENCES uploads(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // statement_item_id is UNIQUE: the store is the final arbiter of the
    // one-item-one-expense rule.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            category TEXT,
            total_cents INTEGER NOT NULL,
            currency TEXT NOT NULL,
            party_a_cents INTEGER NOT NULL DEFAULT 0,
            party_b_cents INTEGER NOT NULL DEFAULT 0,
            origin TEXT NOT NULL CHECK (origin IN ('manual', 'imported')),
            reconciled INTEGER NOT NULL DEFAULT 0,
            statement_item_id INTEGER UNIQUE,
            statement_label TEXT,
            upload_id INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK ((reconciled = 1) = (statement_item_id IS NOT NULL)),
            FOREIGN KEY (statement_item_id) REFERENCES statement_items(id),
            FOREIGN KEY (upload_id) REFERENCES uploads(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_statement_items_amount_date ON statement_items(amount_cents, date)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS incomes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            origin TEXT NOT NULL DEFAULT 'OTHER',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
