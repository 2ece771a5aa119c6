use chrono::NaiveDate;
use sqlx::{Executor, Sqlite};
use tally_core::{Income, IncomeId, IncomeUpdate, Money, MonthRange, NewIncome};

use crate::error::StoreError;

type IncomeRow = (i64, NaiveDate, String, i64, String);

const INCOME_COLUMNS: &str = "id, date, description, amount_cents, origin";

fn to_income(r: IncomeRow) -> Income {
    Income {
        id: IncomeId(r.0),
        date: r.1,
        description: r.2,
        amount: Money::from_cents(r.3),
        origin: r.4,
    }
}

fn not_found(id: IncomeId) -> StoreError {
    StoreError::NotFound {
        entity: "income",
        id: id.0,
    }
}

pub async fn insert_income<'c, E>(db: E, income: &NewIncome) -> Result<Income, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, IncomeRow>(&format!(
        "INSERT INTO incomes (date, description, amount_cents, origin) VALUES (?, ?, ?, ?) RETURNING {INCOME_COLUMNS}"
    ))
    .bind(income.date)
    .bind(income.description.trim())
    .bind(income.amount.to_cents())
    .bind(income.origin_or_default().trim())
    .fetch_one(db)
    .await?;

    Ok(to_income(row))
}

pub async fn get_income<'c, E>(db: E, id: IncomeId) -> Result<Income, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, IncomeRow>(&format!("SELECT {INCOME_COLUMNS} FROM incomes WHERE id = ?"))
        .bind(id.0)
        .fetch_optional(db)
        .await?
        .map(to_income)
        .ok_or_else(|| not_found(id))
}

/// Incomes newest first, optionally limited to one month.
pub async fn list_incomes<'c, E>(db: E, month: Option<MonthRange>) -> Result<Vec<Income>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let (start, end) = match month {
        Some(m) => (Some(m.first_day()), Some(m.last_day())),
        None => (None, None),
    };

    let rows = sqlx::query_as::<_, IncomeRow>(&format!(
        "SELECT {INCOME_COLUMNS} FROM incomes \
         WHERE (? IS NULL OR date >= ?) AND (? IS NULL OR date <= ?) \
         ORDER BY date DESC, id DESC"
    ))
    .bind(start)
    .bind(start)
    .bind(end)
    .bind(end)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(to_income).collect())
}

/// Callers validate `update` first.
pub async fn update_income<'c, E>(db: E, id: IncomeId, update: &IncomeUpdate) -> Result<Income, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, IncomeRow>(&format!(
        "UPDATE incomes SET \
            date = COALESCE(?, date), \
            description = COALESCE(?, description), \
            amount_cents = COALESCE(?, amount_cents), \
            origin = COALESCE(?, origin) \
         WHERE id = ? RETURNING {INCOME_COLUMNS}"
    ))
    .bind(update.date)
    .bind(update.description.as_deref().map(str::trim))
    .bind(update.amount.map(Money::to_cents))
    .bind(update.origin.as_deref().map(str::trim).filter(|o| !o.is_empty()))
    .bind(id.0)
    .fetch_optional(db)
    .await?
    .map(to_income)
    .ok_or_else(|| not_found(id))
}

pub async fn delete_income<'c, E>(db: E, id: IncomeId) -> Result<(), StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM incomes WHERE id = ?")
        .bind(id.0)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}
