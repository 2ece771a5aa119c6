use serde::Serialize;
use sqlx::{Executor, Sqlite};
use tally_core::{Money, MonthRange};

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub total_income: Money,
    pub total_expenses: Money,
    pub balance: Money,
    pub party_a_total: Money,
    pub party_b_total: Money,
}

pub async fn monthly_summary<'c, E>(db: E, month: MonthRange) -> Result<MonthlySummary, StoreError>
where
    E: Executor<'c, Database = Sqlite> + Copy,
{
    let (start, end) = (month.first_day(), month.last_day());

    let (income_cents,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM incomes WHERE date >= ? AND date <= ?",
    )
    .bind(start)
    .bind(end)
    .fetch_one(db)
    .await?;

    let (expense_cents, party_a_cents, party_b_cents): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(total_cents), 0),
            COALESCE(SUM(party_a_cents), 0),
            COALESCE(SUM(party_b_cents), 0)
        FROM expenses
        WHERE date >= ? AND date <= ?
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_one(db)
    .await?;

    let total_income = Money::from_cents(income_cents);
    let total_expenses = Money::from_cents(expense_cents);

    Ok(MonthlySummary {
        year: month.year(),
        month: month.month(),
        total_income,
        total_expenses,
        balance: total_income - total_expenses,
        party_a_total: Money::from_cents(party_a_cents),
        party_b_total: Money::from_cents(party_b_cents),
    })
}
