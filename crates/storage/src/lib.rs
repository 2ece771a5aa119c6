pub mod db;
pub mod error;
pub mod expenses;
pub mod incomes;
pub mod reports;
pub mod statement_items;
pub mod uploads;

pub use db::{create_db, DbPool};
pub use error::StoreError;
pub use expenses::{
    apply_links, delete_expense, find_expenses_in_range, get_expense, get_unreconciled_expenses,
    insert_expense, link_expense, list_expenses, update_expense, ExpenseQuery, Page, SortColumn,
    SortDirection,
};
pub use incomes::{delete_income, get_income, insert_income, list_incomes, update_income};
pub use reports::{monthly_summary, MonthlySummary};
pub use statement_items::{
    find_link_candidates, get_statement_item, insert_statement_items, list_statement_items,
};
pub use uploads::{create_upload, list_uploads};
