pub mod expense;
pub mod money;
pub mod period;
pub mod records;

pub use expense::{Expense, ExpenseUpdate, NewExpense, Origin, StatementLink, ValidatedExpense};
pub use money::Money;
pub use period::{DateRange, MonthRange};
pub use records::{
    DomainError, ExpenseId, FileKind, Income, IncomeId, IncomeUpdate, NewIncome, StatementItem,
    StatementItemDraft, StatementItemId, Upload, UploadId,
};
