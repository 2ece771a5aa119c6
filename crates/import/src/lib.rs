//! Pure import and reconciliation logic: turns tokenized file rows into
//! expense and statement drafts and pairs statement lines with expenses.
//! Nothing in this crate touches the store.

pub mod bill_split;
pub mod csv;
pub mod error;
pub mod match_engine;
pub mod normalize;
pub mod row;
pub mod source;
pub mod statement;
pub mod xlsx;

pub use bill_split::{resolve_shares, BillSplitImporter, BillSplitPlan, DedupKey, ShareSplit};
pub use error::{ImportError, RowError};
pub use match_engine::{MatchableExpense, MatchableItem, ReconciliationEngine};
pub use normalize::{normalize_amount, normalize_date};
pub use row::{Cell, RowRecord};
pub use source::SourceFormat;
pub use statement::{normalize_statement_row, normalize_statement_rows};
