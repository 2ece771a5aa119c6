pub mod config;
pub mod error;
pub mod service;

pub use config::Config;
pub use error::Error;
pub use service::{ExpenseInput, ImportSummary, IncomeInput, Ledger, ReconcileSummary};
