use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::money::Money;

macro_rules! record_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(ExpenseId);
record_id!(IncomeId);
record_id!(UploadId);
record_id!(StatementItemId);

/// What kind of file an [`Upload`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    Statement,
    BillSplit,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Statement => "statement",
            FileKind::BillSplit => "bill-split",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "statement" => Ok(FileKind::Statement),
            "bill-split" => Ok(FileKind::BillSplit),
            other => Err(DomainError::UnknownFileKind(other.to_string())),
        }
    }
}

/// Provenance of one imported file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upload {
    pub id: UploadId,
    pub file_name: String,
    pub kind: FileKind,
    pub uploaded_at: DateTime<Utc>,
}

/// A statement line that has been normalized but not yet stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementItemDraft {
    pub date: NaiveDate,
    pub label: String,
    pub category: String,
    pub kind: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementItem {
    pub id: StatementItemId,
    pub date: NaiveDate,
    pub label: String,
    pub category: String,
    pub kind: String,
    pub amount: Money,
    pub file_name: String,
    pub upload_id: UploadId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: IncomeId,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIncome {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub origin: Option<String>,
}

impl NewIncome {
    pub const DEFAULT_ORIGIN: &'static str = "OTHER";

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.description.trim().is_empty() {
            return Err(DomainError::EmptyDescription);
        }
        Ok(())
    }

    pub fn origin_or_default(&self) -> &str {
        self.origin
            .as_deref()
            .filter(|o| !o.trim().is_empty())
            .unwrap_or(Self::DEFAULT_ORIGIN)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomeUpdate {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub origin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Description must not be empty")]
    EmptyDescription,
    #[error("Currency code must not be empty")]
    EmptyCurrency,
    #[error("Unknown origin: {0}")]
    UnknownOrigin(String),
    #[error("Unknown file kind: {0}")]
    UnknownFileKind(String),
    #[error("Invalid month (expected YYYY-MM): {0}")]
    InvalidMonth(String),
}
