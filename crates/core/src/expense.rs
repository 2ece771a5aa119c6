use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money::Money;
use super::records::{DomainError, ExpenseId, StatementItemId, UploadId};

/// How an expense entered the ledger.
///
/// Imported expenses belong to the importer that created them: user edits
/// and deletes are refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Manual,
    Imported,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Manual => "manual",
            Origin::Imported => "imported",
        }
    }

    pub fn is_user_editable(self) -> bool {
        self == Origin::Manual
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Origin {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Origin::Manual),
            "imported" => Ok(Origin::Imported),
            other => Err(DomainError::UnknownOrigin(other.to_string())),
        }
    }
}

/// The statement line an expense has been reconciled against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLink {
    pub item_id: StatementItemId,
    pub label: Option<String>,
}

/// A recorded outflow.
///
/// `link` being present is what makes an expense reconciled, so the two can
/// never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub date: NaiveDate,
    pub description: String,
    pub category: Option<String>,
    pub total_cost: Money,
    pub currency: String,
    pub party_a_share: Money,
    pub party_b_share: Money,
    pub origin: Origin,
    pub link: Option<StatementLink>,
    pub source_upload_id: Option<UploadId>,
}

impl Expense {
    pub fn is_reconciled(&self) -> bool {
        self.link.is_some()
    }

    pub fn linked_item(&self) -> Option<StatementItemId> {
        self.link.as_ref().map(|l| l.item_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub description: String,
    pub category: Option<String>,
    pub total_cost: Money,
    pub currency: String,
    pub party_a_share: Money,
    pub party_b_share: Money,
    pub origin: Origin,
    pub source_upload_id: Option<UploadId>,
}

/// A [`NewExpense`] whose description and currency have been checked and
/// trimmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedExpense(NewExpense);

impl ValidatedExpense {
    pub fn validate(mut expense: NewExpense) -> Result<ValidatedExpense, DomainError> {
        expense.description = expense.description.trim().to_string();
        expense.currency = expense.currency.trim().to_uppercase();
        expense.category = expense
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if expense.description.is_empty() {
            return Err(DomainError::EmptyDescription);
        }
        if expense.currency.is_empty() {
            return Err(DomainError::EmptyCurrency);
        }

        Ok(ValidatedExpense(expense))
    }

    pub fn into_inner(self) -> NewExpense {
        self.0
    }
}

impl std::ops::Deref for ValidatedExpense {
    type Target = NewExpense;

    fn deref(&self) -> &NewExpense {
        &self.0
    }
}

/// A partial edit of a manual expense. Reconciliation fields are absent; only
/// reconciliation sets them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub total_cost: Option<Money>,
    pub party_a_share: Option<Money>,
    pub party_b_share: Option<Money>,
}

impl ExpenseUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        match &self.description {
            Some(d) if d.trim().is_empty() => Err(DomainError::EmptyDescription),
            _ => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.total_cost.is_none()
            && self.party_a_share.is_none()
            && self.party_b_share.is_none()
    }
}
