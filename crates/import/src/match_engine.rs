use chrono::NaiveDate;
use std::collections::{HashMap, VecDeque};
use tally_core::{DateRange, Expense, ExpenseId, Money, StatementItem, StatementItemId};

/// Statement lines post a few days after the purchase; manual candidate
/// search looks this far either side of the expense date.
pub const DEFAULT_CANDIDATE_WINDOW_DAYS: u32 = 5;

/// Calendar day plus amount at cent precision. Bulk reconciliation pairs
/// only items and expenses with equal keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MatchKey {
    date: NaiveDate,
    amount: Money,
}

impl MatchKey {
    fn new(date: NaiveDate, amount: Money) -> Self {
        MatchKey { date, amount }
    }
}

#[derive(Debug, Clone)]
pub struct MatchableExpense {
    pub id: ExpenseId,
    pub date: NaiveDate,
    pub amount: Money,
}

impl From<&Expense> for MatchableExpense {
    fn from(e: &Expense) -> Self {
        MatchableExpense {
            id: e.id,
            date: e.date,
            amount: e.total_cost,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchableItem {
    pub id: StatementItemId,
    pub date: NaiveDate,
    pub amount: Money,
}

impl From<&StatementItem> for MatchableItem {
    fn from(i: &StatementItem) -> Self {
        MatchableItem {
            id: i.id,
            date: i.date,
            amount: i.amount,
        }
    }
}

pub struct ReconciliationEngine {
    pub candidate_window_days: u32,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self {
            candidate_window_days: DEFAULT_CANDIDATE_WINDOW_DAYS,
        }
    }
}

impl ReconciliationEngine {
    pub fn new(candidate_window_days: u32) -> Self {
        Self {
            candidate_window_days,
        }
    }

    /// One greedy pass over `items` in order, returning the pairs found as
    /// `(expense, item)`. Each item takes the earliest (in `expenses` order)
    /// not-yet-taken expense with the same key, so no expense is paired twice
    /// and no item gets more than one expense.
    pub fn links(
        &self,
        items: &[MatchableItem],
        expenses: &[MatchableExpense],
    ) -> Vec<(ExpenseId, StatementItemId)> {
        let mut pending: HashMap<MatchKey, VecDeque<ExpenseId>> = HashMap::new();
        for exp in expenses {
            pending
                .entry(MatchKey::new(exp.date, exp.amount))
                .or_default()
                .push_back(exp.id);
        }

        items
            .iter()
            .filter_map(|item| {
                pending
                    .get_mut(&MatchKey::new(item.date, item.amount))
                    .and_then(VecDeque::pop_front)
                    .map(|expense| (expense, item.id))
            })
            .collect()
    }

    /// Dates a statement line may carry and still be offered for an expense
    /// dated `date`.
    pub fn candidate_range(&self, date: NaiveDate) -> DateRange {
        DateRange::around(date, self.candidate_window_days)
    }
}
