use crate::errors::RecordError;
use crate::models::{Expense, ExpenseUpdate, NewExpense};
use crate::store::{keys, newest_first, oldest_first, CollectionStore};
use crate::validate;
use chrono::{DateTime, Utc};
use tracing::info;

pub const PAYMENT_METHODS: [&str; 4] = ["Cash", "Credit Card", "Debit Card", "Online"];

fn payment_method(value: &str) -> Result<String, RecordError> {
    PAYMENT_METHODS
        .iter()
        .find(|method| **method == value)
        .map(|method| method.to_string())
        .ok_or_else(|| RecordError::invalid(format!("Unknown payment method \"{value}\"")))
}

/// Ids are millisecond timestamps, bumped past any id already taken.
fn next_id(expenses: &[Expense], now: DateTime<Utc>) -> String {
    let mut candidate = now.timestamp_millis();
    while expenses.iter().any(|expense| expense.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

pub async fn add(
    store: &CollectionStore,
    request: NewExpense,
    now: DateTime<Utc>,
) -> Result<Expense, RecordError> {
    let amount = validate::amount(request.amount)?;
    let category = validate::required(&request.category, "Category is required")?;
    let payment_method = payment_method(&request.payment_method)?;

    let expense = store
        .update(keys::EXPENSES, |expenses: &mut Vec<Expense>| {
            let expense = Expense {
                id: next_id(expenses, now),
                amount,
                date: request.date.unwrap_or(now),
                category,
                payment_method,
            };
            expenses.push(expense.clone());
            Ok::<_, RecordError>(expense)
        })
        .await?;

    info!(id = %expense.id, category = %expense.category, "added expense");
    Ok(expense)
}

/// All expenses, newest first.
pub async fn list(store: &CollectionStore) -> Vec<Expense> {
    newest_first(store.get(keys::EXPENSES).await)
}

pub async fn edit(
    store: &CollectionStore,
    id: &str,
    update: ExpenseUpdate,
) -> Result<Expense, RecordError> {
    let amount = validate::amount(update.amount)?;
    let date = validate::date(update.date, "Date is required")?;
    let category = validate::required(&update.category, "Category is required")?;
    let payment_method = payment_method(&update.payment_method)?;

    store
        .update(keys::EXPENSES, |expenses: &mut Vec<Expense>| {
            let mut shown = newest_first(std::mem::take(expenses));
            let edited = shown
                .iter_mut()
                .find(|expense| expense.id == id)
                .map(|expense| {
                    expense.amount = amount;
                    expense.date = date;
                    expense.category = category;
                    expense.payment_method = payment_method;
                    expense.clone()
                })
                .ok_or_else(|| RecordError::NotFound(format!("Expense {id}")));
            *expenses = oldest_first(shown);
            edited
        })
        .await
}

pub async fn delete(store: &CollectionStore, id: &str) -> Result<(), RecordError> {
    store
        .update(keys::EXPENSES, |expenses: &mut Vec<Expense>| {
            let before = expenses.len();
            expenses.retain(|expense| expense.id != id);
            if expenses.len() == before {
                return Err(RecordError::NotFound(format!("Expense {id}")));
            }
            Ok(())
        })
        .await?;

    info!(id, "deleted expense");
    Ok(())
}

#[cfg(test)]
pub(crate) fn new_expense(amount: f64, category: &str) -> NewExpense {
    NewExpense {
        amount: Some(amount),
        date: None,
        category: category.to_string(),
        payment_method: "Cash".to_string(),
    }
}
