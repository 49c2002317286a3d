use crate::categories;
use crate::errors::RecordError;
use crate::models::{Budget, NewBudget};
use crate::store::{keys, newest_first, oldest_first, CollectionStore};
use crate::validate;
use tracing::{info, warn};
use uuid::Uuid;

/// Pseudo-category for a budget that covers all spending.
pub const OVERALL: &str = "Overall";

/// Saves a new budget. At most one budget may exist per category; a second
/// one is rejected and the stored budgets are left as they were.
pub async fn add(store: &CollectionStore, request: NewBudget) -> Result<Budget, RecordError> {
    let amount = validate::amount(request.amount)?;
    let category = validate::required(&request.category, "Category is required")?;
    let start_date = validate::date(request.start_date, "Start date is required")?;
    let end_date = validate::date(request.end_date, "End date is required")?;
    if end_date <= start_date {
        return Err(RecordError::invalid("End date must be after start date"));
    }

    let budget = store
        .update(keys::BUDGETS, |budgets: &mut Vec<Budget>| {
            if budgets.iter().any(|budget| budget.category == category) {
                warn!(category = %category, "budget already exists");
                return Err(RecordError::Duplicate(format!(
                    "A budget already exists for category \"{category}\"."
                )));
            }
            let budget = Budget {
                id: Uuid::new_v4().to_string(),
                category,
                amount,
                start_date,
                end_date,
            };
            budgets.push(budget.clone());
            Ok(budget)
        })
        .await?;

    info!(id = %budget.id, category = %budget.category, "saved budget");
    Ok(budget)
}

pub async fn list(store: &CollectionStore) -> Vec<Budget> {
    newest_first(store.get(keys::BUDGETS).await)
}

/// Only the amount of a budget can change after it is saved.
pub async fn edit(
    store: &CollectionStore,
    id: &str,
    amount: Option<f64>,
) -> Result<Budget, RecordError> {
    let amount = validate::amount(amount)?;

    store
        .update(keys::BUDGETS, |budgets: &mut Vec<Budget>| {
            let mut shown = newest_first(std::mem::take(budgets));
            let edited = shown
                .iter_mut()
                .find(|budget| budget.id == id)
                .map(|budget| {
                    budget.amount = amount;
                    budget.clone()
                })
                .ok_or_else(|| RecordError::NotFound(format!("Budget {id}")));
            *budgets = oldest_first(shown);
            edited
        })
        .await
}

pub async fn delete(store: &CollectionStore, id: &str) -> Result<(), RecordError> {
    store
        .update(keys::BUDGETS, |budgets: &mut Vec<Budget>| {
            let before = budgets.len();
            budgets.retain(|budget| budget.id != id);
            if budgets.len() == before {
                return Err(RecordError::NotFound(format!("Budget {id}")));
            }
            Ok(())
        })
        .await?;

    info!(id, "deleted budget");
    Ok(())
}

/// Categories a budget can be set for: `Overall` and every expense category.
pub async fn budget_categories(store: &CollectionStore) -> Vec<String> {
    let mut options = vec![OVERALL.to_string()];
    options.extend(categories::list(store).await);
    options
}

#[cfg(test)]
pub(crate) fn new_budget(
    category: &str,
    amount: f64,
    start_date: chrono::DateTime<chrono::Utc>,
    end_date: chrono::DateTime<chrono::Utc>,
) -> NewBudget {
    NewBudget {
        category: category.to_string(),
        amount: Some(amount),
        start_date: Some(start_date),
        end_date: Some(end_date),
    }
}
