//! Category labels and their cascade onto expenses.
//!
//! Renaming or deleting a category takes two writes, the category list and
//! then the expenses. They are not atomic together.

use crate::errors::RecordError;
use crate::models::{CategoryDeletion, Expense};
use crate::store::{keys, CollectionStore};
use crate::validate;
use tracing::info;

pub const DEFAULT_CATEGORIES: [&str; 5] = ["Food", "Bills", "Transport", "Entertainment", "Other"];

fn defaults() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|name| name.to_string()).collect()
}

fn clean_name(name: &str) -> Result<String, RecordError> {
    validate::required(name, "Category name cannot be empty.")
}

fn ensure_unique(categories: &[String], name: &str, renaming: Option<&str>) -> Result<(), RecordError> {
    let lowered = name.to_lowercase();
    let taken = categories
        .iter()
        .any(|existing| existing.to_lowercase() == lowered && Some(existing.as_str()) != renaming);
    if taken {
        return Err(RecordError::Duplicate("Category name already exists.".to_string()));
    }
    Ok(())
}

/// The stored categories, or the default set if none were ever saved.
pub async fn list(store: &CollectionStore) -> Vec<String> {
    if store.contains(keys::CATEGORIES).await {
        store.get(keys::CATEGORIES).await
    } else {
        defaults()
    }
}

pub async fn add(store: &CollectionStore, name: &str) -> Result<Vec<String>, RecordError> {
    let name = clean_name(name)?;
    let categories = store
        .update_or_else(keys::CATEGORIES, defaults, |categories: &mut Vec<String>| {
            ensure_unique(categories, &name, None)?;
            categories.push(name.clone());
            Ok::<_, RecordError>(categories.clone())
        })
        .await?;

    info!(category = %name, "added category");
    Ok(categories)
}

/// Renames `old` to `new` in the category list, then on every expense
/// filed under `old`.
pub async fn rename(store: &CollectionStore, old: &str, new: &str) -> Result<Vec<String>, RecordError> {
    let new = clean_name(new)?;

    let categories = store
        .update_or_else(keys::CATEGORIES, defaults, |categories: &mut Vec<String>| {
            if !categories.iter().any(|existing| existing == old) {
                return Err(RecordError::NotFound(format!("Category \"{old}\"")));
            }
            ensure_unique(categories, &new, Some(old))?;
            for existing in categories.iter_mut().filter(|existing| existing.as_str() == old) {
                *existing = new.clone();
            }
            Ok(categories.clone())
        })
        .await?;

    let moved = store
        .update(keys::EXPENSES, |expenses: &mut Vec<Expense>| {
            let mut moved = 0usize;
            for expense in expenses.iter_mut().filter(|expense| expense.category == old) {
                expense.category = new.clone();
                moved += 1;
            }
            Ok::<_, RecordError>(moved)
        })
        .await?;

    info!(from = old, to = %new, expenses = moved, "renamed category");
    Ok(categories)
}

/// Removes `name` from the category list, then deletes every expense filed
/// under it.
pub async fn delete(store: &CollectionStore, name: &str) -> Result<CategoryDeletion, RecordError> {
    let categories = store
        .update_or_else(keys::CATEGORIES, defaults, |categories: &mut Vec<String>| {
            let before = categories.len();
            categories.retain(|existing| existing != name);
            if categories.len() == before {
                return Err(RecordError::NotFound(format!("Category \"{name}\"")));
            }
            Ok(categories.clone())
        })
        .await?;

    let removed_expenses = store
        .update(keys::EXPENSES, |expenses: &mut Vec<Expense>| {
            let before = expenses.len();
            expenses.retain(|expense| expense.category != name);
            Ok::<_, RecordError>(before - expenses.len())
        })
        .await?;

    info!(category = name, removed_expenses, "deleted category");
    Ok(CategoryDeletion {
        categories,
        removed_expenses,
    })
}
