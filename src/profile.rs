//! The display name shown on the profile screen.
//!
//! It is a device-wide label kept apart from the account records: changing it
//! never renames the logged-in user or affects how they log in.

use crate::errors::RecordError;
use crate::models::User;
use crate::store::{keys, CollectionStore};
use crate::validate;
use tracing::info;

/// The saved display name, or the user's own username when none was saved.
pub async fn display_name(store: &CollectionStore, user: &User) -> String {
    store
        .get_item::<String>(keys::DISPLAY_NAME)
        .await
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| user.username.clone())
}

pub async fn set_display_name(store: &CollectionStore, name: &str) -> Result<String, RecordError> {
    let name = validate::required(name, "Username cannot be empty")?;
    store.set_item(keys::DISPLAY_NAME, &name).await?;
    info!(display_name = %name, "changed display name");
    Ok(name)
}
