use crate::auth::insert_user;
use crate::errors::RecordError;
use crate::models::{NewUserRequest, Role, User, UserProfile};
use crate::store::{keys, CollectionStore};
use crate::validate;

/// Registered accounts in registration order, without passwords.
pub async fn list(store: &CollectionStore) -> Vec<UserProfile> {
    store
        .get::<User>(keys::REGISTERED_USERS)
        .await
        .iter()
        .map(UserProfile::from)
        .collect()
}

/// Account created by an administrator. Same rules as self-registration,
/// minus the password confirmation.
pub async fn create(store: &CollectionStore, request: NewUserRequest) -> Result<UserProfile, RecordError> {
    validate::credentials(&request.username, &request.email, &request.password)?;
    let user = User {
        username: request.username.trim().to_string(),
        email: request.email.trim().to_string(),
        password: request.password,
        role: Role::User,
    };
    let created = insert_user(store, user).await?;
    Ok(UserProfile::from(&created))
}
