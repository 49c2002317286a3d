//! Credential check, login/logout and self-registration.
//!
//! Passwords are stored and compared as plain text.

use crate::errors::{RecordError, StoreError};
use crate::models::{RegisterRequest, Role, User};
use crate::session::SessionContext;
use crate::store::{keys, CollectionStore};
use crate::validate;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

pub const ADMIN_USERNAME: &str = "admin1";
pub const ADMIN_EMAIL: &str = "admin1@email.com";
pub const ADMIN_PASSWORD: &str = "admin1Pass";

/// The built-in administrator. It is never written to `registeredUsers`.
pub fn admin_user() -> User {
    User {
        username: ADMIN_USERNAME.to_string(),
        email: ADMIN_EMAIL.to_string(),
        password: ADMIN_PASSWORD.to_string(),
        role: Role::Admin,
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please enter both username/email and password")]
    EmptyFields,

    #[error("No users found. Please register first.")]
    NoUsers,

    #[error("User not found. Please check your credentials.")]
    UserNotFound,

    #[error("Incorrect password. Please try again.")]
    WrongPassword,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Finds the account `identifier` names and checks `password` against it.
/// The built-in administrator is tried first. `users` is `None` when nobody
/// has ever registered; an empty list means every account was removed.
pub fn authenticate(
    users: Option<&[User]>,
    identifier: &str,
    password: &str,
) -> Result<User, AuthError> {
    if identifier.trim().is_empty() || password.trim().is_empty() {
        return Err(AuthError::EmptyFields);
    }

    let admin = admin_user();
    if admin.matches_identifier(identifier) && admin.password == password {
        return Ok(admin);
    }

    let users = users.ok_or(AuthError::NoUsers)?;
    let user = users
        .iter()
        .find(|user| user.matches_identifier(identifier))
        .ok_or(AuthError::UserNotFound)?;

    if user.password != password {
        return Err(AuthError::WrongPassword);
    }
    Ok(user.clone())
}

pub async fn login(
    store: &CollectionStore,
    session: &SessionContext,
    identifier: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<User, AuthError> {
    let users: Option<Vec<User>> = if store.contains(keys::REGISTERED_USERS).await {
        Some(store.get(keys::REGISTERED_USERS).await)
    } else {
        None
    };
    let user = match authenticate(users.as_deref(), identifier, password) {
        Ok(user) => user,
        Err(err) => {
            warn!(identifier, "login rejected: {err}");
            return Err(err);
        }
    };

    store.set_item(keys::CURRENT_USER, &user).await?;
    session.begin(user.clone()).await;
    info!(username = %user.username, role = ?user.role, "logged in");

    // Analytics only; a failure here does not undo the login.
    if let Err(err) = record_login(store, now).await {
        error!("failed to record login: {err}");
    }
    Ok(user)
}

pub async fn record_login(store: &CollectionStore, at: DateTime<Utc>) -> Result<(), StoreError> {
    store
        .update(keys::LOGIN_TIMESTAMPS, |timestamps: &mut Vec<DateTime<Utc>>| {
            timestamps.push(at);
            Ok(())
        })
        .await
}

pub async fn logout(store: &CollectionStore, session: &SessionContext) -> Result<(), StoreError> {
    store.remove(keys::CURRENT_USER).await?;
    if let Some(user) = session.end().await {
        info!(username = %user.username, "logged out");
    }
    Ok(())
}

pub async fn register(store: &CollectionStore, request: RegisterRequest) -> Result<User, RecordError> {
    let RegisterRequest {
        username,
        email,
        password,
        confirm_password,
    } = request;

    if confirm_password.trim().is_empty() {
        return Err(RecordError::invalid("All fields are required"));
    }
    validate::credentials(&username, &email, &password)?;
    if password != confirm_password {
        return Err(RecordError::invalid("Passwords do not match"));
    }

    let user = User {
        username,
        email,
        password,
        role: Role::User,
    };
    insert_user(store, user).await
}

/// Appends `user` unless its username or email is already taken, by a
/// stored account or by the built-in administrator.
pub(crate) async fn insert_user(store: &CollectionStore, user: User) -> Result<User, RecordError> {
    let created = store
        .update(keys::REGISTERED_USERS, |users: &mut Vec<User>| {
            let taken = admin_user().conflicts_with(&user.username, &user.email)
                || users
                    .iter()
                    .any(|existing| existing.conflicts_with(&user.username, &user.email));
            if taken {
                return Err(RecordError::Duplicate(
                    "Username or email already exists".to_string(),
                ));
            }
            users.push(user.clone());
            Ok(user)
        })
        .await?;

    info!(username = %created.username, "registered user");
    Ok(created)
}
