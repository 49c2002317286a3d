use crate::models::User;
use crate::store::{keys, CollectionStore};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Who is using the app right now. Only `begin` and `end` change it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Session {
    #[default]
    LoggedOut,
    LoggedIn(User),
}

impl Session {
    pub fn begin(&mut self, user: User) {
        *self = Session::LoggedIn(user);
    }

    /// Returns the user that was logged in, if any.
    pub fn end(&mut self) -> Option<User> {
        match std::mem::take(self) {
            Session::LoggedIn(user) => Some(user),
            Session::LoggedOut => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Session::LoggedIn(user) => Some(user),
            Session::LoggedOut => None,
        }
    }
}

#[derive(Clone, Default)]
pub struct SessionContext {
    session: Arc<Mutex<Session>>,
}

impl SessionContext {
    /// Picks up a login that survived a restart: a stored `currentUser`
    /// means someone is logged in.
    pub async fn restore(store: &CollectionStore) -> Self {
        let context = Self::default();
        if let Some(user) = store.get_item::<User>(keys::CURRENT_USER).await {
            info!(username = %user.username, "restored session");
            context.begin(user).await;
        }
        context
    }

    pub async fn begin(&self, user: User) {
        self.session.lock().await.begin(user);
    }

    pub async fn end(&self) -> Option<User> {
        self.session.lock().await.end()
    }

    pub async fn current(&self) -> Option<User> {
        self.session.lock().await.user().cloned()
    }
}
