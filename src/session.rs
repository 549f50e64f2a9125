// Session context: bearer token and cached display fields, persisted in client storage
// Components that care about login/logout subscribe instead of polling storage.

use crate::error::StorageError;
use crate::storage::{keys, ClientStorage};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDisplay {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated,
    // Cleared because the backend answered 401
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub user: Option<UserDisplay>,
}

pub struct SessionContext {
    storage: Arc<dyn ClientStorage>,
    // Serializes check-and-clear so concurrent 401s invalidate once
    transition: Mutex<()>,
    notify: watch::Sender<SessionSnapshot>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("snapshot", &*self.notify.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        let initial = SessionSnapshot {
            status: if storage.contains(keys::AUTH_TOKEN) {
                SessionStatus::Authenticated
            } else {
                SessionStatus::Anonymous
            },
            user: read_display(storage.as_ref()),
        };
        let (notify, _) = watch::channel(initial);
        Self {
            storage,
            transition: Mutex::new(()),
            notify,
        }
    }

    pub fn storage(&self) -> &Arc<dyn ClientStorage> {
        &self.storage
    }

    // Storage stays the source of truth, so a token written elsewhere is still picked up.
    pub fn token(&self) -> Option<String> {
        self.storage
            .get(keys::AUTH_TOKEN)
            .filter(|token| !token.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn user(&self) -> Option<UserDisplay> {
        read_display(self.storage.as_ref())
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.notify.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.notify.borrow().clone()
    }

    /// Persist a freshly issued token, with display fields when the backend sent them.
    pub fn establish(&self, token: &str, user: Option<UserDisplay>) -> Result<(), StorageError> {
        let _guard = self.transition.lock();
        self.storage.set(keys::AUTH_TOKEN, token)?;
        if let Some(user) = &user {
            write_display(self.storage.as_ref(), user)?;
        }
        tracing::info!("session established");
        self.publish(SessionStatus::Authenticated);
        Ok(())
    }

    pub fn update_user(&self, user: &UserDisplay) -> Result<(), StorageError> {
        write_display(self.storage.as_ref(), user)?;
        let status = self.notify.borrow().status;
        self.publish(status);
        Ok(())
    }

    // Explicit logout
    pub fn end(&self) -> Result<(), StorageError> {
        let _guard = self.transition.lock();
        for key in [
            keys::AUTH_TOKEN,
            keys::USER_NAME,
            keys::USER_EMAIL,
            keys::REDIRECT_AFTER_LOGIN,
        ] {
            self.storage.remove(key)?;
        }
        tracing::info!("session ended");
        self.publish(SessionStatus::Anonymous);
        Ok(())
    }

    /// Clear the token after an authorization failure.
    ///
    /// Returns `true` only for the call that found a token present, so the
    /// caller that gets `true` is the one that redirects. Storage failures while
    /// clearing are logged and do not change the answer.
    pub fn invalidate(&self) -> bool {
        let _guard = self.transition.lock();
        if self.token().is_none() {
            return false;
        }
        for key in [keys::AUTH_TOKEN, keys::USER_NAME, keys::USER_EMAIL] {
            if let Err(e) = self.storage.remove(key) {
                tracing::error!(key, error = %e, "failed to clear session key");
            }
        }
        tracing::warn!("session invalidated by authorization failure");
        self.publish(SessionStatus::Expired);
        true
    }

    pub fn remember_redirect(&self, path: &str) -> Result<(), StorageError> {
        self.storage.set(keys::REDIRECT_AFTER_LOGIN, path)
    }

    pub fn take_redirect(&self) -> Result<Option<String>, StorageError> {
        let path = self.storage.get(keys::REDIRECT_AFTER_LOGIN);
        if path.is_some() {
            self.storage.remove(keys::REDIRECT_AFTER_LOGIN)?;
        }
        Ok(path)
    }

    fn publish(&self, status: SessionStatus) {
        let snapshot = SessionSnapshot {
            status,
            user: read_display(self.storage.as_ref()),
        };
        self.notify.send_replace(snapshot);
    }
}

fn read_display(storage: &dyn ClientStorage) -> Option<UserDisplay> {
    match (storage.get(keys::USER_NAME), storage.get(keys::USER_EMAIL)) {
        (Some(name), Some(email)) => Some(UserDisplay { name, email }),
        _ => None,
    }
}

fn write_display(storage: &dyn ClientStorage, user: &UserDisplay) -> Result<(), StorageError> {
    storage.set(keys::USER_NAME, &user.name)?;
    storage.set(keys::USER_EMAIL, &user.email)
}
