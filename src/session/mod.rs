//! Session flow — hardcoded two-account login gate.
//!
//! The dashboard is unlocked by one of two fixed accounts. A successful login
//! persists the identity under [`SESSION_USER_KEY`] so the next start restores
//! it; logout clears both the in-memory and the persisted copy.
//!
//! Login waits for a simulated delay before resolving. While an attempt is
//! pending no second attempt is accepted.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, StorageError};
use crate::storage::{KeyValueStore, SESSION_USER_KEY};

/// Default simulated login latency.
pub const DEFAULT_LOGIN_DELAY_MS: u64 = 800;

const ACCOUNTS: [(&str, &str, Role); 2] = [
    ("admin", "admin123", Role::Admin),
    ("user", "user123", Role::User),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

/// The logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub username: String,
    pub role: Role,
}

/// Check credentials against the fixed account table.
pub fn authenticate(username: &str, password: &str) -> Result<UserIdentity, AuthError> {
    ACCOUNTS
        .iter()
        .find(|(u, p, _)| *u == username && *p == password)
        .map(|(u, _, role)| UserIdentity {
            username: (*u).to_string(),
            role: *role,
        })
        .ok_or(AuthError::InvalidCredentials)
}

/// Holds the current identity and the pending-attempt flag.
#[derive(Debug)]
pub struct SessionFlow {
    user: Option<UserIdentity>,
    attempt_pending: bool,
    delay: Duration,
}

impl SessionFlow {
    pub fn new(delay: Duration) -> Self {
        Self {
            user: None,
            attempt_pending: false,
            delay,
        }
    }

    /// Restore a persisted identity. Unreadable or corrupt records mean
    /// logged out.
    pub fn restore(store: &dyn KeyValueStore, delay: Duration) -> Self {
        let mut session = Self::new(delay);
        session.user = store
            .get(SESSION_USER_KEY)
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_str(&raw).ok());
        session
    }

    pub fn current(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_attempt_pending(&self) -> bool {
        self.attempt_pending
    }

    /// Wait out the simulated delay, then check credentials.
    ///
    /// On success the identity is held in memory and persisted. A persistence
    /// failure does not undo the login; it is returned as the second element.
    pub fn login(
        &mut self,
        store: &mut dyn KeyValueStore,
        username: &str,
        password: &str,
    ) -> Result<(UserIdentity, Option<StorageError>), AuthError> {
        if self.attempt_pending {
            return Err(AuthError::AttemptPending);
        }
        self.attempt_pending = true;
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let outcome = authenticate(username, password);
        self.attempt_pending = false;

        let user = outcome?;
        let persist_error = match serde_json::to_string(&user) {
            Ok(json) => store.set(SESSION_USER_KEY, &json).err(),
            Err(e) => Some(StorageError::Serialize {
                key: SESSION_USER_KEY.to_string(),
                details: e.to_string(),
            }),
        };

        self.user = Some(user.clone());
        Ok((user, persist_error))
    }

    /// Forget the identity in memory and in storage.
    pub fn logout(&mut self, store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        self.user = None;
        store.remove(SESSION_USER_KEY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
