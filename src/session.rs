use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{AuthError, FieldErrors, StorageError};
use crate::models::{Session, UserRecord};
use crate::storage::{Storage, SESSION_KEY, USERS_KEY};

pub const PASSWORD_MIN: usize = 5;
pub const FULL_NAME_MIN: usize = 3;

/// Gatekeeper for every protected command. Owns the session record and the
/// registered-user list; nothing else reads those keys directly.
pub struct SessionGate {
    storage: Arc<dyn Storage>,
}

impl SessionGate {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        SessionGate { storage }
    }

    /// The active session, if any. A session record that no longer parses
    /// is discarded rather than trusted.
    pub fn current(&self) -> Result<Option<Session>, StorageError> {
        match self.storage.get(SESSION_KEY)? {
            Some(raw) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => Ok(Some(session)),
                Err(err) => {
                    warn!(key = SESSION_KEY, %err, "stored session is corrupt, discarding");
                    self.storage.remove(SESSION_KEY)?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.current(), Ok(Some(session)) if session.is_authenticated)
    }

    /// Remove the session record. Every gate over the same partition,
    /// including ones constructed earlier, reports unauthenticated on its
    /// next check.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(SESSION_KEY)
    }

    /// Register an account. Credentials are validated into the same
    /// field-keyed map shape the ticket draft uses; a duplicate email is a
    /// separate failure so the caller can word it distinctly.
    pub fn sign_up(&self, email: &str, full_name: &str, password: &str) -> Result<UserRecord, AuthError> {
        let errors = validate_credentials(email, full_name, password);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let email = email.trim();
        let mut users = self.load_users()?;
        if users.iter().any(|u| u.email == email) {
            return Err(AuthError::EmailTaken);
        }

        let salt = new_salt();
        let user = UserRecord {
            id: Utc::now().timestamp_millis(),
            email: email.to_string(),
            full_name: full_name.trim().to_string(),
            password_hash: hash_password(&salt, password),
            password_salt: salt,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        self.persist_users(&users)?;
        info!(email = %user.email, "registered account");
        Ok(user)
    }

    /// Check credentials and write the session record. Wrong credentials
    /// are a normal failure, indistinguishable between unknown email and
    /// wrong password.
    pub fn log_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        let users = self.load_users()?;
        let user = users
            .iter()
            .find(|u| u.email == email && u.password_hash == hash_password(&u.password_salt, password))
            .ok_or(AuthError::InvalidCredentials)?;

        let session = Session {
            is_authenticated: true,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            login_time: Utc::now(),
        };
        let raw = serde_json::to_string(&session).map_err(|source| StorageError::EncodeFailed {
            key: SESSION_KEY.to_string(),
            source,
        })?;
        self.storage.set(SESSION_KEY, &raw)?;
        info!(email = %session.email, "logged in");
        Ok(session)
    }

    fn load_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        match self.storage.get(USERS_KEY)? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(users) => Ok(users),
                Err(err) => {
                    warn!(key = USERS_KEY, %err, "stored user list is corrupt, starting empty");
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }

    fn persist_users(&self, users: &[UserRecord]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(users).map_err(|source| StorageError::EncodeFailed {
            key: USERS_KEY.to_string(),
            source,
        })?;
        self.storage.set(USERS_KEY, &raw)
    }
}

fn validate_credentials(email: &str, full_name: &str, password: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let email = email.trim();
    if email.is_empty() {
        errors.insert("email", "Email is required".to_string());
    } else if !looks_like_email(email) {
        errors.insert("email", "Email must be a valid email address".to_string());
    }

    if password.trim().is_empty() {
        errors.insert("password", "Password is required".to_string());
    } else if password.chars().count() < PASSWORD_MIN {
        errors.insert("password", "Password must be at least 5 characters".to_string());
    }

    let full_name = full_name.trim();
    if full_name.is_empty() {
        errors.insert("fullName", "Full name is required".to_string());
    } else if full_name.chars().count() < FULL_NAME_MIN {
        errors.insert("fullName", "Full name must be at least 3 characters".to_string());
    }

    errors
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

// Clock plus a process-local counter, so two registrations in the same
// instant still get distinct salts.
fn new_salt() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{nanos:024x}{n:08x}")
}

// Salted digest, not a production KDF: this is a single-user local tool and
// the stored value only has to be non-recoverable by casual inspection.
fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
