use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use crate::repository::UserRepository;
use crate::{CoreError, CoreResult};

const MAX_USERNAME_LEN: usize = 64;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Passenger,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Passenger => "PASSENGER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "PASSENGER" => Ok(Role::Passenger),
            other => Err(CoreError::InternalError(format!("Unknown role: {}", other))),
        }
    }
}

/// A stored account. The hash is an Argon2id PHC string.
#[derive(Clone)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

pub fn hash_password(password: &str) -> CoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CoreError::InternalError(format!("Password hashing failed: {}", e)))
}

/// Malformed stored hashes count as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// Verified against when the username is unknown, so both failure paths cost one hash.
fn decoy_hash() -> &'static str {
    static DECOY: OnceLock<String> = OnceLock::new();
    DECOY.get_or_init(|| hash_password("decoy-password-never-matches").unwrap_or_default())
}

async fn run_blocking<T, F>(f: F) -> CoreResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CoreError::InternalError(format!("Hashing task failed: {}", e)))
}

/// Signup and login over a `UserRepository`.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn signup(&self, username: &str, password: &str) -> CoreResult<()> {
        self.create(username, password, Role::Passenger).await
    }

    /// True iff the exact pair was signed up. Never says which half was wrong.
    pub async fn login(&self, username: &str, password: &str) -> CoreResult<bool> {
        Ok(self.authenticate(username, password).await?.is_some())
    }

    /// Like `login`, but yields the account's role on success.
    pub async fn authenticate(&self, username: &str, password: &str) -> CoreResult<Option<Role>> {
        let user = self.repo.get_user(username.trim()).await?;

        let (stored_hash, role) = match &user {
            Some(u) => (u.password_hash.clone(), Some(u.role)),
            None => (decoy_hash().to_string(), None),
        };

        let password = password.to_string();
        let matched = run_blocking(move || verify_password(&password, &stored_hash)).await?;

        match role {
            Some(role) if matched => Ok(Some(role)),
            _ => {
                warn!("Rejected login attempt");
                Ok(None)
            }
        }
    }

    /// Creates the admin account unless the username already exists.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> CoreResult<()> {
        if self.repo.get_user(username.trim()).await?.is_some() {
            return Ok(());
        }
        match self.create(username, password, Role::Admin).await {
            Ok(()) => {
                info!("Bootstrapped admin account {}", username.trim());
                Ok(())
            }
            // Lost a race with another bootstrap.
            Err(CoreError::DuplicateUsername(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, username: &str, password: &str, role: Role) -> CoreResult<()> {
        let username = validate_username(username)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let password = password.to_string();
        let password_hash = run_blocking(move || hash_password(&password)).await??;

        self.repo.create_user(&username, &password_hash, role).await?;
        info!("User {} signed up as {}", username, role);
        Ok(())
    }
}

fn validate_username(raw: &str) -> CoreResult<String> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(CoreError::ValidationError("Username is required".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(CoreError::ValidationError(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }
    Ok(username.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryUsers {
        users: Mutex<HashMap<String, UserRecord>>,
    }

    #[async_trait]
    impl UserRepository for MemoryUsers {
        async fn create_user(&self, username: &str, password_hash: &str, role: Role) -> CoreResult<()> {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(username) {
                return Err(CoreError::DuplicateUsername(username.to_string()));
            }
            users.insert(username.to_string(), UserRecord {
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                role,
            });
            Ok(())
        }

        async fn get_user(&self, username: &str) -> CoreResult<Option<UserRecord>> {
            Ok(self.users.lock().unwrap().get(username).cloned())
        }
    }

    #[test]
    fn test_hash_is_salted_and_verifiable() {
        let a = hash_password("correct horse").unwrap();
        let b = hash_password("correct horse").unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &a));
        assert!(!verify_password("correct horse!", &a));
        assert!(!verify_password("correct horse", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let repo = Arc::new(MemoryUsers::default());
        let service = UserService::new(repo.clone());

        service.signup("priya", "s3cret-pass").await.unwrap();

        let stored = repo.get_user("priya").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "s3cret-pass");
        assert_eq!(stored.role, Role::Passenger);

        assert!(service.login("priya", "s3cret-pass").await.unwrap());
        assert!(!service.login("priya", "wrong-pass").await.unwrap());
        assert!(!service.login("nobody", "s3cret-pass").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_and_invalid_signup() {
        let service = UserService::new(Arc::new(MemoryUsers::default()));
        service.signup("arjun", "password-1").await.unwrap();

        let dup = service.signup("arjun", "password-2").await.unwrap_err();
        assert!(matches!(dup, CoreError::DuplicateUsername(_)));

        let short = service.signup("kiran", "short").await.unwrap_err();
        assert!(matches!(short, CoreError::ValidationError(_)));

        let blank = service.signup("   ", "password-3").await.unwrap_err();
        assert!(matches!(blank, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let repo = Arc::new(MemoryUsers::default());
        let service = UserService::new(repo.clone());

        service.ensure_admin("admin", "admin-password").await.unwrap();
        service.ensure_admin("admin", "other-password").await.unwrap();

        assert_eq!(
            service.authenticate("admin", "admin-password").await.unwrap(),
            Some(Role::Admin)
        );
        assert_eq!(service.authenticate("admin", "other-password").await.unwrap(), None);
    }
}
