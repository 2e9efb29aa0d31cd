use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use rail_core::identity::UserRecord;
use rail_core::repository::UserRepository;
use rail_core::{CoreError, CoreResult, Role};

use crate::{is_unique_violation, storage_error};

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    username: String,
    password_hash: String,
    role: String,
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, username: &str, password_hash: &str, role: Role) -> CoreResult<()> {
        sqlx::query("INSERT INTO users (username, password_hash, role, created_at) VALUES (?, ?, ?, ?)")
            .bind(username)
            .bind(password_hash)
            .bind(role.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    CoreError::DuplicateUsername(username.to_string())
                } else {
                    storage_error(e)
                }
            })?;
        Ok(())
    }

    async fn get_user(&self, username: &str) -> CoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT username, password_hash, role FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.map(|r| -> CoreResult<UserRecord> {
            Ok(UserRecord {
                username: r.username,
                password_hash: r.password_hash,
                role: r.role.parse()?,
            })
        })
        .transpose()
    }
}
