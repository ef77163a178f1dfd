//! User repository

use crate::domain::{NewUser, StringUuid, User, UserProfilePatch};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the username or WeChat openid is taken.
    async fn create(&self, input: &NewUser) -> Result<User>;
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_wechat_openid(&self, openid: &str) -> Result<Option<User>>;
    async fn update_profile(&self, id: StringUuid, patch: &UserProfilePatch) -> Result<User>;
    async fn bind_wechat(&self, id: StringUuid, openid: &str) -> Result<()>;
}

pub struct UserRepositoryImpl {
    pool: MySqlPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, username, password_hash, role, phone, avatar, nickname, wechat_openid, created_at, updated_at";

fn map_unique_violation(e: sqlx::Error, message: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, input: &NewUser) -> Result<User> {
        let id = StringUuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, phone, avatar, nickname, wechat_openid, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(&input.username)
        .bind(&input.password_hash)
        .bind(input.role)
        .bind(&input.phone)
        .bind(&input.avatar)
        .bind(&input.nickname)
        .bind(&input.wechat_openid)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Username already exists"))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create user")))
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_wechat_openid(&self, openid: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE wechat_openid = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(openid)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_profile(&self, id: StringUuid, patch: &UserProfilePatch) -> Result<User> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET nickname = COALESCE(?, nickname),
                avatar = COALESCE(?, avatar),
                phone = COALESCE(?, phone),
                updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(&patch.nickname)
        .bind(&patch.avatar)
        .bind(&patch.phone)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn bind_wechat(&self, id: StringUuid, openid: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET wechat_openid = ?, updated_at = NOW() WHERE id = ?",
        )
        .bind(openid)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "This WeChat account is bound to another user"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }
}
