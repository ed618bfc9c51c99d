use crate::dto::user_dto::UpdateUserPayload;
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::utils;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, first_name, last_name, time_zone, is_active, created_at, updated_at
            FROM users
            WHERE is_active = TRUE
            ORDER BY first_name ASC, last_name ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, first_name, last_name, time_zone, is_active, created_at, updated_at
            FROM users
            WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        user.ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub async fn update_profile(&self, user_id: Uuid, payload: UpdateUserPayload) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                time_zone = COALESCE($4, time_zone),
                updated_at = $5
            WHERE id = $1 AND is_active = TRUE
            RETURNING id, email, first_name, last_name, time_zone, is_active, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(payload.first_name)
        .bind(payload.last_name)
        .bind(payload.time_zone)
        .bind(utils::time::now())
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    /// Soft delete: the row stays for referential integrity, the user just
    /// disappears from default reads.
    pub async fn deactivate(&self, user_id: Uuid) -> Result<()> {
        let res = sqlx::query(
            "UPDATE users SET is_active = FALSE, updated_at = $2 WHERE id = $1 AND is_active = TRUE",
        )
        .bind(user_id)
        .bind(utils::time::now())
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(Error::NotFound("User not found".to_string()));
        }
        tracing::info!(%user_id, "User deactivated their account");
        Ok(())
    }
}
