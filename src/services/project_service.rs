use crate::dto::project_dto::{CreateProjectPayload, UpdateProjectPayload};
use crate::error::{Error, Result};
use crate::models::project::{Project, DEFAULT_COLOR};
use crate::utils;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ProjectService {
    pool: PgPool,
}

impl ProjectService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, payload: CreateProjectPayload) -> Result<Project> {
        let color = payload.color.unwrap_or_else(|| DEFAULT_COLOR.to_string());
        if !utils::validation::is_hex_color(&color) {
            return Err(Error::Validation(format!(
                "Color must be a 7-character hex code like #FF5733, got {}",
                color
            )));
        }

        let now = utils::time::now();
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, name, description, color, is_active, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, TRUE, $5, $6, $6)
            RETURNING id, name, description, color, is_active, user_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(payload.name)
        .bind(payload.description)
        .bind(color)
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(project)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, color, is_active, user_id, created_at, updated_at
            FROM projects
            WHERE user_id = $1 AND is_active = TRUE
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Project> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, color, is_active, user_id, created_at, updated_at
            FROM projects
            WHERE id = $1 AND user_id = $2 AND is_active = TRUE
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        project.ok_or_else(|| Error::NotFound("Project not found".to_string()))
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        payload: UpdateProjectPayload,
    ) -> Result<Project> {
        if let Some(color) = payload.color.as_deref() {
            if !utils::validation::is_hex_color(color) {
                return Err(Error::Validation(format!(
                    "Color must be a 7-character hex code like #FF5733, got {}",
                    color
                )));
            }
        }

        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                color = COALESCE($5, color),
                is_active = COALESCE($6, is_active),
                updated_at = $7
            WHERE id = $1 AND user_id = $2
            RETURNING id, name, description, color, is_active, user_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(payload.name)
        .bind(payload.description)
        .bind(payload.color)
        .bind(payload.is_active)
        .bind(utils::time::now())
        .fetch_optional(&self.pool)
        .await?;

        project.ok_or_else(|| Error::NotFound("Project not found".to_string()))
    }

    /// Soft delete. Historical time entries keep their project reference;
    /// only default listings stop showing the project.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let res = sqlx::query(
            "UPDATE projects SET is_active = FALSE, updated_at = $3 WHERE id = $1 AND user_id = $2 AND is_active = TRUE",
        )
        .bind(id)
        .bind(user_id)
        .bind(utils::time::now())
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Project not found".to_string()));
        }
        Ok(())
    }

    /// Ownership check used by the time-entry lifecycle when an entry is
    /// tagged to a project. Only the owner's active projects qualify.
    pub async fn assert_owned(&self, user_id: Uuid, project_id: Uuid) -> Result<()> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM projects WHERE id = $1 AND user_id = $2 AND is_active = TRUE",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        if exists == 0 {
            return Err(Error::Validation(format!(
                "Project {} does not exist or is not owned by the caller",
                project_id
            )));
        }
        Ok(())
    }
}
