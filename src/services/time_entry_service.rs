use crate::dto::time_entry_dto::{
    CreateTimeEntryPayload, StartTimeEntryPayload, TimeEntryListQuery, UpdateTimeEntryPayload,
};
use crate::error::{Error, Result};
use crate::models::time_entry::TimeEntry;
use crate::services::project_service::ProjectService;
use crate::utils;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const ENTRY_COLUMNS: &str =
    "id, start_time, end_time, description, is_running, user_id, project_id, created_at, updated_at";

#[derive(Clone)]
pub struct TimeEntryService {
    pool: PgPool,
    projects: ProjectService,
}

pub struct TimeEntryList {
    pub items: Vec<TimeEntry>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl TimeEntryService {
    pub fn new(pool: PgPool) -> Self {
        let projects = ProjectService::new(pool.clone());
        Self { pool, projects }
    }

    /// Opens a running entry at the current wall-clock time. A user may
    /// have at most one running entry; a second start is rejected.
    pub async fn start(&self, user_id: Uuid, payload: StartTimeEntryPayload) -> Result<TimeEntry> {
        if let Some(project_id) = payload.project_id {
            self.projects.assert_owned(user_id, project_id).await?;
        }

        let mut tx = self.pool.begin().await?;
        self.assert_none_running(&mut tx, user_id, None).await?;
        let entry = insert_entry(
            &mut tx,
            user_id,
            utils::time::now(),
            None,
            payload.description,
            payload.project_id,
        )
        .await?;
        tx.commit().await?;

        tracing::debug!(entry_id = %entry.id, %user_id, "Started time entry");
        Ok(entry)
    }

    /// Closes a running entry. Stopping an entry that already has an end
    /// time is an invalid state transition, not a no-op.
    pub async fn stop(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        end_time: DateTime<Utc>,
    ) -> Result<TimeEntry> {
        let entry = self.get(user_id, entry_id).await?;
        if !entry.is_running {
            return Err(Error::InvalidState(
                "Time entry is already stopped".to_string(),
            ));
        }
        if end_time < entry.start_time {
            return Err(Error::Validation(
                "End time must not be before start time".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, TimeEntry>(&format!(
            r#"
            UPDATE time_entries
            SET end_time = $3, is_running = FALSE, updated_at = $4
            WHERE id = $1 AND user_id = $2 AND is_running = TRUE
            RETURNING {ENTRY_COLUMNS}
            "#,
        ))
        .bind(entry_id)
        .bind(user_id)
        .bind(end_time)
        .bind(utils::time::now())
        .fetch_optional(&self.pool)
        .await?;

        // A concurrent stop can win between the read and the write.
        updated.ok_or_else(|| Error::InvalidState("Time entry is already stopped".to_string()))
    }

    /// Direct creation of an entry. Omitting the end time creates a running
    /// entry, subject to the same single-running check as `start`.
    pub async fn create(&self, user_id: Uuid, payload: CreateTimeEntryPayload) -> Result<TimeEntry> {
        if let Some(end) = payload.end_time {
            if end < payload.start_time {
                return Err(Error::Validation(
                    "End time must not be before start time".to_string(),
                ));
            }
        }
        if let Some(project_id) = payload.project_id {
            self.projects.assert_owned(user_id, project_id).await?;
        }

        let mut tx = self.pool.begin().await?;
        if payload.end_time.is_none() {
            self.assert_none_running(&mut tx, user_id, None).await?;
        }
        let entry = insert_entry(
            &mut tx,
            user_id,
            payload.start_time,
            payload.end_time,
            payload.description,
            payload.project_id,
        )
        .await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Patch update. Setting an end time on a running entry stops it;
    /// clearing the end time re-opens the entry, which is only allowed
    /// while no other entry of the user is running.
    pub async fn update(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        payload: UpdateTimeEntryPayload,
    ) -> Result<TimeEntry> {
        if let Some(Some(project_id)) = payload.project_id {
            self.projects.assert_owned(user_id, project_id).await?;
        }

        let mut tx = self.pool.begin().await?;
        let entry = sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = $1 AND user_id = $2 FOR UPDATE",
        ))
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Time entry not found".to_string()))?;

        let patch = apply_patch(&entry, &payload)?;
        if patch.reopens {
            self.assert_none_running(&mut tx, user_id, Some(entry_id))
                .await?;
        }

        let updated = sqlx::query_as::<_, TimeEntry>(&format!(
            r#"
            UPDATE time_entries
            SET start_time = $3, end_time = $4, description = $5, is_running = $6,
                project_id = $7, updated_at = $8
            WHERE id = $1 AND user_id = $2
            RETURNING {ENTRY_COLUMNS}
            "#,
        ))
        .bind(entry_id)
        .bind(user_id)
        .bind(patch.start_time)
        .bind(patch.end_time)
        .bind(patch.description)
        .bind(patch.is_running)
        .bind(patch.project_id)
        .bind(utils::time::now())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Row removal is the storage layer's concern; the core only scopes it
    /// to the owner.
    pub async fn delete(&self, user_id: Uuid, entry_id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM time_entries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Time entry not found".to_string()));
        }
        Ok(())
    }

    pub async fn get(&self, user_id: Uuid, entry_id: Uuid) -> Result<TimeEntry> {
        let entry = sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = $1 AND user_id = $2",
        ))
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        entry.ok_or_else(|| Error::NotFound("Time entry not found".to_string()))
    }

    pub async fn get_running(&self, user_id: Uuid) -> Result<Option<TimeEntry>> {
        let entry = sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM time_entries WHERE user_id = $1 AND is_running = TRUE",
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    pub async fn list(&self, user_id: Uuid, query: TimeEntryListQuery) -> Result<TimeEntryList> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(50).clamp(1, 200);
        let offset = (page - 1) * per_page;

        let mut filters = String::from("WHERE user_id = $1");
        let mut idx = 1;
        if query.project_id.is_some() {
            idx += 1;
            filters.push_str(&format!(" AND project_id = ${}", idx));
        }
        if query.running.is_some() {
            idx += 1;
            filters.push_str(&format!(" AND is_running = ${}", idx));
        }
        if query.from.is_some() {
            idx += 1;
            filters.push_str(&format!(" AND start_time >= ${}", idx));
        }
        if query.to.is_some() {
            idx += 1;
            filters.push_str(&format!(" AND start_time <= ${}", idx));
        }

        let items_query = format!(
            "SELECT {ENTRY_COLUMNS} FROM time_entries {} ORDER BY start_time DESC, id DESC LIMIT ${} OFFSET ${}",
            filters,
            idx + 1,
            idx + 2
        );
        let total_query = format!("SELECT COUNT(*) FROM time_entries {}", filters);

        let mut items_statement = sqlx::query_as::<_, TimeEntry>(&items_query).bind(user_id);
        let mut total_statement = sqlx::query_scalar::<_, i64>(&total_query).bind(user_id);
        if let Some(project_id) = query.project_id {
            items_statement = items_statement.bind(project_id);
            total_statement = total_statement.bind(project_id);
        }
        if let Some(running) = query.running {
            items_statement = items_statement.bind(running);
            total_statement = total_statement.bind(running);
        }
        if let Some(from) = query.from {
            items_statement = items_statement.bind(from);
            total_statement = total_statement.bind(from);
        }
        if let Some(to) = query.to {
            items_statement = items_statement.bind(to);
            total_statement = total_statement.bind(to);
        }

        let items = items_statement
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let total = total_statement.fetch_one(&self.pool).await?;
        let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

        Ok(TimeEntryList {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    /// Locks any running entry of the user and fails with a conflict when
    /// one exists. Callers hold the transaction open until after their
    /// insert/update; the partial unique index on (user_id) WHERE
    /// is_running backstops races that this check cannot see.
    async fn assert_none_running(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        exclude: Option<Uuid>,
    ) -> Result<()> {
        let running = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM time_entries WHERE user_id = $1 AND is_running = TRUE AND id != COALESCE($2, '00000000-0000-0000-0000-000000000000'::uuid) FOR UPDATE",
        )
        .bind(user_id)
        .bind(exclude)
        .fetch_optional(&mut **tx)
        .await?;

        match running {
            Some(id) => Err(Error::Conflict(format!(
                "Another time entry ({}) is already running",
                id
            ))),
            None => Ok(()),
        }
    }
}

async fn insert_entry(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    description: Option<String>,
    project_id: Option<Uuid>,
) -> Result<TimeEntry> {
    let now = utils::time::now();
    let entry = sqlx::query_as::<_, TimeEntry>(&format!(
        r#"
        INSERT INTO time_entries (id, start_time, end_time, description, is_running, user_id, project_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
        RETURNING {ENTRY_COLUMNS}
        "#,
    ))
    .bind(Uuid::new_v4())
    .bind(start_time)
    .bind(end_time)
    .bind(description)
    .bind(end_time.is_none())
    .bind(user_id)
    .bind(project_id)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;
    Ok(entry)
}

struct EntryPatch {
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    description: Option<String>,
    project_id: Option<Uuid>,
    is_running: bool,
    /// True when the patch cleared the end time of a stopped entry.
    reopens: bool,
}

/// Merges a patch payload over the stored entry and derives the resulting
/// running state. Pure so the transition rules are testable without a
/// database.
fn apply_patch(entry: &TimeEntry, payload: &UpdateTimeEntryPayload) -> Result<EntryPatch> {
    let start_time = payload.start_time.unwrap_or(entry.start_time);
    let end_time = match payload.end_time {
        Some(end) => end,
        None => entry.end_time,
    };
    let description = payload.description.clone().or_else(|| entry.description.clone());
    let project_id = match payload.project_id {
        Some(project) => project,
        None => entry.project_id,
    };

    if let Some(end) = end_time {
        if end < start_time {
            return Err(Error::Validation(
                "End time must not be before start time".to_string(),
            ));
        }
    }

    let is_running = end_time.is_none();
    Ok(EntryPatch {
        start_time,
        end_time,
        description,
        project_id,
        is_running,
        reopens: is_running && !entry.is_running,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn stopped_entry() -> TimeEntry {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        TimeEntry {
            id: Uuid::new_v4(),
            start_time: start,
            end_time: Some(start + Duration::hours(1)),
            description: Some("design".to_string()),
            is_running: false,
            user_id: Uuid::new_v4(),
            project_id: Some(Uuid::new_v4()),
            created_at: start,
            updated_at: start,
        }
    }

    fn running_entry() -> TimeEntry {
        let mut entry = stopped_entry();
        entry.end_time = None;
        entry.is_running = true;
        entry
    }

    #[test]
    fn description_only_patch_leaves_everything_else_unchanged() {
        let entry = stopped_entry();
        let payload = UpdateTimeEntryPayload {
            description: Some("review".to_string()),
            ..Default::default()
        };
        let patch = apply_patch(&entry, &payload).unwrap();
        assert_eq!(patch.start_time, entry.start_time);
        assert_eq!(patch.end_time, entry.end_time);
        assert_eq!(patch.project_id, entry.project_id);
        assert_eq!(patch.description.as_deref(), Some("review"));
        assert!(!patch.is_running);
        assert!(!patch.reopens);
    }

    #[test]
    fn setting_end_time_stops_a_running_entry() {
        let entry = running_entry();
        let payload = UpdateTimeEntryPayload {
            end_time: Some(Some(entry.start_time + Duration::minutes(30))),
            ..Default::default()
        };
        let patch = apply_patch(&entry, &payload).unwrap();
        assert!(!patch.is_running);
        assert!(!patch.reopens);
    }

    #[test]
    fn clearing_end_time_reopens_a_stopped_entry() {
        let entry = stopped_entry();
        let payload = UpdateTimeEntryPayload {
            end_time: Some(None),
            ..Default::default()
        };
        let patch = apply_patch(&entry, &payload).unwrap();
        assert!(patch.is_running);
        assert!(patch.reopens);
        assert!(patch.end_time.is_none());
    }

    #[test]
    fn end_before_start_is_rejected_after_merge() {
        let entry = stopped_entry();
        let payload = UpdateTimeEntryPayload {
            end_time: Some(Some(entry.start_time - Duration::minutes(1))),
            ..Default::default()
        };
        assert!(matches!(
            apply_patch(&entry, &payload),
            Err(Error::Validation(_))
        ));

        // Moving the start past the kept end fails the same way.
        let payload = UpdateTimeEntryPayload {
            start_time: Some(entry.end_time.unwrap() + Duration::minutes(1)),
            ..Default::default()
        };
        assert!(matches!(
            apply_patch(&entry, &payload),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn project_can_be_cleared_with_explicit_null() {
        let entry = stopped_entry();
        let payload = UpdateTimeEntryPayload {
            project_id: Some(None),
            ..Default::default()
        };
        let patch = apply_patch(&entry, &payload).unwrap();
        assert!(patch.project_id.is_none());
    }

    #[test]
    fn reopening_an_already_running_entry_is_not_a_reopen() {
        let entry = running_entry();
        let payload = UpdateTimeEntryPayload::default();
        let patch = apply_patch(&entry, &payload).unwrap();
        assert!(patch.is_running);
        assert!(!patch.reopens);
    }
}
