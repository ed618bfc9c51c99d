use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::double_option;
use crate::models::time_entry::TimeEntry;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartTimeEntryPayload {
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopTimeEntryPayload {
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTimeEntryPayload {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub project_id: Option<Uuid>,
}

/// Patch payload: omitted fields stay untouched. `end_time` and
/// `project_id` can also be cleared with an explicit `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTimeEntryPayload {
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_time: Option<Option<DateTime<Utc>>>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub project_id: Option<Option<Uuid>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntryListQuery {
    pub project_id: Option<Uuid>,
    pub running: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntryResponse {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub is_running: bool,
    pub user_id: Uuid,
    pub project_id: Option<Uuid>,
    pub duration_seconds: Option<i64>,
    pub duration_in_hours: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TimeEntry> for TimeEntryResponse {
    fn from(entry: TimeEntry) -> Self {
        let duration_seconds = entry.duration().map(|d| d.num_seconds());
        let duration_in_hours = entry.duration_hours();
        Self {
            id: entry.id,
            start_time: entry.start_time,
            end_time: entry.end_time,
            description: entry.description,
            is_running: entry.is_running,
            user_id: entry.user_id,
            project_id: entry.project_id,
            duration_seconds,
            duration_in_hours,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntryListResponse {
    pub items: Vec<TimeEntryResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_payload_distinguishes_omitted_from_null() {
        let patch: UpdateTimeEntryPayload =
            serde_json::from_str(r#"{"description":"standup"}"#).unwrap();
        assert_eq!(patch.description.as_deref(), Some("standup"));
        assert!(patch.start_time.is_none());
        assert!(patch.end_time.is_none());
        assert!(patch.project_id.is_none());

        let patch: UpdateTimeEntryPayload =
            serde_json::from_str(r#"{"end_time":null,"project_id":null}"#).unwrap();
        assert_eq!(patch.end_time, Some(None));
        assert_eq!(patch.project_id, Some(None));

        let patch: UpdateTimeEntryPayload =
            serde_json::from_str(r#"{"end_time":"2025-03-01T10:30:00Z"}"#).unwrap();
        assert!(matches!(patch.end_time, Some(Some(_))));
    }
}
